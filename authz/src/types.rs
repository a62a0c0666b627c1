//! Core authorization types: who is asking, what they are asking for, and
//! the outcome of a rule.

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw field arguments as supplied by the client.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// The role of a requesting principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "GUEST" => Ok(Role::Guest),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The principal making a request.
///
/// Built once per request from the bearer token lookup and never changed
/// afterwards. A guest never carries an id and every other role always
/// does, which the constructors guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    id: Option<String>,
    role: Role,
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::Admin,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            role: Role::User,
        }
    }

    pub fn guest() -> Self {
        Self {
            id: None,
            role: Role::Guest,
        }
    }

    /// Builds an actor for a stored user with the given role.
    ///
    /// A stored `GUEST` role still yields a guest with no id.
    pub fn with_role(id: impl Into<String>, role: Role) -> Self {
        match role {
            Role::Admin => Self::admin(id),
            Role::User => Self::user(id),
            Role::Guest => Self::guest(),
        }
    }

    /// The raw user id, absent for guests.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}({})", self.role, id),
            None => write!(f, "{}", self.role),
        }
    }
}

/// Identifies a schema field, e.g. `Query.todos` or `User.email`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub type_name: String,
    pub field_name: String,
}

impl FieldKey {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn query(field_name: impl Into<String>) -> Self {
        Self::new("Query", field_name)
    }

    pub fn mutation(field_name: impl Into<String>) -> Self {
        Self::new("Mutation", field_name)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// The outcome of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
    Error(RuleError),
}

impl Verdict {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}
