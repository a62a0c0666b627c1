//! Permission rules and the interpreter that evaluates them.
//!
//! A [`Rule`] is a plain expression tree: constant verdicts, leaf
//! [`Predicate`]s, and the `And`/`Or`/`Race`/`Chain` combinators. Trees are
//! built once at startup and evaluated per field resolution against a
//! [`RuleContext`].
//!
//! # Combinator semantics
//!
//! | combinator | order | stops at | when nothing stops it |
//! |---|---|---|---|
//! | `And` | left to right | first `Deny` or `Error` | `Allow` |
//! | `Or` | left to right | first `Allow` | first `Error`, else `Deny` |
//! | `Race` | concurrent | first `Allow` to finish | first `Error`, else `Deny` |
//! | `Chain` | left to right | first `Deny` or `Error` | `Allow` |
//!
//! `Chain` is `And` plus a shared [`ChainScope`]: entities fetched by earlier
//! rules are handed to later rules instead of being loaded again. The
//! branches a `Race` leaves behind are dropped, which is safe because no rule
//! has side effects.

use crate::cache::{CacheKey, CachePolicy, RuleEvaluationCache};
use crate::error::RuleError;
use crate::fetch::{EntityFetcher, FetchError, FetchedEntity};
use crate::types::{Actor, Args, Role, Verdict};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use relay::EntityType;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Entities loaded during one `Chain`, keyed by type and raw id.
#[derive(Debug, Default)]
pub struct ChainScope {
    entities: Mutex<HashMap<(EntityType, String), FetchedEntity>>,
}

impl ChainScope {
    async fn get(&self, entity_type: EntityType, raw_id: &str) -> Option<FetchedEntity> {
        self.entities
            .lock()
            .await
            .get(&(entity_type, raw_id.to_string()))
            .cloned()
    }

    async fn insert(&self, entity: FetchedEntity) {
        self.entities
            .lock()
            .await
            .insert((entity.entity_type, entity.raw_id.clone()), entity);
    }
}

/// Everything a rule may look at while deciding.
pub struct RuleContext<'a> {
    pub actor: &'a Actor,
    pub args: &'a Args,
    /// The already-resolved parent object, for field-level rules.
    pub parent: Option<&'a Value>,
    pub cache: &'a RuleEvaluationCache,
    fetcher: &'a dyn EntityFetcher,
    scope: Option<&'a ChainScope>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        actor: &'a Actor,
        args: &'a Args,
        parent: Option<&'a Value>,
        cache: &'a RuleEvaluationCache,
        fetcher: &'a dyn EntityFetcher,
    ) -> Self {
        Self {
            actor,
            args,
            parent,
            cache,
            fetcher,
            scope: None,
        }
    }

    /// Loads an entity, reusing one already fetched by an earlier rule of the
    /// enclosing `Chain`.
    pub async fn fetch(
        &self,
        entity_type: EntityType,
        raw_id: &str,
    ) -> Result<FetchedEntity, FetchError> {
        if let Some(scope) = self.scope {
            if let Some(entity) = scope.get(entity_type, raw_id).await {
                debug!("Reusing {} {} from chain scope", entity_type, raw_id);
                return Ok(entity);
            }
        }

        let entity = self.fetcher.fetch_by_id(entity_type, raw_id).await?;

        if let Some(scope) = self.scope {
            scope.insert(entity.clone()).await;
        }
        Ok(entity)
    }

    /// The string argument `name`, if present.
    pub fn arg_str(&self, name: &str) -> Option<&'a str> {
        self.args.get(name).and_then(Value::as_str)
    }

    fn scoped<'b>(&'b self, scope: &'b ChainScope) -> RuleContext<'b> {
        RuleContext {
            actor: self.actor,
            args: self.args,
            parent: self.parent,
            cache: self.cache,
            fetcher: self.fetcher,
            scope: Some(scope),
        }
    }

    /// Serialised `(args, parent)`, the discriminator for strict cache entries.
    fn strict_scope(&self) -> String {
        serde_json::json!({ "args": self.args, "parent": self.parent }).to_string()
    }
}

/// An application-specific leaf rule.
///
/// `name` identifies the rule in the per-request cache, so two custom rules
/// with different behaviour must not share a name.
#[async_trait]
pub trait CustomRule: Send + Sync {
    fn name(&self) -> &str;

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::NoCache
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> Verdict;
}

/// A leaf rule.
#[derive(Clone)]
pub enum Predicate {
    /// Allow iff the actor is an admin.
    IsAdmin,
    /// Allow iff the actor is not a guest.
    IsAuthenticated,
    /// Allow iff the actor is a guest.
    IsGuest,
    /// Allow iff `args[arg]` is the actor's own `User` node id.
    IsOwnerOfArgId { arg: String },
    /// Allow iff `parent[field]` equals the actor's raw id.
    IsOwnerOfParentField { field: String },
    /// Allow iff the entity named by the node id in `args[arg]` is owned by
    /// the actor. With `entity_type: None` any known type is accepted.
    ///
    /// A missing entity is a `Deny`, never an error, so a probe for an id
    /// that does not exist looks exactly like a probe for someone else's.
    IsEntityOwner {
        arg: String,
        entity_type: Option<EntityType>,
    },
    Custom(Arc<dyn CustomRule>),
}

impl Predicate {
    /// Rule identity, used as the cache key and in logs.
    pub fn name(&self) -> String {
        match self {
            Predicate::IsAdmin => "isAdmin".to_string(),
            Predicate::IsAuthenticated => "isAuthenticated".to_string(),
            Predicate::IsGuest => "isGuest".to_string(),
            Predicate::IsOwnerOfArgId { arg } => format!("isOwnerOfArgId({arg})"),
            Predicate::IsOwnerOfParentField { field } => format!("isOwnerOfParentField({field})"),
            Predicate::IsEntityOwner {
                arg,
                entity_type: Some(entity_type),
            } => format!("isEntityOwner({arg}: {entity_type})"),
            Predicate::IsEntityOwner {
                arg,
                entity_type: None,
            } => format!("isEntityOwner({arg})"),
            Predicate::Custom(rule) => rule.name().to_string(),
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Predicate::IsAdmin | Predicate::IsAuthenticated | Predicate::IsGuest => {
                CachePolicy::Contextual
            }
            Predicate::IsOwnerOfArgId { .. }
            | Predicate::IsOwnerOfParentField { .. }
            | Predicate::IsEntityOwner { .. } => CachePolicy::Strict,
            Predicate::Custom(rule) => rule.cache_policy(),
        }
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> Verdict {
        let key = match self.cache_policy() {
            CachePolicy::Contextual => Some(CacheKey::contextual(self.name())),
            CachePolicy::Strict => Some(CacheKey::strict(self.name(), ctx.strict_scope())),
            CachePolicy::NoCache => None,
        };

        if let Some(key) = &key {
            if let Some(verdict) = ctx.cache.get(key).await {
                debug!("Rule {} answered from cache: {:?}", key.rule, verdict);
                return verdict;
            }
        }

        let verdict = self.check(ctx).await;
        debug!("Rule {} for {}: {:?}", self.name(), ctx.actor, verdict);

        if let Some(key) = key {
            ctx.cache.insert(key, verdict.clone()).await;
        }
        verdict
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> Verdict {
        match self {
            Predicate::IsAdmin => Verdict::from_bool(ctx.actor.role() == Role::Admin),
            Predicate::IsAuthenticated => Verdict::from_bool(!ctx.actor.is_guest()),
            Predicate::IsGuest => Verdict::from_bool(ctx.actor.is_guest()),
            Predicate::IsOwnerOfArgId { arg } => {
                let (Some(actor_id), Some(value)) = (ctx.actor.id(), ctx.arg_str(arg)) else {
                    return Verdict::Deny;
                };
                match relay::decode_as(EntityType::User, value) {
                    Ok(raw_id) => Verdict::from_bool(raw_id == actor_id),
                    Err(err) => Verdict::Error(RuleError::InvalidId(err)),
                }
            }
            Predicate::IsOwnerOfParentField { field } => {
                let owner = ctx
                    .parent
                    .and_then(|parent| parent.get(field.as_str()))
                    .and_then(Value::as_str);
                match (ctx.actor.id(), owner) {
                    (Some(actor_id), Some(owner)) => Verdict::from_bool(owner == actor_id),
                    _ => Verdict::Deny,
                }
            }
            Predicate::IsEntityOwner { arg, entity_type } => {
                let (Some(actor_id), Some(value)) = (ctx.actor.id(), ctx.arg_str(arg)) else {
                    return Verdict::Deny;
                };
                let decoded = match entity_type {
                    Some(expected) => relay::decode_as(*expected, value).map(|raw| (*expected, raw)),
                    None => relay::decode(value).map(|node_id| (node_id.entity_type, node_id.raw_id)),
                };
                let (entity_type, raw_id) = match decoded {
                    Ok(decoded) => decoded,
                    Err(err) => return Verdict::Error(RuleError::InvalidId(err)),
                };

                match ctx.fetch(entity_type, &raw_id).await {
                    Ok(entity) => Verdict::from_bool(entity.owner_id == actor_id),
                    Err(FetchError::NotFound { .. }) => {
                        debug!("{} {} not found, denying ownership", entity_type, raw_id);
                        Verdict::Deny
                    }
                    Err(FetchError::Storage(message)) => Verdict::Error(RuleError::Storage(message)),
                }
            }
            Predicate::Custom(rule) => rule.check(ctx).await,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A composed permission rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Allow,
    Deny,
    Leaf(Predicate),
    And(Vec<Rule>),
    Or(Vec<Rule>),
    Race(Vec<Rule>),
    Chain(Vec<Rule>),
}

impl Rule {
    pub fn and(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::And(rules.into_iter().collect())
    }

    pub fn or(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Or(rules.into_iter().collect())
    }

    pub fn race(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Race(rules.into_iter().collect())
    }

    pub fn chain(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Chain(rules.into_iter().collect())
    }

    pub fn custom(rule: impl CustomRule + 'static) -> Self {
        Rule::Leaf(Predicate::Custom(Arc::new(rule)))
    }

    /// Evaluates the rule tree.
    pub fn evaluate<'a>(&'a self, ctx: &'a RuleContext<'a>) -> BoxFuture<'a, Verdict> {
        match self {
            Rule::Allow => Box::pin(async { Verdict::Allow }),
            Rule::Deny => Box::pin(async { Verdict::Deny }),
            Rule::Leaf(predicate) => Box::pin(predicate.evaluate(ctx)),
            Rule::And(rules) => Box::pin(all_of(rules, ctx)),
            Rule::Or(rules) => Box::pin(async move {
                let mut first_error = None;
                for rule in rules {
                    match rule.evaluate(ctx).await {
                        Verdict::Allow => return Verdict::Allow,
                        Verdict::Deny => {}
                        Verdict::Error(err) => {
                            first_error.get_or_insert(err);
                        }
                    }
                }
                first_error.map_or(Verdict::Deny, Verdict::Error)
            }),
            Rule::Race(rules) => Box::pin(async move {
                let mut pending: FuturesUnordered<_> =
                    rules.iter().map(|rule| rule.evaluate(ctx)).collect();
                let mut first_error = None;
                while let Some(verdict) = pending.next().await {
                    match verdict {
                        Verdict::Allow => return Verdict::Allow,
                        Verdict::Deny => {}
                        Verdict::Error(err) => {
                            first_error.get_or_insert(err);
                        }
                    }
                }
                first_error.map_or(Verdict::Deny, Verdict::Error)
            }),
            Rule::Chain(rules) => Box::pin(async move {
                if ctx.scope.is_some() {
                    return all_of(rules, ctx).await;
                }
                let scope = ChainScope::default();
                let scoped = ctx.scoped(&scope);
                all_of(rules, &scoped).await
            }),
        }
    }
}

async fn all_of(rules: &[Rule], ctx: &RuleContext<'_>) -> Verdict {
    for rule in rules {
        match rule.evaluate(ctx).await {
            Verdict::Allow => {}
            other => return other,
        }
    }
    Verdict::Allow
}

pub fn is_admin() -> Rule {
    Rule::Leaf(Predicate::IsAdmin)
}

pub fn is_authenticated() -> Rule {
    Rule::Leaf(Predicate::IsAuthenticated)
}

pub fn is_guest() -> Rule {
    Rule::Leaf(Predicate::IsGuest)
}

pub fn is_owner_of_arg_id(arg: impl Into<String>) -> Rule {
    Rule::Leaf(Predicate::IsOwnerOfArgId { arg: arg.into() })
}

pub fn is_owner_of_parent_field(field: impl Into<String>) -> Rule {
    Rule::Leaf(Predicate::IsOwnerOfParentField {
        field: field.into(),
    })
}

pub fn is_entity_owner(arg: impl Into<String>, entity_type: EntityType) -> Rule {
    Rule::Leaf(Predicate::IsEntityOwner {
        arg: arg.into(),
        entity_type: Some(entity_type),
    })
}

/// Like [`is_entity_owner`] but accepts a node id of any entity type.
pub fn is_node_owner(arg: impl Into<String>) -> Rule {
    Rule::Leaf(Predicate::IsEntityOwner {
        arg: arg.into(),
        entity_type: None,
    })
}
