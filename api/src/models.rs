use chrono::{DateTime, Utc};
use relay::{encode, EntityType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A todo as returned to clients. Ids are node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodoNode {
    /// `Todo:<id>`
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// `User:<id>` of the owner
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<database::Todo> for TodoNode {
    fn from(todo: database::Todo) -> Self {
        Self {
            id: encode(EntityType::Todo, &todo.id),
            title: todo.title,
            completed: todo.completed,
            owner_id: encode(EntityType::User, &todo.owner_id),
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

/// A user as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserNode {
    /// `User:<id>`
    pub id: String,
    pub name: String,
    /// Only visible to the user themself and to admins; `null` otherwise.
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserNode {
    pub fn new(user: database::User, email: Option<String>) -> Self {
        Self {
            id: encode(EntityType::User, &user.id),
            name: user.name,
            email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Result of a node lookup, tagged with the concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum Node {
    Todo(TodoNode),
    User(UserNode),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    pub title: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    /// Node id of the deleted entity
    pub id: String,
}
