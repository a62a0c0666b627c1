//! Bearer tokens that identify API callers.
//!
//! Tokens are opaque strings mapped to a user. Issuing them is left to
//! seeding and administration; the API only looks them up.

use crate::models::User;
use crate::{Database, Result};
use chrono::Utc;
use tracing::debug;

pub struct TokenStorage<'a> {
    db: &'a Database,
}

impl<'a> TokenStorage<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, token: &str, user_id: &str) -> Result<()> {
        sqlx::query("INSERT INTO access_tokens (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(self.db.pool())
            .await?;
        debug!("Stored access token for user {}", user_id);
        Ok(())
    }

    /// The user a token belongs to, if the token is known.
    pub async fn find_user(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.created_at, u.updated_at
            FROM access_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(user)
    }

    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE token = ?")
            .bind(token)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
