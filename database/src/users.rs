use crate::models::{NewUser, User, UserUpdate};
use crate::page::fetch_page;
use crate::{generate_id, Database, DatabaseError, Result};
use chrono::Utc;
use relay::{Page, PaginationArgs};
use tracing::{debug, info};

const SELECT_USERS: &str = "SELECT id, name, email, role, created_at, updated_at FROM users";

/// User storage operations
pub struct UserStorage<'a> {
    db: &'a Database,
}

impl<'a> UserStorage<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        validate_name(&new_user.name)?;
        validate_email(&new_user.email)?;

        let now = Utc::now();
        let user = User {
            id: generate_id(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, name, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db.pool())
        .await?;

        info!("Created user with id: {}", user.id);
        Ok(user)
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("{SELECT_USERS} WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn update(&self, id: &str, update: UserUpdate) -> Result<User> {
        let mut user = self.get(id).await?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            user.name = name;
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            user.email = email;
        }
        user.updated_at = Utc::now();

        sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.updated_at)
            .bind(&user.id)
            .execute(self.db.pool())
            .await?;

        info!("Updated user with id: {}", id);
        Ok(user)
    }

    /// Deletes a user together with their todos and tokens.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }

        info!("Deleted user with id: {}", id);
        Ok(())
    }

    pub async fn list(&self, args: &PaginationArgs<String>) -> Result<Page<User>> {
        debug!("Listing users: {:?}", args);
        fetch_page(self.db.pool(), SELECT_USERS, None, args).await
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DatabaseError::Validation("name must not be empty".into()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DatabaseError::Validation(format!(
            "invalid email address: {email}"
        ))),
    }
}
