use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

pub mod error;
pub mod fetcher;
pub mod init;
pub mod models;
mod page;
pub mod todos;
pub mod tokens;
pub mod users;

pub use error::{ConstraintKind, DatabaseError, Result};
pub use models::{NewTodo, NewUser, Todo, TodoUpdate, User, UserUpdate};
pub use todos::TodoStorage;
pub use tokens::TokenStorage;
pub use users::UserStorage;

// Re-export initialization functions for convenience
pub use init::{initialize_database, DatabaseConfig};

/// Database connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Opens (creating if needed) the SQLite database at `database_path`.
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {}", database_path.display());

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn users(&self) -> UserStorage<'_> {
        UserStorage::new(self)
    }

    pub fn todos(&self) -> TodoStorage<'_> {
        TodoStorage::new(self)
    }

    pub fn tokens(&self) -> TokenStorage<'_> {
        TokenStorage::new(self)
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }
}

/// Generates a new sortable row id.
pub(crate) fn generate_id() -> String {
    ulid::Ulid::new().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("nested").join("test.db"))
            .await
            .unwrap();
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_table_exists() {
        let (_dir, db) = test_support::test_db().await;

        assert!(db.table_exists("users").await.unwrap());
        assert!(db.table_exists("todos").await.unwrap());
        assert!(!db.table_exists("non_existent_table").await.unwrap());
    }

    #[test]
    fn test_generated_ids_sort_by_creation() {
        let first = generate_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_id();
        assert!(first < second);
        assert!(!first.contains(relay::NODE_ID_SEPARATOR));
    }
}
