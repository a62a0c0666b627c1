use crate::{Database, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL CHECK (role IN ('ADMIN', 'USER', 'GUEST')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_TODOS: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY NOT NULL,
        owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_TODOS_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_owner_id ON todos(owner_id, id)";

const CREATE_ACCESS_TOKENS: &str = r#"
    CREATE TABLE IF NOT EXISTS access_tokens (
        token TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    )
"#;

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new_with_path(PathBuf::from("data").join("todo.db"))
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            create_tables: true,
        }
    }

    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = path;
        self
    }

    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Initialize the database with the given configuration
pub async fn initialize_database(config: DatabaseConfig) -> Result<Arc<Database>> {
    info!(
        "Initializing database at: {}",
        config.database_path.display()
    );

    let db = Arc::new(Database::new(&config.database_path).await?);

    if config.create_tables {
        create_tables(&db).await?;
    }

    Ok(db)
}

/// Creates the `users`, `todos` and `access_tokens` tables if missing.
pub async fn create_tables(db: &Database) -> Result<()> {
    for statement in [
        CREATE_USERS,
        CREATE_TODOS,
        CREATE_TODOS_OWNER_INDEX,
        CREATE_ACCESS_TOKENS,
    ] {
        sqlx::query(statement).execute(db.pool()).await?;
    }
    info!("Database tables ready");
    Ok(())
}
