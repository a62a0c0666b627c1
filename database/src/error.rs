use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// `detail` is the storage engine's own text and stays server side.
    #[error("Constraint violation ({kind}): {detail}")]
    Constraint { kind: ConstraintKind, detail: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Which kind of table constraint a write broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::Unique => write!(f, "unique"),
            ConstraintKind::ForeignKey => write!(f, "foreign key"),
        }
    }
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let kind = if db_err.is_unique_violation() {
                Some(ConstraintKind::Unique)
            } else if db_err.is_foreign_key_violation() {
                Some(ConstraintKind::ForeignKey)
            } else {
                None
            };
            if let Some(kind) = kind {
                return DatabaseError::Constraint {
                    kind,
                    detail: db_err.message().to_string(),
                };
            }
        }
        DatabaseError::Connection(err)
    }
}
