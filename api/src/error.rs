use authz::AuthzError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::{ConstraintKind, DatabaseError};
use relay::{NodeIdError, PaginationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// API Error types
///
/// Every failure a handler can produce ends up as one of these, so the
/// response body always carries one of five stable codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A permission rule denied the field. The message never varies.
    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    BadUserInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// The cause is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadUserInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::BadUserInput(_) => "BAD_USER_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            error!("Internal error: {}", cause);
        }

        let status = self.status_code();
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => ApiError::Forbidden,
            AuthzError::InvalidInput(err) => err.into(),
            AuthzError::Internal(cause) => ApiError::Internal(cause),
        }
    }
}

impl From<NodeIdError> for ApiError {
    fn from(err: NodeIdError) -> Self {
        ApiError::BadUserInput(err.to_string())
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::BadUserInput(err.to_string())
    }
}

/// Convert database errors to API errors
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => {
                ApiError::NotFound(format!("{entity} not found"))
            }
            DatabaseError::Constraint { kind, detail } => {
                warn!("Rejected write that broke a {} constraint: {}", kind, detail);
                ApiError::BadUserInput(constraint_message(kind).to_string())
            }
            DatabaseError::Validation(message) => ApiError::BadUserInput(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

fn constraint_message(kind: ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::Unique => "A record with this value already exists",
        ConstraintKind::ForeignKey => "A referenced record does not exist",
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadUserInput(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadUserInput(rejection.body_text())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use relay::EntityType;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::Forbidden, "FORBIDDEN", StatusCode::FORBIDDEN)]
    #[case(ApiError::BadUserInput("x".into()), "BAD_USER_INPUT", StatusCode::BAD_REQUEST)]
    #[case(ApiError::NotFound("x".into()), "NOT_FOUND", StatusCode::NOT_FOUND)]
    #[case(ApiError::Unauthenticated("x".into()), "UNAUTHENTICATED", StatusCode::UNAUTHORIZED)]
    #[case(
        ApiError::Internal("x".into()),
        "INTERNAL_SERVER_ERROR",
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_codes_and_statuses(
        #[case] err: ApiError,
        #[case] code: &str,
        #[case] status: StatusCode,
    ) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.status_code(), status);
    }

    #[test]
    fn test_internal_cause_is_not_exposed() {
        let err = ApiError::Internal("disk full at /var/lib/todo.db".into());
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_authz_conversion() {
        assert_eq!(ApiError::from(AuthzError::Forbidden), ApiError::Forbidden);

        let wrong_type = NodeIdError::WrongType {
            expected: EntityType::Todo,
            found: EntityType::User,
        };
        assert!(matches!(
            ApiError::from(AuthzError::InvalidInput(wrong_type)),
            ApiError::BadUserInput(_)
        ));
    }

    #[test]
    fn test_database_conversion() {
        assert_eq!(
            ApiError::from(DatabaseError::not_found("Todo", "01ABC")),
            ApiError::NotFound("Todo not found".into())
        );
        assert!(matches!(
            ApiError::from(DatabaseError::Other("boom".into())),
            ApiError::Internal(_)
        ));
    }

    #[rstest]
    #[case(ConstraintKind::Unique, "A record with this value already exists")]
    #[case(ConstraintKind::ForeignKey, "A referenced record does not exist")]
    fn test_constraint_detail_stays_server_side(
        #[case] kind: ConstraintKind,
        #[case] message: &str,
    ) {
        let err = ApiError::from(DatabaseError::Constraint {
            kind,
            detail: "UNIQUE constraint failed: users.email".into(),
        });
        assert_eq!(err, ApiError::BadUserInput(message.into()));
        assert!(!err.to_string().contains("users.email"));
    }

    #[test]
    fn test_pagination_conversion() {
        assert!(matches!(
            ApiError::from(PaginationError::BothAbsent),
            ApiError::BadUserInput(_)
        ));
    }
}
