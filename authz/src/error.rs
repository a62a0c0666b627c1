//! Error types for the authorization system.
//!
//! # Security Note
//! A denial never says why it happened. Wrong role, not the owner, and "no
//! such entity" all become [`AuthzError::Forbidden`] with the same message,
//! so probing for ids cannot reveal which ones exist. Details of internal
//! failures are logged, never returned.

use relay::NodeIdError;
use thiserror::Error;

/// A failure while evaluating a single rule.
///
/// Unlike a denial this means the rule could not reach a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// An id argument the rule needed was not a valid node id.
    #[error(transparent)]
    InvalidId(#[from] NodeIdError),

    /// The entity lookup failed for a reason other than "not found".
    #[error("Entity lookup failed: {0}")]
    Storage(String),
}

/// The result of authorizing a field, ready to be mapped to a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// The rule denied access.
    #[error("Forbidden")]
    Forbidden,

    /// The rule rejected a malformed argument.
    #[error(transparent)]
    InvalidInput(NodeIdError),

    /// The rule could not be evaluated.
    #[error("Internal authorization error: {0}")]
    Internal(String),
}

impl From<RuleError> for AuthzError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::InvalidId(err) => AuthzError::InvalidInput(err),
            RuleError::Storage(message) => AuthzError::Internal(message),
        }
    }
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
