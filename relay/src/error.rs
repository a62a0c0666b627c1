//! Error types for node ids, pagination arguments and cursors.
//!
//! Every error in this module is caused by client input and is reported to
//! the client as `BAD_USER_INPUT`, so messages are written for API users.

use crate::node_id::EntityType;
use thiserror::Error;

/// A node id that could not be turned into an `(EntityType, raw id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    /// The value is not of the form `<Type>:<rawId>` with a known type tag.
    #[error("Malformed node id: {value:?}")]
    Malformed { value: String },

    /// The value is well formed but tags a different entity type.
    #[error("Expected a {expected} id but got a {found} id")]
    WrongType {
        expected: EntityType,
        found: EntityType,
    },
}

/// An opaque pagination cursor that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid cursor: {reason}")]
pub struct CursorError {
    pub reason: String,
}

impl CursorError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Relay connection arguments that violate the pagination rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("You must provide either `first` or `last` to paginate")]
    BothAbsent,

    #[error("Passing both `first` and `last` to paginate is not supported")]
    BothPresent,

    #[error("`before` cannot be combined with `first`")]
    FirstWithBefore,

    #[error("`after` cannot be combined with `last`")]
    LastWithAfter,

    #[error("`first` must not be negative")]
    NegativeFirst,

    #[error("`last` must not be negative")]
    NegativeLast,

    #[error("`first` must not exceed {max}")]
    FirstExceedsMax { max: u32 },

    #[error("`last` must not exceed {max}")]
    LastExceedsMax { max: u32 },

    #[error("{0}")]
    InvalidCursor(#[from] CursorError),
}
