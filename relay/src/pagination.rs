//! Relay connection argument parsing.
//!
//! A list field accepts `first`/`after` (forward) or `last`/`before`
//! (backward). [`parse`] validates the raw arguments and produces a
//! [`PaginationArgs`] that only carries the fields of one direction, so
//! storage queries never see an impossible combination.

use crate::error::{CursorError, PaginationError};
use serde::{Deserialize, Serialize};

/// Raw connection arguments as supplied by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionArgs {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub last: Option<i64>,
    pub before: Option<String>,
}

impl ConnectionArgs {
    pub fn forward(first: i64, after: Option<&str>) -> Self {
        Self {
            first: Some(first),
            after: after.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn backward(last: i64, before: Option<&str>) -> Self {
        Self {
            last: Some(last),
            before: before.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Per-field upper bounds for `first` and `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLimits {
    pub first_max: u32,
    pub last_max: u32,
}

impl PaginationLimits {
    pub const fn new(first_max: u32, last_max: u32) -> Self {
        Self {
            first_max,
            last_max,
        }
    }
}

/// Validated pagination arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationArgs<C> {
    Forward { first: u32, after: Option<C> },
    Backward { last: u32, before: Option<C> },
}

impl<C> PaginationArgs<C> {
    /// Number of items requested.
    pub fn limit(&self) -> u32 {
        match self {
            PaginationArgs::Forward { first, .. } => *first,
            PaginationArgs::Backward { last, .. } => *last,
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, PaginationArgs::Forward { .. })
    }

    /// The `after` or `before` cursor, whichever applies.
    pub fn cursor(&self) -> Option<&C> {
        match self {
            PaginationArgs::Forward { after, .. } => after.as_ref(),
            PaginationArgs::Backward { before, .. } => before.as_ref(),
        }
    }
}

/// Validates connection arguments against `limits`, decoding any cursor with
/// `decode_cursor`.
///
/// Checks run in a fixed order and the first failure is returned:
/// presence of `first`/`last`, then the forward or backward constraints,
/// then cursor decoding.
pub fn parse<C, F>(
    args: &ConnectionArgs,
    limits: PaginationLimits,
    decode_cursor: F,
) -> Result<PaginationArgs<C>, PaginationError>
where
    F: Fn(&str) -> Result<C, CursorError>,
{
    match (args.first, args.last) {
        (None, None) => Err(PaginationError::BothAbsent),
        (Some(_), Some(_)) => Err(PaginationError::BothPresent),
        (Some(first), None) => {
            if args.before.is_some() {
                return Err(PaginationError::FirstWithBefore);
            }
            let first = bounded(first, limits.first_max).map_err(|bound| match bound {
                Bound::Negative => PaginationError::NegativeFirst,
                Bound::TooLarge => PaginationError::FirstExceedsMax {
                    max: limits.first_max,
                },
            })?;
            let after = args.after.as_deref().map(&decode_cursor).transpose()?;
            Ok(PaginationArgs::Forward { first, after })
        }
        (None, Some(last)) => {
            if args.after.is_some() {
                return Err(PaginationError::LastWithAfter);
            }
            let last = bounded(last, limits.last_max).map_err(|bound| match bound {
                Bound::Negative => PaginationError::NegativeLast,
                Bound::TooLarge => PaginationError::LastExceedsMax {
                    max: limits.last_max,
                },
            })?;
            let before = args.before.as_deref().map(&decode_cursor).transpose()?;
            Ok(PaginationArgs::Backward { last, before })
        }
    }
}

enum Bound {
    Negative,
    TooLarge,
}

fn bounded(count: i64, max: u32) -> Result<u32, Bound> {
    if count < 0 {
        return Err(Bound::Negative);
    }
    if count > i64::from(max) {
        return Err(Bound::TooLarge);
    }
    // in range 0..=max, which always fits
    u32::try_from(count).map_err(|_| Bound::TooLarge)
}
