//! Entity lookups needed by ownership rules.

use async_trait::async_trait;
use relay::EntityType;
use thiserror::Error;

/// The parts of an entity that ownership rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedEntity {
    pub entity_type: EntityType,
    pub raw_id: String,
    /// The raw id of the owning user. A user owns itself.
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{entity_type} {raw_id} not found")]
    NotFound {
        entity_type: EntityType,
        raw_id: String,
    },

    #[error("{0}")]
    Storage(String),
}

/// Loads entities by raw id for ownership checks.
///
/// Implementations must report a missing entity as [`FetchError::NotFound`]
/// and keep every other failure in [`FetchError::Storage`].
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch_by_id(
        &self,
        entity_type: EntityType,
        raw_id: &str,
    ) -> Result<FetchedEntity, FetchError>;
}
