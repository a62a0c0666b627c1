//! Entity lookups for ownership rules.

use crate::{Database, DatabaseError};
use async_trait::async_trait;
use authz::{EntityFetcher, FetchError, FetchedEntity};
use relay::EntityType;

impl From<DatabaseError> for FetchError {
    fn from(err: DatabaseError) -> Self {
        FetchError::Storage(err.to_string())
    }
}

#[async_trait]
impl EntityFetcher for Database {
    async fn fetch_by_id(
        &self,
        entity_type: EntityType,
        raw_id: &str,
    ) -> Result<FetchedEntity, FetchError> {
        let owner_id = match entity_type {
            EntityType::Todo => self.todos().find(raw_id).await?.map(|todo| todo.owner_id),
            EntityType::User => self.users().find(raw_id).await?.map(|user| user.id),
        };

        owner_id
            .map(|owner_id| FetchedEntity {
                entity_type,
                raw_id: raw_id.to_string(),
                owner_id,
            })
            .ok_or_else(|| FetchError::NotFound {
                entity_type,
                raw_id: raw_id.to_string(),
            })
    }
}
