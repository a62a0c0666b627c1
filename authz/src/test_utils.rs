//! Test doubles shared by the rule and engine tests.

use crate::cache::CachePolicy;
use crate::fetch::{EntityFetcher, FetchError, FetchedEntity};
use crate::rule::{CustomRule, RuleContext};
use crate::types::{Args, Verdict};
use async_trait::async_trait;
use relay::EntityType;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory fetcher that counts every lookup.
#[derive(Default)]
pub struct MockFetcher {
    entities: HashMap<(EntityType, String), FetchedEntity>,
    failing: bool,
    fetches: CallCounter,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todo(mut self, raw_id: &str, owner_id: &str) -> Self {
        self.entities.insert(
            (EntityType::Todo, raw_id.to_string()),
            FetchedEntity {
                entity_type: EntityType::Todo,
                raw_id: raw_id.to_string(),
                owner_id: owner_id.to_string(),
            },
        );
        self
    }

    pub fn with_user(mut self, raw_id: &str) -> Self {
        self.entities.insert(
            (EntityType::User, raw_id.to_string()),
            FetchedEntity {
                entity_type: EntityType::User,
                raw_id: raw_id.to_string(),
                owner_id: raw_id.to_string(),
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

#[async_trait]
impl EntityFetcher for MockFetcher {
    async fn fetch_by_id(
        &self,
        entity_type: EntityType,
        raw_id: &str,
    ) -> Result<FetchedEntity, FetchError> {
        self.fetches.bump();
        if self.failing {
            return Err(FetchError::Storage("connection refused".to_string()));
        }
        self.entities
            .get(&(entity_type, raw_id.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                entity_type,
                raw_id: raw_id.to_string(),
            })
    }
}

/// A custom rule that records how often it runs.
#[derive(Clone)]
pub struct SpyRule {
    name: String,
    verdict: Verdict,
    policy: CachePolicy,
    delay: Option<Duration>,
    fetches: Option<EntityType>,
    calls: CallCounter,
}

impl SpyRule {
    pub fn new(name: &str, verdict: Verdict) -> Self {
        Self {
            name: name.to_string(),
            verdict,
            policy: CachePolicy::NoCache,
            delay: None,
            fetches: None,
            calls: CallCounter::default(),
        }
    }

    /// A rule that loads the entity named by the `id` argument and allows
    /// if it exists.
    pub fn fetching(name: &str, entity_type: EntityType) -> Self {
        Self {
            fetches: Some(entity_type),
            ..Self::new(name, Verdict::Allow)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl CustomRule for SpyRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_policy(&self) -> CachePolicy {
        self.policy
    }

    async fn check(&self, ctx: &RuleContext<'_>) -> Verdict {
        self.calls.bump();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(entity_type) = self.fetches {
            let Some(raw_id) = ctx
                .arg_str("id")
                .and_then(|id| relay::decode_as(entity_type, id).ok())
            else {
                return Verdict::Deny;
            };
            return Verdict::from_bool(ctx.fetch(entity_type, &raw_id).await.is_ok());
        }
        self.verdict.clone()
    }
}
