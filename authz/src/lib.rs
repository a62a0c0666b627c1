//! Field-level authorization for the Todo API.
//!
//! Every resolvable field has a [`Rule`] in a [`RuleTree`]. Before a field is
//! resolved, the [`AuthzEngine`] evaluates that rule against a
//! [`RuleContext`] (the actor, the field arguments, the parent object, a
//! per-request [`RuleEvaluationCache`] and an [`EntityFetcher`] for ownership
//! lookups) and only an `Allow` lets the resolver run.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the API layer
//! 2. **Authentication** turns the bearer token into an [`Actor`]
//! 3. **Permission middleware** builds a [`RuleContext`] for the field
//! 4. **AuthzEngine** looks up the field's rule and evaluates it
//! 5. **Decision**: the resolver runs, or the request fails with `Forbidden`
//!
//! # Security Architecture
//!
//! - Fields without a rule are denied, and startup refuses a tree that
//!   misses any schema field (see [`AuthzEngine::check_coverage`]).
//! - A missing entity in an ownership check is a denial, indistinguishable
//!   from someone else's entity.
//! - Cached verdicts never outlive the request that produced them.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod policy;
pub mod rule;
pub mod tree;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use cache::{CacheKey, CachePolicy, CacheStats, RuleEvaluationCache};
pub use error::{AuthzError, Result, RuleError};
pub use fetch::{EntityFetcher, FetchError, FetchedEntity};
pub use rule::{CustomRule, Predicate, Rule, RuleContext};
pub use tree::{RuleTree, RuleTreeBuilder};
pub use types::{Actor, Args, FieldKey, Role, Verdict};

use std::sync::Arc;
use tracing::{error, info, warn};

/// Evaluates field rules. Cheap to clone; the rule tree is shared.
#[derive(Debug, Clone)]
pub struct AuthzEngine {
    tree: Arc<RuleTree>,
}

impl AuthzEngine {
    pub fn new(tree: RuleTree) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }

    /// The engine for the Todo API rule tree.
    pub fn todo() -> Self {
        Self::new(policy::todo_permissions())
    }

    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    /// Fails with the schema fields that have no explicit rule.
    pub fn check_coverage(&self, schema: &[FieldKey]) -> std::result::Result<(), Vec<FieldKey>> {
        let unlisted: Vec<FieldKey> = self.tree.unlisted(schema).into_iter().cloned().collect();
        if unlisted.is_empty() {
            Ok(())
        } else {
            Err(unlisted)
        }
    }

    /// Evaluates the rule for `field` without logging the decision.
    pub async fn verdict(&self, field: &FieldKey, ctx: &RuleContext<'_>) -> Verdict {
        self.tree.rule_for(field).evaluate(ctx).await
    }

    /// Authorizes the resolution of `field`.
    ///
    /// # Errors
    ///
    /// - [`AuthzError::Forbidden`] when the rule denies
    /// - [`AuthzError::InvalidInput`] when an id argument is malformed
    /// - [`AuthzError::Internal`] when the rule could not be evaluated
    pub async fn authorize(&self, field: &FieldKey, ctx: &RuleContext<'_>) -> Result<()> {
        match self.verdict(field, ctx).await {
            Verdict::Allow => {
                info!("Authorization ALLOWED: {} on {}", ctx.actor, field);
                Ok(())
            }
            Verdict::Deny => {
                warn!("Authorization DENIED: {} on {}", ctx.actor, field);
                Err(AuthzError::Forbidden)
            }
            Verdict::Error(RuleError::InvalidId(err)) => {
                warn!("Authorization rejected input: {} on {}: {}", ctx.actor, field, err);
                Err(AuthzError::InvalidInput(err))
            }
            Verdict::Error(err) => {
                error!("Authorization failed: {} on {}: {}", ctx.actor, field, err);
                Err(err.into())
            }
        }
    }
}

impl Default for AuthzEngine {
    fn default() -> Self {
        Self::todo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{args, MockFetcher};
    use relay::NodeIdError;
    use serde_json::json;

    #[tokio::test]
    async fn test_authorize_maps_verdicts() {
        let engine = AuthzEngine::todo();
        let fetcher = MockFetcher::new().with_todo("t1", "u1");
        let cache = RuleEvaluationCache::new();
        let owner = Actor::user("u1");
        let stranger = Actor::user("u2");
        let todo_args = args(json!({ "id": "Todo:t1" }));
        let field = FieldKey::query("todo");

        let ctx = RuleContext::new(&owner, &todo_args, None, &cache, &fetcher);
        assert_eq!(engine.authorize(&field, &ctx).await, Ok(()));

        let ctx = RuleContext::new(&stranger, &todo_args, None, &cache, &fetcher);
        assert_eq!(engine.authorize(&field, &ctx).await, Err(AuthzError::Forbidden));
    }

    #[tokio::test]
    async fn test_authorize_reports_malformed_ids_as_input_errors() {
        let engine = AuthzEngine::todo();
        let fetcher = MockFetcher::new();
        let cache = RuleEvaluationCache::new();
        let actor = Actor::user("u1");
        let bad = args(json!({ "id": "not-a-node-id" }));

        let ctx = RuleContext::new(&actor, &bad, None, &cache, &fetcher);
        assert_eq!(
            engine.authorize(&FieldKey::mutation("deleteTodo"), &ctx).await,
            Err(AuthzError::InvalidInput(NodeIdError::Malformed {
                value: "not-a-node-id".to_string()
            }))
        );
    }

    #[tokio::test]
    async fn test_authorize_reports_storage_failures_as_internal() {
        let engine = AuthzEngine::todo();
        let fetcher = MockFetcher::new().failing();
        let cache = RuleEvaluationCache::new();
        let actor = Actor::user("u1");
        let todo_args = args(json!({ "id": "Todo:t1" }));

        let ctx = RuleContext::new(&actor, &todo_args, None, &cache, &fetcher);
        assert!(matches!(
            engine.authorize(&FieldKey::query("todo"), &ctx).await,
            Err(AuthzError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_is_shared_across_fields_of_one_request() {
        let engine = AuthzEngine::todo();
        let fetcher = MockFetcher::new();
        let cache = RuleEvaluationCache::new();
        let actor = Actor::admin("a1");
        let none = Args::new();

        for field in ["users", "me", "todos", "users"] {
            let ctx = RuleContext::new(&actor, &none, None, &cache, &fetcher);
            assert_eq!(engine.authorize(&FieldKey::query(field), &ctx).await, Ok(()));
        }
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_check_coverage() {
        let engine = AuthzEngine::todo();
        assert_eq!(engine.check_coverage(&policy::schema_fields()), Ok(()));

        let extra = [FieldKey::query("auditLog")];
        assert_eq!(engine.check_coverage(&extra), Err(vec![FieldKey::query("auditLog")]));
    }
}
