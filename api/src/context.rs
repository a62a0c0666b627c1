//! Per-request authentication context.

use authz::{Actor, RuleEvaluationCache};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{error::ApiError, AppState};

/// Who is calling, plus the rule cache for this request only.
///
/// A request without an `Authorization` header is a guest. A header that is
/// present but not a known bearer token is rejected outright instead of
/// falling back to guest.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    pub cache: Arc<RuleEvaluationCache>,
}

impl RequestContext {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            cache: Arc::new(RuleEvaluationCache::new()),
        }
    }

    pub fn guest() -> Self {
        Self::new(Actor::guest())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self::guest());
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthenticated("Expected a bearer token".to_string())
            })?;

        match state.db.tokens().find_user(token).await? {
            Some(user) => {
                let actor = user.actor();
                debug!("Authenticated request as {}", actor);
                Ok(Self::new(actor))
            }
            None => {
                warn!("Rejected unknown bearer token");
                Err(ApiError::Unauthenticated(
                    "Invalid or expired token".to_string(),
                ))
            }
        }
    }
}
