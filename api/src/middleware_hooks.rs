use authz::{Args, EntityFetcher, FieldKey, RuleContext};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info};

use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult},
    AppState,
};

/// Stamped on every response (`X-Todo-Api-Version`).
pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-todo-api-version");

/// Runs a field resolver only when the field's permission rule allows it.
///
/// # Authorization Flow
///
/// 1. Build a rule context from the request's actor and cache, the field
///    arguments and the parent object
/// 2. Evaluate the field's rule through the `AuthzEngine`
/// 3. On `Allow` run the resolver; otherwise return the mapped error
///
/// Every error the resolver returns is already an [`ApiError`], so nothing
/// below this boundary reaches the client unmapped.
pub struct PermissionMiddleware<'a> {
    state: &'a AppState,
    ctx: &'a RequestContext,
}

impl<'a> PermissionMiddleware<'a> {
    pub fn new(state: &'a AppState, ctx: &'a RequestContext) -> Self {
        Self { state, ctx }
    }

    pub async fn authorize(
        &self,
        field: &FieldKey,
        args: &Args,
        parent: Option<&Value>,
    ) -> ApiResult<()> {
        let fetcher: &dyn EntityFetcher = self.state.db.as_ref();
        let rule_ctx = RuleContext::new(&self.ctx.actor, args, parent, &self.ctx.cache, fetcher);
        self.state
            .authz
            .authorize(field, &rule_ctx)
            .await
            .map_err(ApiError::from)
    }

    pub async fn resolve<T, F, Fut>(
        &self,
        field: &FieldKey,
        args: &Args,
        parent: Option<&Value>,
        resolver: F,
    ) -> ApiResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.authorize(field, args, parent).await?;
        resolver().await
    }

    /// Like [`resolve`](Self::resolve) for nullable nested fields: a denial
    /// resolves to `None` instead of failing the whole response.
    pub async fn resolve_nullable<T, F, Fut>(
        &self,
        field: &FieldKey,
        args: &Args,
        parent: Option<&Value>,
        resolver: F,
    ) -> ApiResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        match self.authorize(field, args, parent).await {
            Ok(()) => resolver().await.map(Some),
            Err(ApiError::Forbidden) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Request processing middleware hook
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!("REQUEST MIDDLEWARE: Processing incoming {} request to {}", method, uri);

    let response = next.run(request).await;

    info!(
        "{} {} -> {} in {:?}",
        method,
        uri,
        response.status(),
        start.elapsed()
    );
    response
}

/// Response processing middleware hook
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        API_VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}
