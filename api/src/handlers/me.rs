use authz::{Args, FieldKey};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use database::UserUpdate;
use serde_json::Value;
use tracing::info;

use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult},
    handlers::user_node,
    middleware_hooks::PermissionMiddleware,
    models::{UpdateMeRequest, UserNode},
    AppState,
};

fn actor_id(ctx: &RequestContext) -> ApiResult<&str> {
    ctx.actor
        .id()
        .ok_or_else(|| ApiError::Unauthenticated("Not signed in".to_string()))
}

/// The signed-in user
///
/// GET /api/v1/me
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "The current user", body = UserNode),
        (status = 403, description = "Guests have no profile", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::query("me"), &Args::new(), None, || async {
        let user = state.db.users().get(actor_id(&ctx)?).await?;
        Ok(Json(user_node(&mw, user).await?))
    })
    .await
}

/// Update the signed-in user's name or email
///
/// POST /api/v1/me
#[utoipa::path(
    post,
    path = "/api/v1/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated user", body = UserNode),
        (status = 400, description = "Invalid name or email", body = ApiErrorResponse),
        (status = 403, description = "Guests have no profile", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    ctx: RequestContext,
    request: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(UpdateMeRequest { name, email }) = request?;
    let mut args = Args::new();
    if let Some(name) = &name {
        args.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(email) = &email {
        args.insert("email".to_string(), Value::String(email.clone()));
    }

    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::mutation("updateMe"), &args, None, || async {
        let id = actor_id(&ctx)?;
        info!("Updating profile of user {}", id);
        let user = state
            .db
            .users()
            .update(id, UserUpdate { name, email })
            .await?;
        Ok(Json(user_node(&mw, user).await?))
    })
    .await
}
