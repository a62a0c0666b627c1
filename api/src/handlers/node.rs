use authz::FieldKey;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use relay::{decode, EntityType};

use crate::{
    context::RequestContext,
    error::ApiResult,
    handlers::{id_args, user_node},
    middleware_hooks::PermissionMiddleware,
    models::{Node, TodoNode},
    AppState,
};

/// Fetch any entity by its node id
///
/// GET /api/v1/node/{id}
#[utoipa::path(
    get,
    path = "/api/v1/node/{id}",
    params(("id" = String, Path, description = "Node id, `Todo:<id>` or `User:<id>`")),
    responses(
        (status = 200, description = "The entity, tagged with `__typename`"),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such entity", body = ApiErrorResponse)
    ),
    tag = "nodes"
)]
pub async fn get_node(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::query("node"), &id_args(&id), None, || async {
        let node_id = decode(&id)?;
        let node = match node_id.entity_type {
            EntityType::Todo => {
                Node::Todo(TodoNode::from(state.db.todos().get(&node_id.raw_id).await?))
            }
            EntityType::User => {
                let user = state.db.users().get(&node_id.raw_id).await?;
                Node::User(user_node(&mw, user).await?)
            }
        };
        Ok(Json(node))
    })
    .await
}
