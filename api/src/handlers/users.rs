use authz::FieldKey;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use relay::{decode_as, encode, Connection, ConnectionArgs, EntityType, KeyCursor, Page};

use crate::{
    config::ListField,
    context::RequestContext,
    error::ApiResult,
    handlers::{
        connection_field_args, id_args, parse_pagination, todos::todo_connection, user_node,
        user_parent,
    },
    middleware_hooks::PermissionMiddleware,
    models::{DeleteResponse, UserNode},
    AppState,
};

/// List all users
///
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("first" = Option<i64>, Query, description = "Page size when paging forward"),
        ("after" = Option<String>, Query, description = "Cursor to page forward from"),
        ("last" = Option<i64>, Query, description = "Page size when paging backward"),
        ("before" = Option<String>, Query, description = "Cursor to page backward from")
    ),
    responses(
        (status = 200, description = "A connection of users"),
        (status = 400, description = "Invalid pagination arguments", body = ApiErrorResponse),
        (status = 403, description = "Admins only", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    args: Result<Query<ConnectionArgs>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(args) = args?;
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(
        &FieldKey::query("users"),
        &connection_field_args(&args),
        None,
        || async {
            let pagination = parse_pagination(&args, state.config.limits(ListField::Users))?;
            let users = state.db.users();
            let page = users.list(&pagination).await?;
            let total = users.count().await?;

            // Email visibility is decided per user, so nodes are built one by one.
            let mut items: Vec<(String, UserNode)> = Vec::with_capacity(page.items.len());
            for user in page.items {
                let cursor = KeyCursor::encode(&user.id);
                items.push((cursor, user_node(&mw, user).await?));
            }
            let page = Page {
                items,
                has_next_page: page.has_next_page,
                has_previous_page: page.has_previous_page,
            };

            let connection = Connection::from_page(page, total, |(cursor, _)| cursor.clone())
                .map(|(_, node)| node);
            Ok(Json(connection))
        },
    )
    .await
}

/// Read a user
///
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Node id of the user, `User:<id>`")),
    responses(
        (status = 200, description = "The user; `email` is null unless visible to the caller", body = UserNode),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 403, description = "Not the user or an admin", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::query("user"), &id_args(&id), None, || async {
        let raw_id = decode_as(EntityType::User, &id)?;
        let user = state.db.users().get(&raw_id).await?;
        Ok(Json(user_node(&mw, user).await?))
    })
    .await
}

/// List a user's todos
///
/// GET /api/v1/users/{id}/todos
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/todos",
    params(
        ("id" = String, Path, description = "Node id of the user"),
        ("first" = Option<i64>, Query, description = "Page size when paging forward"),
        ("after" = Option<String>, Query, description = "Cursor to page forward from"),
        ("last" = Option<i64>, Query, description = "Page size when paging backward"),
        ("before" = Option<String>, Query, description = "Cursor to page backward from")
    ),
    responses(
        (status = 200, description = "A connection of the user's todos"),
        (status = 400, description = "Malformed id or pagination arguments", body = ApiErrorResponse),
        (status = 403, description = "Not the user or an admin", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn user_todos(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    args: Result<Query<ConnectionArgs>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(args) = args?;
    let mw = PermissionMiddleware::new(&state, &ctx);
    let user = mw
        .resolve(&FieldKey::query("user"), &id_args(&id), None, || async {
            let raw_id = decode_as(EntityType::User, &id)?;
            Ok(state.db.users().get(&raw_id).await?)
        })
        .await?;

    let parent = user_parent(&user)?;
    mw.resolve(
        &FieldKey::new("User", "todos"),
        &connection_field_args(&args),
        Some(&parent),
        || async { Ok(Json(todo_connection(&state, &user.id, &args).await?)) },
    )
    .await
}

/// Delete a user and everything they own
///
/// POST /api/v1/users/{id}/delete
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/delete",
    params(("id" = String, Path, description = "Node id of the user")),
    responses(
        (status = 200, description = "User deleted", body = DeleteResponse),
        (status = 403, description = "Admins only", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::mutation("deleteUser"), &id_args(&id), None, || async {
        let raw_id = decode_as(EntityType::User, &id)?;
        state.db.users().delete(&raw_id).await?;
        Ok(Json(DeleteResponse {
            success: true,
            id: encode(EntityType::User, &raw_id),
        }))
    })
    .await
}
