use authz::{Args, FieldKey};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use database::{NewTodo, TodoUpdate};
use relay::{decode_as, encode, Connection, ConnectionArgs, EntityType, KeyCursor};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::ListField,
    context::RequestContext,
    error::{ApiError, ApiResult},
    handlers::{connection_field_args, id_args, parse_pagination},
    middleware_hooks::PermissionMiddleware,
    models::{CreateTodoRequest, DeleteResponse, TodoNode, UpdateTodoRequest},
    AppState,
};

/// Pages through the todos of `owner_id`.
pub(crate) async fn todo_connection(
    state: &AppState,
    owner_id: &str,
    args: &ConnectionArgs,
) -> ApiResult<Connection<TodoNode>> {
    let pagination = parse_pagination(args, state.config.limits(ListField::Todos))?;
    let todos = state.db.todos();
    let page = todos.list(Some(owner_id), &pagination).await?;
    let total = todos.count(Some(owner_id)).await?;
    debug!(
        "Listed {} of {} todos for owner {}",
        page.items.len(),
        total,
        owner_id
    );
    Ok(Connection::from_page(page, total, |todo| KeyCursor::encode(&todo.id)).map(TodoNode::from))
}

/// List the caller's todos
///
/// GET /api/v1/todos
#[utoipa::path(
    get,
    path = "/api/v1/todos",
    params(
        ("first" = Option<i64>, Query, description = "Page size when paging forward"),
        ("after" = Option<String>, Query, description = "Cursor to page forward from"),
        ("last" = Option<i64>, Query, description = "Page size when paging backward"),
        ("before" = Option<String>, Query, description = "Cursor to page backward from")
    ),
    responses(
        (status = 200, description = "A connection of todos"),
        (status = 400, description = "Invalid pagination arguments", body = ApiErrorResponse),
        (status = 403, description = "Not signed in", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn list_todos(
    State(state): State<AppState>,
    ctx: RequestContext,
    args: Result<Query<ConnectionArgs>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(args) = args?;
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(
        &FieldKey::query("todos"),
        &connection_field_args(&args),
        None,
        || async {
            let owner_id = ctx.actor.id().ok_or(ApiError::Forbidden)?;
            Ok(Json(todo_connection(&state, owner_id, &args).await?))
        },
    )
    .await
}

/// Read a single todo
///
/// GET /api/v1/todos/{id}
#[utoipa::path(
    get,
    path = "/api/v1/todos/{id}",
    params(("id" = String, Path, description = "Node id of the todo, `Todo:<id>`")),
    responses(
        (status = 200, description = "The todo", body = TodoNode),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such todo", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn get_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::query("todo"), &id_args(&id), None, || async {
        let raw_id = decode_as(EntityType::Todo, &id)?;
        let todo = state.db.todos().get(&raw_id).await?;
        Ok(Json(TodoNode::from(todo)))
    })
    .await
}

/// Create a todo owned by the caller
///
/// POST /api/v1/todos
#[utoipa::path(
    post,
    path = "/api/v1/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoNode),
        (status = 400, description = "Invalid title", body = ApiErrorResponse),
        (status = 403, description = "Not signed in", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn create_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    request: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(CreateTodoRequest { title }) = request?;
    let mut args = Args::new();
    args.insert("title".to_string(), Value::String(title.clone()));

    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::mutation("createTodo"), &args, None, || async {
        let owner_id = ctx.actor.id().ok_or(ApiError::Forbidden)?;
        let todo = state
            .db
            .todos()
            .create(owner_id, NewTodo { title })
            .await?;
        Ok((StatusCode::CREATED, Json(TodoNode::from(todo))))
    })
    .await
}

/// Update a todo's title or completion
///
/// POST /api/v1/todos/{id}/update
#[utoipa::path(
    post,
    path = "/api/v1/todos/{id}/update",
    params(("id" = String, Path, description = "Node id of the todo")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Updated todo", body = TodoNode),
        (status = 400, description = "Malformed id or invalid title", body = ApiErrorResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such todo", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn update_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    request: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(UpdateTodoRequest { title, completed }) = request?;
    let mut args = id_args(&id);
    if let Some(title) = &title {
        args.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(completed) = completed {
        args.insert("completed".to_string(), Value::Bool(completed));
    }

    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::mutation("updateTodo"), &args, None, || async {
        let raw_id = decode_as(EntityType::Todo, &id)?;
        let todo = state
            .db
            .todos()
            .update(&raw_id, TodoUpdate { title, completed })
            .await?;
        Ok(Json(TodoNode::from(todo)))
    })
    .await
}

async fn set_completed(
    state: &AppState,
    ctx: &RequestContext,
    field: &str,
    id: &str,
    completed: bool,
) -> ApiResult<Json<TodoNode>> {
    let mw = PermissionMiddleware::new(state, ctx);
    mw.resolve(&FieldKey::mutation(field), &id_args(id), None, || async {
        let raw_id = decode_as(EntityType::Todo, id)?;
        let todo = state.db.todos().set_completed(&raw_id, completed).await?;
        Ok(Json(TodoNode::from(todo)))
    })
    .await
}

/// Mark a todo as done
///
/// POST /api/v1/todos/{id}/complete
#[utoipa::path(
    post,
    path = "/api/v1/todos/{id}/complete",
    params(("id" = String, Path, description = "Node id of the todo")),
    responses(
        (status = 200, description = "Completed todo", body = TodoNode),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such todo", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn complete_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    set_completed(&state, &ctx, "completeTodo", &id, true).await
}

/// Mark a todo as not done
///
/// POST /api/v1/todos/{id}/uncomplete
#[utoipa::path(
    post,
    path = "/api/v1/todos/{id}/uncomplete",
    params(("id" = String, Path, description = "Node id of the todo")),
    responses(
        (status = 200, description = "Reopened todo", body = TodoNode),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such todo", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn uncomplete_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    set_completed(&state, &ctx, "uncompleteTodo", &id, false).await
}

/// Delete a todo
///
/// POST /api/v1/todos/{id}/delete
#[utoipa::path(
    post,
    path = "/api/v1/todos/{id}/delete",
    params(("id" = String, Path, description = "Node id of the todo")),
    responses(
        (status = 200, description = "Todo deleted", body = DeleteResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such todo", body = ApiErrorResponse)
    ),
    tag = "todos"
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::mutation("deleteTodo"), &id_args(&id), None, || async {
        let raw_id = decode_as(EntityType::Todo, &id)?;
        let todo = state.db.todos().delete(&raw_id).await?;
        Ok(Json(DeleteResponse {
            success: true,
            id: encode(EntityType::Todo, &todo.id),
        }))
    })
    .await
}
