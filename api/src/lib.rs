use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;
pub mod test_data;

#[cfg(test)]
mod router_tests;

pub use config::{ApiConfig, ConfigError};
pub use server::{build_state, start_server_with_config};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Arc<database::Database>,
    pub authz: authz::AuthzEngine,
    pub config: Arc<ApiConfig>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::me::get_me,
        handlers::me::update_me,
        handlers::node::get_node,
        handlers::todos::list_todos,
        handlers::todos::get_todo,
        handlers::todos::create_todo,
        handlers::todos::update_todo,
        handlers::todos::complete_todo,
        handlers::todos::uncomplete_todo,
        handlers::todos::delete_todo,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::user_todos,
        handlers::users::delete_user,
    ),
    components(
        schemas(
            models::TodoNode,
            models::UserNode,
            models::CreateTodoRequest,
            models::UpdateTodoRequest,
            models::UpdateMeRequest,
            models::HealthResponse,
            models::DatabaseHealth,
            models::DeleteResponse,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    tags(
        (name = "todos", description = "Todo CRUD operations"),
        (name = "users", description = "User profiles and administration"),
        (name = "nodes", description = "Lookup by node id"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Todo API",
        version = "1.0.0",
        description = "Todo service with per-field permission rules",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route(
            "/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route("/todos/:id", get(handlers::todos::get_todo))
        .route("/todos/:id/update", post(handlers::todos::update_todo))
        .route("/todos/:id/complete", post(handlers::todos::complete_todo))
        .route(
            "/todos/:id/uncomplete",
            post(handlers::todos::uncomplete_todo),
        )
        .route("/todos/:id/delete", post(handlers::todos::delete_todo))
        .route("/users", get(handlers::users::list_users))
        .route("/users/:id", get(handlers::users::get_user))
        .route("/users/:id/delete", post(handlers::users::delete_user))
        .route("/users/:id/todos", get(handlers::users::user_todos))
        .route(
            "/me",
            get(handlers::me::get_me).post(handlers::me::update_me),
        )
        .route("/node/:id", get(handlers::node::get_node))
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
