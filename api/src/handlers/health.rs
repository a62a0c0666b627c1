use authz::{Args, FieldKey};
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::info;

use crate::{
    context::RequestContext,
    error::ApiResult,
    middleware_hooks::PermissionMiddleware,
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service health, `degraded` when the database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<impl IntoResponse> {
    info!("Health check requested");

    let mw = PermissionMiddleware::new(&state, &ctx);
    mw.resolve(&FieldKey::query("health"), &Args::new(), None, || async {
        let db_health = match sqlx::query("SELECT 1").fetch_one(state.db.pool()).await {
            Ok(_) => DatabaseHealth {
                connected: true,
                message: "Database connection successful".to_string(),
            },
            Err(e) => DatabaseHealth {
                connected: false,
                message: format!("Database connection failed: {}", e),
            },
        };

        let response = HealthResponse {
            status: if db_health.connected {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            database: db_health,
        };

        Ok(Json(response))
    })
    .await
}
