use crate::{config::ApiConfig, create_router, AppState};
use authz::{policy, AuthzEngine};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Assembles the shared state. Fails when a schema field has no permission
/// rule, so an unguarded field never reaches a listener.
pub fn build_state(
    db: Arc<database::Database>,
    config: ApiConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let authz = AuthzEngine::todo();
    if let Err(missing) = authz.check_coverage(&policy::schema_fields()) {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        error!("Fields without a permission rule: {}", names.join(", "));
        return Err(format!("fields without a permission rule: {}", names.join(", ")).into());
    }

    Ok(AppState {
        db,
        authz,
        config: Arc::new(config),
    })
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(
    db: Arc<database::Database>,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if config.init_test_data {
        info!("Initializing test data for development");
        if let Err(e) = crate::test_data::init_test_data(&db).await {
            warn!("Failed to initialize test data: {}", e);
        }
    }

    let port = config.port;
    let state = build_state(db, config)?;
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!("Swagger UI available at http://localhost:{}/api/v1/swagger", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
