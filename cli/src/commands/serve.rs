use crate::logging;
use crate::utils::env_paths::EnvPaths;
use anyhow::{anyhow, Result};
use api::ApiConfig;
use database::{initialize_database, DatabaseConfig};
use tracing::info;

/// Run the API server until interrupted
pub async fn execute(port: Option<u16>, no_seed: bool, verbose: bool) -> Result<()> {
    let env_paths = EnvPaths::load()?;
    let _guard = logging::init_server_logging(&env_paths, verbose)?;

    let mut config = ApiConfig::load(&env_paths.configuration_path)?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if no_seed {
        config = config.with_test_data(false);
    }
    info!("Starting Todo API with {:?}", config);

    let db_path = env_paths.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = initialize_database(DatabaseConfig::new_with_path(db_path)).await?;

    api::start_server_with_config(db, config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))?;

    logging::log_shutdown();
    Ok(())
}
