use crate::utils::env_paths::EnvPaths;
use anyhow::Result;
use api::{config::API_CONFIG_FILE, ApiConfig};
use colored::*;
use serde_json::{json, Value};
use std::time::Duration;

const API_TIMEOUT: Duration = Duration::from_secs(3);

/// Execute the health check command
pub async fn execute(format: String, url: Option<String>) -> Result<()> {
    let env_paths = EnvPaths::load()?;
    let health_status = check_system_health(&env_paths, url).await;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&health_status)?),
        _ => print_health_status_text(&health_status),
    }

    Ok(())
}

/// Check the health of the database, the configuration and a running server
async fn check_system_health(env_paths: &EnvPaths, url: Option<String>) -> Value {
    let api_url = url.unwrap_or_else(|| {
        let port = ApiConfig::load(&env_paths.configuration_path)
            .map(|config| config.port)
            .unwrap_or(api::config::DEFAULT_PORT);
        format!("http://localhost:{}", port)
    });

    let mut components = serde_json::Map::new();
    components.insert("database".to_string(), check_database_health(env_paths).await);
    components.insert("configuration".to_string(), check_configuration_health(env_paths));
    components.insert("api".to_string(), check_api_health(&api_url).await);

    let all_healthy = components
        .values()
        .all(|v| v["status"].as_str() == Some("healthy"));

    json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": components,
    })
}

async fn check_database_health(env_paths: &EnvPaths) -> Value {
    let db_path = env_paths.database_path();

    if !db_path.exists() {
        return json!({
            "status": "not_initialized",
            "message": "Database file does not exist yet",
            "path": db_path.display().to_string()
        });
    }

    let config = database::DatabaseConfig::new_with_path(db_path.clone()).with_create_tables(false);
    match database::initialize_database(config).await {
        Ok(db) => match db.table_exists("todos").await {
            Ok(true) => json!({
                "status": "healthy",
                "message": "Database file exists and is accessible",
                "path": db_path.display().to_string()
            }),
            Ok(false) => json!({
                "status": "unhealthy",
                "message": "Database is missing the todos table",
                "path": db_path.display().to_string()
            }),
            Err(e) => json!({
                "status": "unhealthy",
                "message": format!("Database exists but cannot be queried: {}", e),
                "path": db_path.display().to_string()
            }),
        },
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Database exists but cannot be accessed: {}", e),
            "path": db_path.display().to_string()
        }),
    }
}

fn check_configuration_health(env_paths: &EnvPaths) -> Value {
    let config_dir = &env_paths.configuration_path;

    if !config_dir.exists() {
        return json!({
            "status": "warning",
            "message": format!("Configuration directory not found at: {}, using defaults", config_dir.display())
        });
    }

    if !config_dir.join(API_CONFIG_FILE).exists() {
        return json!({
            "status": "warning",
            "message": format!("{} not found, using defaults", API_CONFIG_FILE)
        });
    }

    match ApiConfig::load(config_dir) {
        Ok(config) => json!({
            "status": "healthy",
            "message": "API configuration is valid",
            "port": config.port,
            "init_test_data": config.init_test_data
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Invalid API configuration: {}", e)
        }),
    }
}

async fn check_api_health(base_url: &str) -> Value {
    let health_url = format!("{}/api/v1/health", base_url.trim_end_matches('/'));

    let client = match reqwest::Client::builder().timeout(API_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Failed to build HTTP client: {}", e),
                "endpoint": base_url
            })
        }
    };

    match client.get(&health_url).send().await {
        Ok(response) if response.status().is_success() => {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let reported = body["status"].as_str().unwrap_or("unknown").to_string();
            json!({
                "status": if reported == "healthy" { "healthy" } else { "unhealthy" },
                "message": format!("API server is running and reports {}", reported),
                "version": body["version"],
                "endpoint": base_url
            })
        }
        Ok(response) => json!({
            "status": "unhealthy",
            "message": format!("API server returned status: {}", response.status()),
            "endpoint": base_url
        }),
        Err(_) => json!({
            "status": "offline",
            "message": "API server is not running or not reachable",
            "endpoint": base_url
        }),
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &Value) {
    println!("{}", "=== Todo API Health Check ===".bold());
    println!();

    let status_display = match status["status"].as_str().unwrap_or("unknown") {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "─".repeat(50));

    let Some(components) = status["components"].as_object() else {
        return;
    };

    for (name, component) in components {
        let comp_status = component["status"].as_str().unwrap_or("unknown");
        let (icon, text) = match comp_status {
            "healthy" => ("✓".green(), comp_status.green()),
            "unhealthy" => ("✗".red(), comp_status.red()),
            "warning" => ("⚠".yellow(), comp_status.yellow()),
            "offline" | "not_initialized" => ("○".white(), comp_status.white()),
            _ => ("?".white(), comp_status.white()),
        };

        println!("{} {} ({})", icon, name.to_uppercase().bold(), text);
        if let Some(message) = component["message"].as_str() {
            println!("  {}", message);
        }
        if let Some(path) = component["path"].as_str() {
            println!("  Path: {}", path);
        }
        if let Some(endpoint) = component["endpoint"].as_str() {
            println!("  Endpoint: {}", endpoint);
        }
        println!();
    }
}
