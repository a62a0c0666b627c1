use crate::utils::env_paths::EnvPaths;
use anyhow::Result;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Server logging: a daily rolling file under `<data>/logs` plus the console.
///
/// The returned guard flushes the file writer on drop and must be held for
/// as long as the server runs.
pub fn init_server_logging(env_paths: &EnvPaths, verbose: bool) -> Result<WorkerGuard> {
    let logs_dir = env_paths.logs_path();
    std::fs::create_dir_all(&logs_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("todo-api")
        .filename_suffix("log")
        .build(&logs_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Local offset detection fails in some multi-threaded environments.
    let timer = OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        )
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer.clone())
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            fmt::layer()
                .with_timer(timer)
                .with_target(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(env_filter(verbose))
        .init();

    tracing::info!("Logging system initialized");
    tracing::info!("Log files are being written to: {:?}", logs_dir);

    Ok(guard)
}

/// Console-only logging for one-shot commands. Logs go to stderr so that
/// `--format json` output stays parseable.
pub fn init_command_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn log_shutdown() {
    tracing::info!("=== Todo API shutdown complete ===");
}
