use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod utils;

use commands::{config, health, serve};

/// todoctl - Command line interface for the Todo API
#[derive(Parser)]
#[command(name = "todoctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on; overrides config.api.yaml
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Do not seed development users and todos
        #[arg(long)]
        no_seed: bool,
    },

    /// Check system health and status
    Health {
        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Base URL of the API server, defaults to localhost on the configured port
        #[arg(long)]
        url: Option<String>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List all loaded configurations
    List {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read a specific configuration value
    Get {
        /// Dotted path starting with the configuration id (e.g. "api.pagination.todos")
        section: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, no_seed } => {
            serve::execute(port, no_seed, cli.verbose).await?;
        }
        Commands::Health { format, url } => {
            logging::init_command_logging(cli.verbose);
            health::execute(format, url).await?;
        }
        Commands::Config { action } => {
            logging::init_command_logging(cli.verbose);
            match action {
                ConfigAction::List { format } => config::list(format)?,
                ConfigAction::Get { section, format } => config::get(section, format)?,
            }
        }
    }

    Ok(())
}
