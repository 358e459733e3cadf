use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tasker::app::ports::TokenProfiles;
use tasker::config::AppConfig;
use tasker::observability::{self, init_logging};
use tasker::scheduler::spawn_notification_sweep;
use tasker::server::start_server;
use tasker::services::{Ports, Services};

#[derive(Parser)]
#[command(name = "tasker")]
#[command(about = "Task management API with e-mail notifications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations, start the notification sweep and serve the HTTP API (default)
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one notification sweep and exit
    Sweep,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(profile = %config.profile, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Commands::Sweep => {
            let services = build_services(&config).await?;
            let report = services.notify_task.notify().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Migrate => migrate(&config).await,
    }
}

async fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let ports = Ports::from_config(config)
        .await
        .context("Failed to set up storage and adapters")?;
    let profiles = TokenProfiles::from_secrets(&config.secrets);
    Ok(Services::new(&ports, &profiles, config.port)?)
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if let Err(e) = observability::init() {
        warn!("Metrics disabled: {}", e);
    }

    let services = build_services(&config).await?;
    let sweep = spawn_notification_sweep(
        Arc::clone(&services.notify_task),
        Duration::from_secs(config.notify_interval_secs),
    );

    let result = start_server(services.router(), config.port).await;
    sweep.abort();
    Ok(result?)
}

#[cfg(feature = "db")]
async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let manager = tasker::storage::DatabaseManager::connect(&config.database).await?;
    manager.run_migrations().await?;
    info!("Migrations applied");
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn migrate(_config: &AppConfig) -> anyhow::Result<()> {
    warn!("Built without the `db` feature; nothing to migrate");
    Ok(())
}
