use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agenthub_core::config::AppConfig;
use agenthub_engine::{HttpDispatcher, MissionExecutor, MissionRegistry, ResultCollector};
use agenthub_gateway::HubServer;
use agenthub_store::MissionStore;

#[derive(Parser)]
#[command(name = "agenthub", version, about = "Mission workflow orchestration hub")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "agenthub.toml")]
    config: PathBuf,

    /// Override the gateway bind address
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP hub server
    Serve,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agenthub=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    };
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(MissionStore::open(&config.storage.db_path())?);
    let registry = Arc::new(MissionRegistry::new());
    let collector = Arc::new(ResultCollector::new());
    let transport = Arc::new(HttpDispatcher::new(config.agents.clone()));
    let executor = Arc::new(MissionExecutor::new(
        registry.clone(),
        collector.clone(),
        transport,
        store.clone(),
        config.agents.clone(),
        &config.executor,
    ));

    info!(
        bind = %config.gateway.bind,
        agents = config.agents.len(),
        data_dir = %config.storage.data_dir,
        "Starting hub"
    );
    let server = HubServer::new(
        config.gateway.clone(),
        config.storage.clone(),
        registry,
        executor,
        collector,
        store,
    );

    let cancel = tokio_util::sync::CancellationToken::new();
    let cancel_clone = cancel.clone();

    // Graceful shutdown on Ctrl-C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down hub...");
        cancel_clone.cancel();
    });

    server.run(cancel).await
}
