use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use user_manager::{
    config::AppConfig,
    database::Database,
    metrics::AppMetrics,
    services::ServiceContainer,
    shutdown::{shutdown_signal, DatabaseShutdown, ShutdownCoordinator},
    tracing as app_tracing,
    web::{create_router, AppState},
};

#[derive(Debug, Parser)]
#[command(name = "user-manager", version, about = "User management API")]
struct Args {
    /// Configuration file layered over the defaults and config/ directory
    #[arg(short, long, env = "APP_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Print the documented configuration template and exit
    #[arg(long)]
    print_config_template: bool,

    /// Apply pending database migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config_template {
        print!("{}", AppConfig::generate_template());
        return Ok(());
    }

    dotenvy::dotenv().ok();

    let config =
        AppConfig::load_with(args.config.as_deref()).context("Failed to load configuration")?;
    let _telemetry = app_tracing::init_tracing(&config)?;
    config.log_summary();

    let database = Database::new(&config.database).await?;
    if args.migrate || config.database.run_migrations {
        database.migrate().await?;
    }

    let metrics = AppMetrics::new()?;
    let services = ServiceContainer::new(database.pool().clone(), &config);
    let addr = config.server.socket_addr()?;
    let shutdown_timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_seconds);

    let state = AppState::new(config, &services, metrics, Some(database.clone()));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped accepting connections");

    let mut coordinator = ShutdownCoordinator::new(shutdown_timeout);
    coordinator.register(DatabaseShutdown::new(database));
    if let Err(e) = coordinator.shutdown_all().await {
        tracing::warn!("Shutdown incomplete: {}", e);
    }

    Ok(())
}
