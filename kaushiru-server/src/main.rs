//! kaushiru-server - community grocery price tracker backend
//!
//! Startup: bootstrap config (CLI, env, TOML), tracing, database
//! initialization, runtime settings, then the HTTP server with graceful
//! shutdown on Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use kaushiru_common::config::{
    load_toml_config_or_default, LoggingConfig, RootFolderInitializer, RootFolderResolver,
    RuntimeSettings,
};
use kaushiru_common::db::init_database;
use kaushiru_server::mailer::Mailer;
use kaushiru_server::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for kaushiru-server
#[derive(Parser, Debug)]
#[command(name = "kaushiru-server")]
#[command(about = "Kau-Shiru price posting and statistics service")]
#[command(version)]
struct Args {
    /// Root folder holding kaushiru.db
    #[arg(short, long, env = "KAUSHIRU_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "KAUSHIRU_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Resend API key for contact notification mails
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    resend_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_toml_config_or_default(args.config.as_deref());

    init_tracing(&config.logging)?;

    info!(
        "Starting Kau-Shiru server (kaushiru-server) v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.resend_api_key.is_some() {
        config.contact.resend_api_key = args.resend_api_key;
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder)
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let settings = RuntimeSettings::load(&pool).await?;
    info!(
        "Runtime settings: tax_rate={}, default region {} / {}",
        settings.tax_rate, settings.default_region_big, settings.default_area_group
    );

    let mailer = Mailer::new(&config.contact).context("Failed to build mail client")?;
    if !mailer.is_enabled() {
        warn!("RESEND_API_KEY not set; contact messages are stored without mail");
    }

    let state = AppState::new(pool.clone(), settings, mailer, config.base_url.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("kaushiru-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level; a log file replaces stderr
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "kaushiru_server={level},kaushiru_common={level},tower_http={level}",
            level = logging.level
        ))
    });

    let (file_layer, stderr_layer) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
