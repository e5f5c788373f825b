//! radix-web - public site of the glassmaking history database
//!
//! Serves the HTML pages, the people search endpoint and the revalidation
//! endpoint over the content database written by `radix-import`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use radix_common::config::{ConfigOverrides, SiteConfig};
use radix_common::db::connect_readonly;
use radix_web::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for radix-web
#[derive(Parser, Debug)]
#[command(name = "radix-web")]
#[command(about = "Public website of the Radix Vitri glassmaking history database")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RADIX_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "RADIX_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Content database path
    #[arg(short, long, env = "RADIX_DATABASE")]
    database: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(short, long, env = "RADIX_CONFIG")]
    config: Option<PathBuf>,

    /// Shared secret of POST /api/revalidate
    #[arg(long, env = "PAYLOAD_REVALIDATION_TOKEN", hide_env_values = true)]
    revalidation_token: Option<String>,

    /// Base url prefixed to relative media urls
    #[arg(long, env = "NEXT_PUBLIC_PAYLOAD_URL")]
    media_base_url: Option<String>,

    /// Seconds a rendered page stays cached (0 disables the cache)
    #[arg(long, env = "RADIX_CACHE_MAX_AGE")]
    cache_max_age: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_addr: self.bind_addr.clone(),
            port: self.port,
            database_path: self.database.clone(),
            media_base_url: self.media_base_url.clone(),
            revalidation_token: self.revalidation_token.clone(),
            frontend_url: None,
            cache_max_age_secs: self.cache_max_age,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radix_web=info,radix_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting Radix Vitri web (radix-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = SiteConfig::load(args.config.as_deref(), args.overrides())
        .context("Failed to load configuration")?;

    info!("Database path: {}", config.database_path.display());
    if config.revalidation_token.is_none() {
        warn!("PAYLOAD_REVALIDATION_TOKEN not set, /api/revalidate will reject every request");
    }

    let pool = connect_readonly(&config.database_path)
        .await
        .context("Failed to open content database")?;

    let state = AppState::new(pool, &config).context("Failed to load page templates")?;
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("radix-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
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
