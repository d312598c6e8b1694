//! Turnstile - session authentication service

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LogFormat, LoggingConfig, SessionStoreKind};
use turnstile_api::{AppState, create_router};
use turnstile_auth::{
    AuthMode, MemorySessionStore, PathPolicy, SessionAuthority, SessionStore, build_authenticator,
};
use turnstile_db::Database;

/// Turnstile - cookie session authentication for a small REST API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TURNSTILE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TURNSTILE_PORT")]
    port: Option<u16>,

    /// Authentication mode (none, basic, session)
    #[arg(long, env = "AUTH_TYPE")]
    auth_type: Option<AuthMode>,

    /// Name of the session cookie
    #[arg(long, env = "SESSION_NAME")]
    session_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    config.apply_overrides(args.bind, args.port, args.auth_type, args.session_name);

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Turnstile v{}", env!("CARGO_PKG_VERSION"));
    if Path::new(&args.config).exists() {
        info!("Loaded configuration from {}", args.config);
    } else {
        info!("Config file not found at {}, using defaults", args.config);
    }
    for warning in config.warnings() {
        warn!("{}", warning);
    }
    let session_ttl = config.session_ttl()?;

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

    // Initialize session store
    let store: Arc<dyn SessionStore> = match config.auth.session_store {
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreKind::Database => Arc::new(db.clone()),
    };

    let authority = Arc::new(
        SessionAuthority::new(store, Arc::new(db.clone())).with_session_ttl(session_ttl),
    );

    // Initialize authenticator
    let policy = PathPolicy::new(&config.auth.excluded_paths);
    let authenticator = build_authenticator(
        config.auth.mode,
        policy,
        authority.clone(),
        &config.auth.session_cookie,
    );

    // Initialize metrics exporter
    let metrics_handle = if config.metrics.enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(Arc::new(handle)),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Create application state
    let state = AppState::new(
        db,
        authority,
        authenticator,
        config.auth.session_cookie.clone(),
        config.auth.reveal_login_failures,
    );

    // Create router; trailing slashes are trimmed before routing
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    // Determine bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);
    info!(
        "Auth mode: {}, session store: {:?}, cookie: {}",
        config.auth.mode, config.auth.session_store, config.auth.session_cookie
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
