//! routepipe server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (Axum fallback, body limit, request ID)
//!                          │
//!                          ▼
//!                     HttpHandler::serve
//!                          │
//!            ┌─────────────┼─────────────┐
//!            ▼             ▼             ▼
//!       before pipe    main pipe     after pipe
//!            │             │             │
//!            └── PathMatchHandler (pattern + matchers + executor)
//!
//!     config (TOML) ──▶ routes ──▶ HttpHandler ──▶ ArcSwap (hot reload)
//! ```

use std::path::PathBuf;

use axum::http::{Method, StatusCode};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use routepipe::config::{apply_routes, load_config, watcher::ConfigWatcher, ServerConfig};
use routepipe::error::DispatchError;
use routepipe::handlers::HttpHandler;
use routepipe::lifecycle::Shutdown;
use routepipe::observability::logging;
use routepipe::responders;
use routepipe::HttpServer;

#[derive(Parser)]
#[command(name = "routepipe")]
#[command(about = "Pattern-routed HTTP dispatch server", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload routes when the configuration file changes
    #[arg(short, long)]
    watch: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

/// Built-in routes first, then the configured ones.
fn dispatcher(config: &ServerConfig) -> Result<HttpHandler, DispatchError> {
    let mut handler = HttpHandler::with_options((&config.dispatch).into());
    handler.map_method(Method::GET, "/health", |ctx| {
        responders::with_text(ctx, StatusCode::OK, "ok");
        Ok(())
    })?;
    apply_routes(&mut handler, &config.routes)?;
    Ok(handler)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    if cli.check {
        dispatcher(&config)?;
        println!("configuration OK: {} route(s)", config.routes.len());
        return Ok(());
    }

    tracing::info!("routepipe v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    // The watcher handle must outlive the server.
    let (config_updates, _watcher) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, dispatcher)?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown.trigger_on_ctrl_c().await;
    });

    server.run(listener, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
