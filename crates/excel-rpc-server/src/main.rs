//! excel-rpc server - JSON-RPC 2.0 over HTTP for spreadsheet automation
//!
//! Accepts JSON-RPC requests on a single endpoint and runs them against an
//! automation host owned by a dedicated thread.
//!
//! # Usage
//!
//! ```bash
//! # Start on 127.0.0.1:8000
//! excel-rpc-server
//!
//! # Custom address, macOS chart names, no diagnostic data in errors
//! excel-rpc-server --host 0.0.0.0 --port 9000 --platform macos --no-error-details
//! ```
//!
//! # Endpoints
//!
//! - `POST /rpc` - JSON-RPC 2.0 requests and batches
//! - `GET /health` - Health check

mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, ValueEnum};
use excel_rpc::{
    methods, Automation, DispatchOptions, Dispatcher, MemoryHost, MethodContext, Platform,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// JSON-RPC server for spreadsheet automation
#[derive(Parser, Debug)]
#[command(name = "excel-rpc-server")]
#[command(about = "JSON-RPC 2.0 server for spreadsheet automation")]
#[command(version)]
struct Args {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// HTTP server port
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Chart naming vocabulary
    #[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
    platform: PlatformArg,

    /// Leave `data` off mapped error responses
    #[arg(long)]
    no_error_details: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    Auto,
    Windows,
    Macos,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Auto => Platform::current(),
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Macos => Platform::MacOs,
        }
    }
}

/// Shared application state
pub struct AppState {
    dispatcher: Dispatcher,
}

impl AppState {
    fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let platform = Platform::from(args.platform);
    let automation = Automation::start(|| Ok(MemoryHost::with_workbook()))
        .context("failed to start the automation thread")?;
    let registry = methods::registry(automation, MethodContext { platform });
    let dispatcher = Dispatcher::with_options(
        registry,
        DispatchOptions {
            include_error_details: !args.no_error_details,
        },
    );

    let state = Arc::new(AppState::new(dispatcher));
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    info!("excel-rpc server v{}", env!("CARGO_PKG_VERSION"));
    info!("JSON-RPC endpoint: http://{}/rpc", addr);
    info!("Chart platform: {}", platform);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::rpc_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown requested");
}
