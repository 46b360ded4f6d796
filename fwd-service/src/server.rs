//! HTTP server implementation for the service.
//!
//! This module builds the axum router over a shared namespace and runs it.

use std::sync::Arc;

use axum::{routing::get, Router};
use fwd_core::MemoryNamespace;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{handlers, LogLevel, Result, ServiceError, ServiceOptions};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The namespace served by this instance
    pub(crate) namespace: Arc<MemoryNamespace>,

    /// Service configuration options
    pub(crate) options: Arc<ServiceOptions>,
}

impl AppState {
    pub fn new(namespace: MemoryNamespace, options: ServiceOptions) -> Self {
        Self {
            namespace: Arc::new(namespace),
            options: Arc::new(options),
        }
    }

    pub fn namespace(&self) -> &Arc<MemoryNamespace> {
        &self.namespace
    }
}

/// Build the router serving every namespace path.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::get_item).post(handlers::post_item))
        .route("/*path", get(handlers::get_item).post(handlers::post_item))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the namespace named by the options.
///
/// An existing state file wins over the seed; with neither, the namespace
/// starts empty.
pub fn load_namespace(options: &ServiceOptions) -> Result<MemoryNamespace> {
    if let Some(state_file) = options.state_file.as_ref().filter(|p| p.exists()) {
        return Ok(MemoryNamespace::load(&options.url_prefix, state_file)?);
    }
    if let Some(seed) = &options.namespace_seed {
        return Ok(MemoryNamespace::load(&options.url_prefix, seed)?);
    }
    info!("Starting with an empty namespace");
    Ok(MemoryNamespace::new(&options.url_prefix))
}

fn init_tracing(level: LogLevel) {
    let filter = match level {
        LogLevel::Debug => "fwd_service=debug,fwd_core=debug,tower_http=debug",
        LogLevel::Normal => "fwd_service=info,fwd_core=info,tower_http=warn",
        LogLevel::Quiet => "fwd_service=error,fwd_core=error,tower_http=error",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // A subscriber may already be installed by an embedding application.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Run the HTTP server with the provided options.
pub async fn run_server(options: ServiceOptions) -> Result<()> {
    if options.init_tracing {
        init_tracing(options.log_level);
    }

    let namespace = load_namespace(&options)?;
    if let Some(parent) = options.state_file.as_ref().and_then(|p| p.parent()) {
        std::fs::create_dir_all(parent).map_err(fwd_core::ForwardError::from)?;
    }

    let bind_address = options.bind_address;
    let app = build_router(AppState::new(namespace, options));

    info!("Starting forwarding service on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| ServiceError::ServerError(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServiceError::ServerError(format!("Server error: {}", e)))?;

    Ok(())
}
