//! HTTP service for forwarding entries.
//!
//! This crate hosts a namespace of groups, plain items and forwarding entries
//! and exposes it over HTTP: requests that reach a forwarding entry are
//! redirected, shown an interstitial, or asked for configuration, and the
//! entry's configuration, rename and autocomplete actions are served next to
//! it.

pub mod options;
pub mod router;
pub mod server;

mod handlers;
mod views;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fwd_core::{ForwardError, GrantSet, SuggestLimits};
use serde_json::json;
use thiserror::Error;

/// Error type for service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid options: {0}")]
    Options(String),
}

/// Type alias for service results
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    fn status_and_reason(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::Forward(err) => match err {
                ForwardError::Validation(e) => (StatusCode::BAD_REQUEST, e.reason.code()),
                ForwardError::InvalidName(_) => (StatusCode::BAD_REQUEST, "INVALID_NAME"),
                ForwardError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
                ForwardError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ForwardError::NotForwarding(_) => (StatusCode::BAD_REQUEST, "NOT_FORWARDING"),
                ForwardError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
                ForwardError::Serialization(_) | ForwardError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
                }
            },
            ServiceError::ServerError(_) | ServiceError::Options(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, reason) = self.status_and_reason();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = json!({
            "reason": reason,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Verbosity of the service's own logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Normal,
    Quiet,
}

/// Configuration options for the service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Namespace seed loaded at startup
    pub namespace_seed: Option<PathBuf>,

    /// File the namespace is saved to after every change; loaded in
    /// preference to the seed when it already exists
    pub state_file: Option<PathBuf>,

    /// Prefix of every entity URL
    pub url_prefix: String,

    /// Permissions granted to every caller
    pub grants: GrantSet,

    /// Seconds the interstitial waits before following through
    pub interstitial_delay_secs: u64,

    /// Bounds on autocomplete traversals
    pub suggest_limits: SuggestLimits,

    /// Whether to install a tracing subscriber
    pub init_tracing: bool,

    pub log_level: LogLevel,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            namespace_seed: None,
            state_file: None,
            url_prefix: "/".to_string(),
            grants: GrantSet::all(),
            interstitial_delay_secs: 3,
            suggest_limits: SuggestLimits::default(),
            init_tracing: false,
            log_level: LogLevel::Normal,
        }
    }
}

/// Start the service with the given options.
///
/// This is the main entry point for starting the service programmatically.
pub async fn start_service(options: ServiceOptions) -> Result<()> {
    server::run_server(options).await
}
