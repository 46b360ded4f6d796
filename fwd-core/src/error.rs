//! Error types for forwarding operations.

use thiserror::Error;

use crate::permission::Permission;
use crate::validate::ValidationError;

/// Main error type for namespace and forwarding operations.
#[derive(Error, Debug)]
pub enum ForwardError {
    /// A proposed target reference was rejected
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A name failed the namespace's name-validity rules
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The caller lacks a required permission
    #[error("Permission denied: {0} is required")]
    PermissionDenied(Permission),

    /// No entity is registered under the given name
    #[error("Not found: {0}")]
    NotFound(String),

    /// The entity exists but is not a forwarding entry
    #[error("Not a forwarding entry: {0}")]
    NotForwarding(String),

    /// A sibling with the same name already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for forwarding operations
pub type Result<T> = std::result::Result<T, ForwardError>;
