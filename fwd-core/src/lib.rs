//! Core types and algorithms for forwarding entries.
//!
//! A forwarding entry is a named node in a hierarchical namespace that points
//! at another entity by full name. This crate validates those references,
//! decides how requests for an entry are answered, and suggests target names,
//! all over a namespace that the host passes in.

mod chain;
mod config;
mod dispatch;
mod entity;
mod error;
mod memory;
mod permission;
mod resolver;
mod suggest;
mod validate;

// Re-export core types
pub use chain::{follow, ChainEnd, DEFAULT_MAX_HOPS};
pub use config::{apply_configuration, rename_entry, ConfigOutcome, ConfigSubmission};
pub use dispatch::{
    compute_redirect, dynamic_redirect_location, encode_sub_path, target_url, RedirectDecision,
};
pub use entity::{Entity, EntityId, EntityKind, ForwardingEntry};
pub use error::{ForwardError, Result};
pub use memory::{MemoryNamespace, NamespaceSeed, SeedItem};
pub use permission::{
    check as check_permission, check_rename, Authorizer, GrantSet, ParsePermissionError, Permission,
};
pub use resolver::{
    check_good_name, child_full_name, referred_item_exists, EntityMode, NamespaceResolver,
    NamespaceStore,
};
pub use suggest::{suggest, suggest_with_limits, SuggestLimits, Suggestions};
pub use validate::{check_target, validate_target, CheckResult, ValidationError, ValidationReason};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
