//! Namespace access traits.
//!
//! The core never owns a namespace. Every operation receives a
//! [`NamespaceResolver`] (and, for mutations, a [`NamespaceStore`]) from the
//! host, which keeps the actual tree and synchronizes access to it.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, ForwardingEntry};
use crate::error::{ForwardError, Result};

/// Characters a name may never contain.
const ILLEGAL_NAME_CHARS: &[char] = &[
    '?', '*', '/', '\\', '%', '!', '@', '#', '$', '^', '&', '|', '<', '>', '[', ']', ':', ';',
];

/// Read access to a hierarchical namespace.
///
/// Implementations must reflect the namespace as it is at call time; callers
/// re-resolve instead of caching when staleness matters.
pub trait NamespaceResolver: Send + Sync {
    /// Look up an entity by its full name.
    fn resolve(&self, full_name: &str) -> Option<Entity>;

    /// The root group. Its full name is empty.
    fn root(&self) -> Entity;

    /// Direct children of a group, in namespace order.
    ///
    /// Returns an empty list for non-groups and for groups that no longer
    /// exist.
    fn children(&self, group: &Entity) -> Vec<Entity>;
}

/// Kind of entity a host can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityMode {
    Plain,
    Group,
    Forwarding,
}

/// Write access to a namespace, owned by the host.
pub trait NamespaceStore: NamespaceResolver {
    /// Create an empty entity under the group named `parent`.
    fn create(&self, parent: &str, name: &str, mode: EntityMode) -> Result<Entity>;

    /// Remove the entity and, for groups, everything below it.
    fn delete(&self, full_name: &str) -> Result<()>;

    /// Give an entity a new name within its current parent.
    fn rename(&self, id: EntityId, new_name: &str) -> Result<Entity>;

    /// Replace a forwarding entry's configuration in one step.
    ///
    /// The entry's name is owned by the store; `entry.name` is ignored.
    fn commit_forwarding(&self, id: EntityId, entry: ForwardingEntry) -> Result<Entity>;
}

/// Apply the namespace's name-validity rules.
pub fn check_good_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ForwardError::InvalidName("name must not be empty".to_string()));
    }
    if name.trim() != name {
        return Err(ForwardError::InvalidName(format!(
            "'{name}' has leading or trailing whitespace"
        )));
    }
    if name == "." || name == ".." {
        return Err(ForwardError::InvalidName(format!("'{name}' is not an allowed name")));
    }
    if let Some(c) = name.chars().find(|c| ILLEGAL_NAME_CHARS.contains(c)) {
        return Err(ForwardError::InvalidName(format!(
            "'{c}' is an unsafe character in '{name}'"
        )));
    }
    Ok(())
}

/// Whether the entry's current target resolves.
pub fn referred_item_exists<R: NamespaceResolver + ?Sized>(entry: &ForwardingEntry, ns: &R) -> bool {
    entry
        .target_name
        .as_deref()
        .and_then(|name| ns.resolve(name))
        .is_some()
}

/// Join a parent's full name and a child name.
pub fn child_full_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
