//! Namespace entity types.
//!
//! Every addressable thing in a namespace is an [`Entity`]: a snapshot of its
//! stable identifier, its current full name and URL, and a closed
//! [`EntityKind`] describing what it is. Forwarding entries carry their
//! configuration inline so validators and traversals can match on the variant
//! instead of probing types at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned to an entity when it is created.
///
/// Renaming an entity never changes its identifier, so chains of forwarding
/// entries are compared by `EntityId` rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Configuration held by a forwarding entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardingEntry {
    /// Name of the entry within its parent group
    pub name: String,

    /// Full name of the referenced entity; `None` means unconfigured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,

    /// Redirect permanently instead of showing the interstitial view
    #[serde(default)]
    pub forward_immediately: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ForwardingEntry {
    /// Create an empty, unconfigured entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name shown to users, e.g. `"docs Forwarder"`.
    pub fn display_name(&self) -> String {
        format!("{} Forwarder", self.name)
    }

    pub fn is_configured(&self) -> bool {
        self.target_name.is_some()
    }
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A leaf item that is not a forwarder
    Plain,

    /// A group whose children can be listed
    Group,

    /// A forwarding entry and its current configuration
    Forwarding(ForwardingEntry),
}

/// Snapshot of a namespace entity at the time it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,

    /// Slash-separated path from the root; empty for the root group
    pub full_name: String,

    /// Canonical URL of the entity, ending with `/`
    pub url: String,

    pub kind: EntityKind,
}

impl Entity {
    /// Last segment of the full name.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, EntityKind::Group)
    }

    pub fn as_forwarding(&self) -> Option<&ForwardingEntry> {
        match &self.kind {
            EntityKind::Forwarding(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_forwarding(&self) -> bool {
        self.as_forwarding().is_some()
    }

    /// Short label for the kind, used in listings and logs.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            EntityKind::Plain => "plain",
            EntityKind::Group => "group",
            EntityKind::Forwarding(_) => "forwarding",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(full_name: &str, kind: EntityKind) -> Entity {
        Entity {
            id: EntityId::new(),
            full_name: full_name.to_string(),
            url: format!("/{full_name}/"),
            kind,
        }
    }

    #[test]
    fn name_is_last_segment() {
        assert_eq!(entity("teamA/jobX", EntityKind::Plain).name(), "jobX");
        assert_eq!(entity("top", EntityKind::Group).name(), "top");
        assert_eq!(entity("", EntityKind::Group).name(), "");
    }

    #[test]
    fn display_name_marks_forwarder() {
        assert_eq!(ForwardingEntry::new("docs").display_name(), "docs Forwarder");
    }

    #[test]
    fn new_entry_is_unconfigured() {
        let entry = ForwardingEntry::new("alias");
        assert!(!entry.is_configured());
        assert!(!entry.forward_immediately);
        assert!(entity("alias", EntityKind::Forwarding(entry)).is_forwarding());
    }

    #[test]
    fn identifiers_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }
}
