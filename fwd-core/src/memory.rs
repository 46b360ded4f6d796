//! In-memory namespace.
//!
//! `MemoryNamespace` is the reference host used by the service and by tests.
//! It keeps a tree of nodes keyed by [`EntityId`] behind a single lock, so
//! each call observes a consistent tree while separate calls may see
//! different states.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::{Entity, EntityId, EntityKind, ForwardingEntry};
use crate::error::{ForwardError, Result};
use crate::resolver::{check_good_name, child_full_name, EntityMode, NamespaceResolver, NamespaceStore};

/// Serialized form of a namespace, used for seeding and snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSeed {
    #[serde(default)]
    pub items: Vec<SeedItem>,
}

/// One item of a [`NamespaceSeed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SeedItem {
    Plain {
        name: String,
    },
    Group {
        name: String,
        #[serde(default)]
        items: Vec<SeedItem>,
    },
    Forwarding {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default, rename = "forwardImmediately")]
        forward_immediately: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<EntityId>,
    kind: EntityKind,
    children: Vec<EntityId>,
}

#[derive(Debug)]
struct Tree {
    root: EntityId,
    nodes: HashMap<EntityId, Node>,
}

impl Tree {
    fn new() -> Self {
        let root = EntityId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: String::new(),
                parent: None,
                kind: EntityKind::Group,
                children: Vec::new(),
            },
        );
        Self { root, nodes }
    }

    fn lookup(&self, full_name: &str) -> Option<EntityId> {
        if full_name.is_empty() {
            return Some(self.root);
        }
        let mut current = self.root;
        for segment in full_name.split('/') {
            if segment.is_empty() {
                return None;
            }
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    fn child_named(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|node| node.name == name))
    }

    fn full_name(&self, id: EntityId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(&id)) {
            if node.parent.is_some() {
                segments.push(node.name.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        segments.join("/")
    }

    fn insert(&mut self, parent: EntityId, name: &str, kind: EntityKind) -> Result<EntityId> {
        check_good_name(name)?;
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or_else(|| ForwardError::NotFound(self.full_name(parent)))?;
        if !matches!(parent_node.kind, EntityKind::Group) {
            return Err(ForwardError::NotFound(format!(
                "{} is not a group",
                self.full_name(parent)
            )));
        }
        if self.child_named(parent, name).is_some() {
            return Err(ForwardError::AlreadyExists(child_full_name(
                &self.full_name(parent),
                name,
            )));
        }

        let id = EntityId::new();
        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                parent: Some(parent),
                kind,
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    fn remove(&mut self, id: EntityId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
        for child in node.children {
            self.remove(child);
        }
    }

    fn seed_items(&mut self, parent: EntityId, items: &[SeedItem]) -> Result<()> {
        for item in items {
            match item {
                SeedItem::Plain { name } => {
                    self.insert(parent, name, EntityKind::Plain)?;
                }
                SeedItem::Group { name, items } => {
                    let id = self.insert(parent, name, EntityKind::Group)?;
                    self.seed_items(id, items)?;
                }
                SeedItem::Forwarding {
                    name,
                    target,
                    forward_immediately,
                    description,
                } => {
                    let entry = ForwardingEntry {
                        name: name.clone(),
                        target_name: target.clone(),
                        forward_immediately: *forward_immediately,
                        description: description.clone(),
                    };
                    self.insert(parent, name, EntityKind::Forwarding(entry))?;
                }
            }
        }
        Ok(())
    }

    fn export_items(&self, parent: EntityId) -> Vec<SeedItem> {
        let Some(node) = self.nodes.get(&parent) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|id| {
                let child = self.nodes.get(id)?;
                let item = match &child.kind {
                    EntityKind::Plain => SeedItem::Plain {
                        name: child.name.clone(),
                    },
                    EntityKind::Group => SeedItem::Group {
                        name: child.name.clone(),
                        items: self.export_items(*id),
                    },
                    EntityKind::Forwarding(entry) => SeedItem::Forwarding {
                        name: child.name.clone(),
                        target: entry.target_name.clone(),
                        forward_immediately: entry.forward_immediately,
                        description: entry.description.clone(),
                    },
                };
                Some(item)
            })
            .collect()
    }
}

/// A namespace held entirely in memory.
#[derive(Debug)]
pub struct MemoryNamespace {
    /// Prefix of every entity URL, always ending with `/`
    url_prefix: String,

    tree: RwLock<Tree>,
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryNamespace {
    /// Create an empty namespace whose URLs start with `url_prefix`.
    pub fn new(url_prefix: &str) -> Self {
        let url_prefix = if url_prefix.ends_with('/') {
            url_prefix.to_string()
        } else {
            format!("{url_prefix}/")
        };
        Self {
            url_prefix,
            tree: RwLock::new(Tree::new()),
        }
    }

    /// Build a namespace from a seed.
    ///
    /// Targets are stored as given; broken or cyclic references in a seed are
    /// left for dispatch to handle.
    pub fn from_seed(url_prefix: &str, seed: &NamespaceSeed) -> Result<Self> {
        let ns = Self::new(url_prefix);
        {
            let mut tree = ns.tree.write();
            let root = tree.root;
            tree.seed_items(root, &seed.items)?;
        }
        Ok(ns)
    }

    /// Load a seed file and build a namespace from it.
    pub fn load(url_prefix: &str, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let seed: NamespaceSeed = serde_json::from_str(&content)?;
        info!("Loaded namespace from {}", path.display());
        Self::from_seed(url_prefix, &seed)
    }

    /// Export the current tree.
    pub fn snapshot(&self) -> NamespaceSeed {
        let tree = self.tree.read();
        NamespaceSeed {
            items: tree.export_items(tree.root),
        }
    }

    /// Write a snapshot to `path`, replacing the file in one step.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!("Saved namespace to {}", path.display());
        Ok(())
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    fn entity(&self, tree: &Tree, id: EntityId) -> Option<Entity> {
        let node = tree.nodes.get(&id)?;
        let full_name = tree.full_name(id);
        let url = if full_name.is_empty() {
            self.url_prefix.clone()
        } else {
            let encoded: Vec<_> = full_name.split('/').map(urlencoding::encode).collect();
            format!("{}{}/", self.url_prefix, encoded.join("/"))
        };
        let kind = match &node.kind {
            EntityKind::Forwarding(entry) => EntityKind::Forwarding(ForwardingEntry {
                name: node.name.clone(),
                ..entry.clone()
            }),
            other => other.clone(),
        };
        Some(Entity {
            id,
            full_name,
            url,
            kind,
        })
    }
}

impl NamespaceResolver for MemoryNamespace {
    fn resolve(&self, full_name: &str) -> Option<Entity> {
        let tree = self.tree.read();
        let id = tree.lookup(full_name)?;
        self.entity(&tree, id)
    }

    fn root(&self) -> Entity {
        let tree = self.tree.read();
        let root = tree.root;
        Entity {
            id: root,
            full_name: String::new(),
            url: self.url_prefix.clone(),
            kind: EntityKind::Group,
        }
    }

    fn children(&self, group: &Entity) -> Vec<Entity> {
        let tree = self.tree.read();
        let Some(node) = tree.nodes.get(&group.id) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|id| self.entity(&tree, *id))
            .collect()
    }
}

impl NamespaceStore for MemoryNamespace {
    fn create(&self, parent: &str, name: &str, mode: EntityMode) -> Result<Entity> {
        let mut tree = self.tree.write();
        let parent_id = tree
            .lookup(parent)
            .ok_or_else(|| ForwardError::NotFound(parent.to_string()))?;
        let kind = match mode {
            EntityMode::Plain => EntityKind::Plain,
            EntityMode::Group => EntityKind::Group,
            EntityMode::Forwarding => EntityKind::Forwarding(ForwardingEntry::new(name)),
        };
        let id = tree.insert(parent_id, name, kind)?;
        let entity = self
            .entity(&tree, id)
            .ok_or_else(|| ForwardError::NotFound(child_full_name(parent, name)))?;
        info!("Created {} {}", entity.kind_label(), entity.full_name);
        Ok(entity)
    }

    fn delete(&self, full_name: &str) -> Result<()> {
        if full_name.is_empty() {
            return Err(ForwardError::InvalidName("the root cannot be deleted".to_string()));
        }
        let mut tree = self.tree.write();
        let id = tree
            .lookup(full_name)
            .ok_or_else(|| ForwardError::NotFound(full_name.to_string()))?;
        tree.remove(id);
        info!("Deleted {}", full_name);
        Ok(())
    }

    fn rename(&self, id: EntityId, new_name: &str) -> Result<Entity> {
        check_good_name(new_name)?;
        let mut tree = self.tree.write();
        let old_full_name = tree.full_name(id);
        let parent = match tree.nodes.get(&id) {
            Some(node) => node
                .parent
                .ok_or_else(|| ForwardError::InvalidName("the root cannot be renamed".to_string()))?,
            None => return Err(ForwardError::NotFound(id.to_string())),
        };
        if let Some(existing) = tree.child_named(parent, new_name) {
            if existing != id {
                return Err(ForwardError::AlreadyExists(child_full_name(
                    &tree.full_name(parent),
                    new_name,
                )));
            }
        }
        if let Some(node) = tree.nodes.get_mut(&id) {
            node.name = new_name.to_string();
            if let EntityKind::Forwarding(entry) = &mut node.kind {
                entry.name = new_name.to_string();
            }
        }
        let entity = self
            .entity(&tree, id)
            .ok_or_else(|| ForwardError::NotFound(id.to_string()))?;
        info!("Renamed {} to {}", old_full_name, entity.full_name);
        Ok(entity)
    }

    fn commit_forwarding(&self, id: EntityId, entry: ForwardingEntry) -> Result<Entity> {
        let mut tree = self.tree.write();
        let full_name = tree.full_name(id);
        let node = tree
            .nodes
            .get_mut(&id)
            .ok_or_else(|| ForwardError::NotFound(id.to_string()))?;
        match &mut node.kind {
            EntityKind::Forwarding(current) => {
                *current = ForwardingEntry {
                    name: node.name.clone(),
                    ..entry
                };
            }
            _ => return Err(ForwardError::NotForwarding(full_name)),
        }
        self.entity(&tree, id)
            .ok_or_else(|| ForwardError::NotFound(full_name))
    }
}
