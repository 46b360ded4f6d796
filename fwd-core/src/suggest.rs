//! Target name autocompletion.
//!
//! Suggestions come from one depth-first walk of the namespace that only
//! opens groups on the path the user is typing. Forwarding entries are never
//! suggested.

use tracing::debug;

use crate::entity::Entity;
use crate::resolver::NamespaceResolver;

/// Bounds on a single autocomplete walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestLimits {
    /// Deepest group level that is opened
    pub max_depth: usize,

    /// Entities examined before the walk stops
    pub max_visits: usize,
}

impl Default for SuggestLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_visits: 10_000,
        }
    }
}

/// Lazy sequence of suggested full names.
///
/// Each call to [`suggest`] starts a new walk; nothing is cached between
/// calls.
pub struct Suggestions<'a, R: ?Sized> {
    prefix: String,
    ns: &'a R,
    limits: SuggestLimits,
    stack: Vec<(Entity, usize)>,
    visits: usize,
}

impl<'a, R> Suggestions<'a, R>
where
    R: NamespaceResolver + ?Sized,
{
    fn new(prefix: &str, ns: &'a R, limits: SuggestLimits) -> Self {
        let mut suggestions = Self {
            prefix: prefix.to_string(),
            ns,
            limits,
            stack: Vec::new(),
            visits: 0,
        };
        let root = ns.root();
        suggestions.open_group(&root, 0);
        suggestions
    }

    /// Push the group's children if the typed prefix lies under it.
    fn open_group(&mut self, group: &Entity, depth: usize) {
        if !self.prefix.starts_with(group.full_name.as_str()) {
            return;
        }
        if depth >= self.limits.max_depth {
            debug!("Not opening {}: depth limit {} reached", group.full_name, self.limits.max_depth);
            return;
        }
        debug!("Visiting item group {}", group.full_name);
        let children = self.ns.children(group);
        self.stack
            .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
}

impl<R> Iterator for Suggestions<'_, R>
where
    R: NamespaceResolver + ?Sized,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some((entity, depth)) = self.stack.pop() {
            self.visits += 1;
            if self.visits > self.limits.max_visits {
                debug!("Stopping suggestions after {} visits", self.limits.max_visits);
                self.stack.clear();
                return None;
            }

            debug!("Visiting {} checking if it starts with {}", entity.full_name, self.prefix);
            if entity.full_name.starts_with(self.prefix.as_str()) {
                if entity.is_forwarding() {
                    debug!("Skipping {} as it's a forwarder", entity.full_name);
                    continue;
                }
                if entity.is_group() {
                    self.open_group(&entity, depth);
                }
                return Some(entity.full_name);
            }

            // The user typed past this group's name: look inside it anyway.
            if entity.is_group() && self.prefix.starts_with(entity.full_name.as_str()) {
                self.open_group(&entity, depth);
            }
        }
        None
    }
}

/// Suggest full names starting with `prefix`, with default limits.
pub fn suggest<'a, R>(prefix: &str, ns: &'a R) -> Suggestions<'a, R>
where
    R: NamespaceResolver + ?Sized,
{
    suggest_with_limits(prefix, ns, SuggestLimits::default())
}

pub fn suggest_with_limits<'a, R>(prefix: &str, ns: &'a R, limits: SuggestLimits) -> Suggestions<'a, R>
where
    R: NamespaceResolver + ?Sized,
{
    Suggestions::new(prefix, ns, limits)
}
