//! Following chains of forwarding entries at request time.

use std::collections::HashSet;

use tracing::debug;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::resolver::NamespaceResolver;

/// Longest chain followed before giving up.
pub const DEFAULT_MAX_HOPS: usize = 64;

/// Where a chain of forwarding entries ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEnd {
    /// The chain ends at this non-forwarding entity
    Resolved(Entity),

    /// A hop names nothing, or a forwarder along the way is unconfigured
    Broken(String),

    /// The chain revisits an entry, or is longer than allowed
    Cycle,
}

/// Walk from `first_target` to the first entity that is not a forwarder.
///
/// `origin` is the entry the request started at; reaching it again counts as
/// a cycle. Every hop is resolved afresh.
pub fn follow<R>(origin: EntityId, first_target: &str, ns: &R, max_hops: usize) -> ChainEnd
where
    R: NamespaceResolver + ?Sized,
{
    let mut seen = HashSet::from([origin]);
    let mut name = first_target.to_string();

    for _ in 0..max_hops {
        let Some(entity) = ns.resolve(&name) else {
            return ChainEnd::Broken(name);
        };
        let EntityKind::Forwarding(entry) = &entity.kind else {
            return ChainEnd::Resolved(entity);
        };
        if !seen.insert(entity.id) {
            debug!("Chain from {} loops at {}", first_target, entity.full_name);
            return ChainEnd::Cycle;
        }
        match &entry.target_name {
            Some(next) => name = next.clone(),
            None => return ChainEnd::Broken(entity.full_name),
        }
    }

    debug!("Chain from {} exceeds {} hops", first_target, max_hops);
    ChainEnd::Cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ForwardingEntry;
    use crate::memory::MemoryNamespace;
    use crate::resolver::{EntityMode, NamespaceStore};

    fn forwarder(ns: &MemoryNamespace, name: &str, target: Option<&str>) -> Entity {
        let entity = ns.create("", name, EntityMode::Forwarding).unwrap();
        ns.commit_forwarding(
            entity.id,
            ForwardingEntry {
                target_name: target.map(str::to_string),
                ..ForwardingEntry::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn resolves_through_forwarders() {
        let ns = MemoryNamespace::default();
        let job = ns.create("", "job", EntityMode::Plain).unwrap();
        let start = forwarder(&ns, "start", Some("mid"));
        forwarder(&ns, "mid", Some("job"));

        assert_eq!(follow(start.id, "mid", &ns, DEFAULT_MAX_HOPS), ChainEnd::Resolved(job));
    }

    #[test]
    fn reports_broken_hops() {
        let ns = MemoryNamespace::default();
        let start = forwarder(&ns, "start", Some("mid"));
        forwarder(&ns, "mid", None);

        assert_eq!(
            follow(start.id, "mid", &ns, DEFAULT_MAX_HOPS),
            ChainEnd::Broken("mid".to_string())
        );
        assert_eq!(
            follow(start.id, "gone", &ns, DEFAULT_MAX_HOPS),
            ChainEnd::Broken("gone".to_string())
        );
    }

    #[test]
    fn detects_loops_back_to_origin() {
        let ns = MemoryNamespace::default();
        let start = forwarder(&ns, "start", Some("mid"));
        forwarder(&ns, "mid", Some("start"));

        assert_eq!(follow(start.id, "mid", &ns, DEFAULT_MAX_HOPS), ChainEnd::Cycle);
    }

    #[test]
    fn hop_limit_ends_long_chains() {
        let ns = MemoryNamespace::default();
        ns.create("", "job", EntityMode::Plain).unwrap();
        let start = forwarder(&ns, "f0", Some("f1"));
        forwarder(&ns, "f1", Some("f2"));
        forwarder(&ns, "f2", Some("job"));

        assert_eq!(follow(start.id, "f1", &ns, 1), ChainEnd::Cycle);
        assert!(matches!(follow(start.id, "f1", &ns, 3), ChainEnd::Resolved(_)));
    }
}
