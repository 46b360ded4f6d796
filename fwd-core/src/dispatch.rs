//! Request-time dispatch for forwarding entries.
//!
//! Dispatch turns an entry plus an optional sub-path into a
//! [`RedirectDecision`]. The transport decides how each decision is sent; this
//! module never touches HTTP.

use tracing::{debug, warn};

use crate::chain::{self, ChainEnd};
use crate::entity::{Entity, EntityKind};
use crate::resolver::NamespaceResolver;

/// What to answer for a request that reached a forwarding entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Redirect permanently to `url`
    PermanentRedirect { url: String },

    /// Show an interstitial that follows through to `target_url`
    DeferredView { target_url: String },

    /// No usable target; show the configuration prompt
    NotConfigured,
}

/// Join a target's URL and a requested sub-path.
///
/// The base gets exactly one trailing `/` and a single leading `/` is removed
/// from the sub-path, so the two never double up.
pub fn target_url(base_url: &str, sub_path: Option<&str>) -> String {
    let mut url = base_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    if let Some(path) = sub_path {
        url.push_str(path.strip_prefix('/').unwrap_or(path));
    }
    url
}

/// Percent-encode each segment of a decoded sub-path, keeping the `/`
/// separators.
pub fn encode_sub_path(sub_path: &str) -> String {
    sub_path
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Where to send a request for `<entry>/<rest_of_path>`.
///
/// The rest of the path is carried to the entry's index page as the
/// percent-encoded `path` query parameter.
pub fn dynamic_redirect_location(entry_url: &str, rest_of_path: &str) -> String {
    format!(
        "{}?path={}",
        target_url(entry_url, None),
        urlencoding::encode(rest_of_path)
    )
}

/// Decide how to answer a request for `entry`.
///
/// The target is resolved now, and a chain through other forwarders is
/// followed to its end. A missing target or a chain that no longer ends at a
/// real entity yields [`RedirectDecision::NotConfigured`].
pub fn compute_redirect<R>(entry: &Entity, sub_path: Option<&str>, ns: &R) -> RedirectDecision
where
    R: NamespaceResolver + ?Sized,
{
    let Some(config) = entry.as_forwarding() else {
        return RedirectDecision::NotConfigured;
    };
    let Some(target_name) = config.target_name.as_deref() else {
        return RedirectDecision::NotConfigured;
    };
    let Some(target) = ns.resolve(target_name) else {
        debug!("Target {} of {} does not exist", target_name, entry.full_name);
        return RedirectDecision::NotConfigured;
    };

    if let EntityKind::Forwarding(_) = target.kind {
        match chain::follow(entry.id, target_name, ns, chain::DEFAULT_MAX_HOPS) {
            ChainEnd::Resolved(end) => {
                debug!("Chain from {} ends at {}", entry.full_name, end.full_name);
            }
            ChainEnd::Broken(at) => {
                warn!("Forwarding chain from {} is broken at {}", entry.full_name, at);
                return RedirectDecision::NotConfigured;
            }
            ChainEnd::Cycle => {
                warn!("Forwarding chain from {} loops", entry.full_name);
                return RedirectDecision::NotConfigured;
            }
        }
    }

    let url = target_url(&target.url, sub_path);
    if config.forward_immediately {
        RedirectDecision::PermanentRedirect { url }
    } else {
        RedirectDecision::DeferredView { target_url: url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ForwardingEntry;
    use crate::memory::MemoryNamespace;
    use crate::resolver::{EntityMode, NamespaceStore};

    fn setup(immediately: bool, target: Option<&str>) -> (MemoryNamespace, Entity) {
        let ns = MemoryNamespace::default();
        ns.create("", "teamA", EntityMode::Group).unwrap();
        ns.create("teamA", "jobX", EntityMode::Plain).unwrap();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        let entry = ns
            .commit_forwarding(
                entry.id,
                ForwardingEntry {
                    target_name: target.map(str::to_string),
                    forward_immediately: immediately,
                    ..ForwardingEntry::default()
                },
            )
            .unwrap();
        (ns, entry)
    }

    fn job_url(ns: &MemoryNamespace) -> String {
        ns.resolve("teamA/jobX").unwrap().url
    }

    #[test]
    fn immediate_forward_redirects_to_target() {
        let (ns, entry) = setup(true, Some("teamA/jobX"));
        let url = target_url(&job_url(&ns), None);
        assert_eq!(url, "/teamA/jobX/");
        assert_eq!(
            compute_redirect(&entry, Some(""), &ns),
            RedirectDecision::PermanentRedirect { url: url.clone() }
        );
        assert_eq!(
            compute_redirect(&entry, None, &ns),
            RedirectDecision::PermanentRedirect { url }
        );
    }

    #[test]
    fn sub_path_is_appended_once() {
        let (ns, entry) = setup(true, Some("teamA/jobX"));
        let expected = RedirectDecision::PermanentRedirect {
            url: format!("{}build/5", job_url(&ns)),
        };
        assert_eq!(compute_redirect(&entry, Some("build/5"), &ns), expected);
        assert_eq!(compute_redirect(&entry, Some("/build/5"), &ns), expected);
    }

    #[test]
    fn deferred_view_carries_the_same_url() {
        let (ns, entry) = setup(false, Some("teamA/jobX"));
        assert_eq!(
            compute_redirect(&entry, Some("a/b/c"), &ns),
            RedirectDecision::DeferredView {
                target_url: "/teamA/jobX/a/b/c".to_string()
            }
        );
    }

    #[test]
    fn unconfigured_regardless_of_flag() {
        for immediately in [true, false] {
            let (ns, entry) = setup(immediately, None);
            assert_eq!(compute_redirect(&entry, None, &ns), RedirectDecision::NotConfigured);
        }
    }

    #[test]
    fn deleted_target_degrades_to_not_configured() {
        for immediately in [true, false] {
            let (ns, entry) = setup(immediately, Some("teamA/jobX"));
            ns.delete("teamA/jobX").unwrap();
            assert_eq!(
                compute_redirect(&entry, Some("x"), &ns),
                RedirectDecision::NotConfigured
            );
        }
    }

    #[test]
    fn forwards_to_a_forwarder_that_resolves() {
        let (ns, entry) = setup(true, Some("hop"));
        let hop = ns.create("", "hop", EntityMode::Forwarding).unwrap();
        ns.commit_forwarding(
            hop.id,
            ForwardingEntry {
                target_name: Some("teamA/jobX".to_string()),
                ..ForwardingEntry::default()
            },
        )
        .unwrap();

        assert_eq!(
            compute_redirect(&entry, None, &ns),
            RedirectDecision::PermanentRedirect {
                url: "/hop/".to_string()
            }
        );
    }

    #[test]
    fn loop_created_by_concurrent_edits_is_not_followed() {
        let (ns, entry) = setup(true, Some("hop"));
        let hop = ns.create("", "hop", EntityMode::Forwarding).unwrap();
        ns.commit_forwarding(
            hop.id,
            ForwardingEntry {
                target_name: Some("alias".to_string()),
                ..ForwardingEntry::default()
            },
        )
        .unwrap();

        assert_eq!(compute_redirect(&entry, None, &ns), RedirectDecision::NotConfigured);
    }

    #[test]
    fn dynamic_requests_carry_the_path_encoded() {
        assert_eq!(
            dynamic_redirect_location("/alias/", "a/b c"),
            "/alias/?path=a%2Fb%20c"
        );
        assert_eq!(dynamic_redirect_location("/alias", ""), "/alias/?path=");
    }

    #[test]
    fn sub_paths_are_encoded_per_segment() {
        assert_eq!(encode_sub_path("build/5"), "build/5");
        assert_eq!(encode_sub_path("/a b/c?d"), "/a%20b/c%3Fd");
    }

    #[test]
    fn target_url_normalizes_separators() {
        assert_eq!(target_url("/x", None), "/x/");
        assert_eq!(target_url("/x/", Some("/y")), "/x/y");
        assert_eq!(target_url("/x/", Some("//y")), "/x//y");
    }
}
