//! Request path routing for the service.
//!
//! This module maps a request path onto the namespace: the longest prefix of
//! the path that names an entity selects that entity, and whatever follows is
//! left for the handler as an action name or a sub-path.

use fwd_core::{child_full_name, Entity, NamespaceResolver};

/// An entity addressed by a request path, plus the rest of the path.
#[derive(Debug, Clone)]
pub struct ItemRoute {
    /// The entity the path resolved to
    pub entity: Entity,

    /// Percent-decoded remainder of the path after the entity
    pub rest: String,
}

impl ItemRoute {
    /// Whether the request is for the entity itself.
    pub fn is_index(&self) -> bool {
        self.rest.trim_end_matches('/').is_empty()
    }

    /// The remainder as a single action name, e.g. `configSubmit`.
    pub fn action(&self) -> Option<&str> {
        let rest = self.rest.trim_end_matches('/');
        (!rest.is_empty() && !rest.contains('/')).then_some(rest)
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Strip the namespace's URL prefix from a request path.
///
/// Returns `None` when the path lies outside the prefix.
pub fn strip_url_prefix<'a>(url_prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(url_prefix.trim_end_matches('/'))?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Resolve a request path against the namespace.
///
/// Walking stops at the first segment that does not name a child, and right
/// after a forwarding entry so everything below it is left as its sub-path.
pub fn route<R>(ns: &R, path: &str) -> ItemRoute
where
    R: NamespaceResolver + ?Sized,
{
    let segments: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(decode)
        .collect();

    let mut entity = ns.root();
    let mut consumed = 0;
    for segment in &segments {
        if segment.is_empty() || entity.is_forwarding() {
            break;
        }
        match ns.resolve(&child_full_name(&entity.full_name, segment)) {
            Some(child) => {
                entity = child;
                consumed += 1;
            }
            None => break,
        }
    }

    ItemRoute {
        entity,
        rest: segments[consumed..].join("/"),
    }
}
