//! Reference validation for forwarding targets.
//!
//! A target is acceptable when it is not the entry itself, when following the
//! chain of forwarding entries starting at it never comes back to the entry,
//! and when the chain ends at an entity that currently exists.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::entity::{Entity, EntityKind};
use crate::resolver::NamespaceResolver;

/// Why a candidate target was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationReason {
    SelfReference,
    CycleDetected,
    TargetNotFound,
}

impl ValidationReason {
    /// Message shown to the operator.
    pub fn message(&self) -> &'static str {
        match self {
            ValidationReason::SelfReference => "Cannot use own name as forwarded item name.",
            ValidationReason::CycleDetected => "Detected infinite loop of forwarded items.",
            ValidationReason::TargetNotFound => {
                "No item with that name found. You always need to specify the full name."
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::SelfReference => "SELF_REFERENCE",
            ValidationReason::CycleDetected => "CYCLE_DETECTED",
            ValidationReason::TargetNotFound => "TARGET_NOT_FOUND",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected target reference.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub reason: ValidationReason,
    pub message: String,
}

impl From<ValidationReason> for ValidationError {
    fn from(reason: ValidationReason) -> Self {
        Self {
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// Outcome of a form-style check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CheckResult {
    Ok,
    Error {
        reason: ValidationReason,
        message: String,
    },
}

/// Decide whether `candidate` may become the target of `editing`.
///
/// `candidate` must be non-blank; callers treat a blank value as "no
/// configuration" before getting here. The namespace is read as it is now, so
/// two concurrent edits can each pass while together closing a loop.
pub fn validate_target<R>(candidate: &str, editing: &Entity, ns: &R) -> Result<(), ValidationError>
where
    R: NamespaceResolver + ?Sized,
{
    debug!("Checking forwarded item name {} for {}", candidate, editing.full_name);

    if candidate == editing.name() || candidate == editing.full_name {
        return Err(ValidationReason::SelfReference.into());
    }

    let mut seen = HashSet::new();
    let mut current = ns.resolve(candidate);
    while let Some(Entity {
        id,
        kind: EntityKind::Forwarding(entry),
        ..
    }) = current
    {
        if id == editing.id || !seen.insert(id) {
            return Err(ValidationReason::CycleDetected.into());
        }
        current = entry.target_name.as_deref().and_then(|name| ns.resolve(name));
    }

    match current {
        Some(_) => Ok(()),
        None => Err(ValidationReason::TargetNotFound.into()),
    }
}

/// Form check used while an operator is typing.
///
/// A blank value has nothing to validate and is reported as ok.
pub fn check_target<R>(value: &str, editing: &Entity, ns: &R) -> CheckResult
where
    R: NamespaceResolver + ?Sized,
{
    if value.trim().is_empty() {
        return CheckResult::Ok;
    }
    match validate_target(value, editing, ns) {
        Ok(()) => CheckResult::Ok,
        Err(err) => CheckResult::Error {
            reason: err.reason,
            message: err.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entity::ForwardingEntry;
    use crate::memory::MemoryNamespace;
    use crate::resolver::{EntityMode, NamespaceStore};

    fn ns_with_job() -> MemoryNamespace {
        let ns = MemoryNamespace::default();
        ns.create("", "teamA", EntityMode::Group).unwrap();
        ns.create("teamA", "jobX", EntityMode::Plain).unwrap();
        ns
    }

    fn point(ns: &MemoryNamespace, entry: &str, target: &str) {
        let id = ns.resolve(entry).unwrap().id;
        ns.commit_forwarding(
            id,
            ForwardingEntry {
                target_name: Some(target.to_string()),
                ..ForwardingEntry::default()
            },
        )
        .unwrap();
    }

    fn reason(result: Result<(), ValidationError>) -> Option<ValidationReason> {
        result.err().map(|e| e.reason)
    }

    #[test]
    fn plain_target_is_accepted() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        assert_eq!(validate_target("teamA/jobX", &entry, &ns), Ok(()));
        assert_eq!(validate_target("teamA", &entry, &ns), Ok(()));
    }

    #[test]
    fn own_name_is_a_self_reference() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        assert_eq!(
            reason(validate_target("alias", &entry, &ns)),
            Some(ValidationReason::SelfReference)
        );
    }

    #[test]
    fn nested_entry_own_name_is_a_self_reference() {
        let ns = ns_with_job();
        let entry = ns.create("teamA", "alias", EntityMode::Forwarding).unwrap();
        assert_eq!(
            reason(validate_target("alias", &entry, &ns)),
            Some(ValidationReason::SelfReference)
        );

        // A top-level item of the same name does not make it a valid target.
        ns.create("", "alias", EntityMode::Plain).unwrap();
        assert_eq!(
            reason(validate_target("alias", &entry, &ns)),
            Some(ValidationReason::SelfReference)
        );
        assert_eq!(
            reason(validate_target("teamA/alias", &entry, &ns)),
            Some(ValidationReason::SelfReference)
        );
    }

    #[test]
    fn missing_target_is_rejected() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        let err = validate_target("teamA/nope", &entry, &ns).unwrap_err();
        assert_eq!(err.reason, ValidationReason::TargetNotFound);
        assert_eq!(err.message, ValidationReason::TargetNotFound.message());
    }

    #[test]
    fn chain_ending_at_a_real_item_is_accepted() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        ns.create("", "hop1", EntityMode::Forwarding).unwrap();
        ns.create("", "hop2", EntityMode::Forwarding).unwrap();
        point(&ns, "hop1", "hop2");
        point(&ns, "hop2", "teamA/jobX");

        assert_eq!(validate_target("hop1", &entry, &ns), Ok(()));
    }

    #[test]
    fn chain_ending_at_unconfigured_forwarder_is_not_found() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        ns.create("", "empty", EntityMode::Forwarding).unwrap();
        assert_eq!(
            reason(validate_target("empty", &entry, &ns)),
            Some(ValidationReason::TargetNotFound)
        );
    }

    #[test]
    fn cycle_is_detected_after_a_rename_mid_chain() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        ns.create("", "hop", EntityMode::Forwarding).unwrap();
        point(&ns, "hop", "alias");

        // The chain still reaches the entry after it is renamed.
        let entry = ns.rename(entry.id, "renamed").unwrap();
        point(&ns, "hop", "renamed");

        assert_eq!(
            reason(validate_target("hop", &entry, &ns)),
            Some(ValidationReason::CycleDetected)
        );
    }

    #[test]
    fn preexisting_loop_elsewhere_terminates() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        ns.create("", "a", EntityMode::Forwarding).unwrap();
        ns.create("", "b", EntityMode::Forwarding).unwrap();
        point(&ns, "a", "b");
        point(&ns, "b", "a");

        assert_eq!(
            reason(validate_target("a", &entry, &ns)),
            Some(ValidationReason::CycleDetected)
        );
    }

    #[test]
    fn blank_check_value_is_ok() {
        let ns = ns_with_job();
        let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
        assert_eq!(check_target("  ", &entry, &ns), CheckResult::Ok);
        assert!(matches!(
            check_target("alias", &entry, &ns),
            CheckResult::Error {
                reason: ValidationReason::SelfReference,
                ..
            }
        ));
    }

    #[test]
    fn reasons_serialize_as_codes() {
        let json = serde_json::to_string(&ValidationReason::CycleDetected).unwrap();
        assert_eq!(json, "\"CYCLE_DETECTED\"");
        assert_eq!(ValidationReason::TargetNotFound.to_string(), "TARGET_NOT_FOUND");
    }

    proptest! {
        #[test]
        fn self_reference_for_any_name(name in "[A-Za-z0-9_-][A-Za-z0-9_. -]{0,15}[A-Za-z0-9_-]") {
            prop_assume!(name != "." && name != "..");
            let ns = MemoryNamespace::default();
            let entry = ns.create("", &name, EntityMode::Forwarding).unwrap();
            prop_assert_eq!(
                reason(validate_target(&name, &entry, &ns)),
                Some(ValidationReason::SelfReference)
            );
        }

        #[test]
        fn closing_any_chain_is_a_cycle(n in 1usize..8) {
            // E1 -> E2 -> ... -> EN, then close the loop with EN -> E1.
            // With a single entry that is its own name, caught before the walk.
            let ns = ns_with_job();
            let names: Vec<String> = (1..=n).map(|i| format!("e{i}")).collect();
            for name in &names {
                ns.create("", name, EntityMode::Forwarding).unwrap();
            }
            for pair in names.windows(2) {
                point(&ns, &pair[0], &pair[1]);
            }
            let last = ns.resolve(&names[n - 1]).unwrap();
            let outcome = validate_target(&names[0], &last, &ns);
            let expected = if n == 1 {
                ValidationReason::SelfReference
            } else {
                ValidationReason::CycleDetected
            };
            prop_assert_eq!(reason(outcome), Some(expected));
        }

        #[test]
        fn validation_is_repeatable(target in prop_oneof![
            Just("teamA/jobX"), Just("teamA"), Just("missing"), Just("alias"), Just("hop"),
        ]) {
            let ns = ns_with_job();
            let entry = ns.create("", "alias", EntityMode::Forwarding).unwrap();
            ns.create("", "hop", EntityMode::Forwarding).unwrap();
            point(&ns, "hop", "alias");
            let first = validate_target(target, &entry, &ns);
            for _ in 0..3 {
                prop_assert_eq!(&validate_target(target, &entry, &ns), &first);
            }
        }
    }
}
