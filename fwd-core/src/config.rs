//! Validated configuration updates and renames.
//!
//! Every check runs before the store is touched; a rejected update leaves the
//! entry exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::{Entity, ForwardingEntry};
use crate::error::{ForwardError, Result};
use crate::permission::{self, Authorizer, Permission};
use crate::resolver::{check_good_name, NamespaceStore};
use crate::validate::validate_target;

/// Submitted configuration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSubmission {
    /// Requested name; a different value asks for a rename
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Full name of the new target; blank clears the target
    #[serde(default)]
    pub referred_item_name: Option<String>,

    #[serde(default)]
    pub forward_immediately: bool,
}

/// Result of a successful configuration update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// The configuration was stored
    Saved(Entity),

    /// The configuration was stored and the form asked for a new name
    RenameRequested { entity: Entity, new_name: String },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_forwarding<S: NamespaceStore + ?Sized>(ns: &S, full_name: &str) -> Result<Entity> {
    let entity = ns
        .resolve(full_name)
        .ok_or_else(|| ForwardError::NotFound(full_name.to_string()))?;
    if !entity.is_forwarding() {
        return Err(ForwardError::NotForwarding(full_name.to_string()));
    }
    Ok(entity)
}

/// Validate and store a configuration form for the entry at `entry_full_name`.
pub fn apply_configuration<S, A>(
    ns: &S,
    authz: &A,
    entry_full_name: &str,
    submission: ConfigSubmission,
) -> Result<ConfigOutcome>
where
    S: NamespaceStore + ?Sized,
    A: Authorizer + ?Sized,
{
    permission::check(authz, Permission::Configure)?;
    let entity = resolve_forwarding(ns, entry_full_name)?;

    let target_name = non_blank(submission.referred_item_name);
    if let Some(target) = target_name.as_deref() {
        validate_target(target, &entity, ns)?;
    }

    let new_name = non_blank(submission.name).filter(|name| name != entity.name());
    if let Some(name) = new_name.as_deref() {
        check_good_name(name)?;
    }

    let entry = ForwardingEntry {
        name: entity.name().to_string(),
        target_name,
        forward_immediately: submission.forward_immediately,
        description: non_blank(submission.description),
    };
    let saved = ns.commit_forwarding(entity.id, entry)?;
    info!("Saved configuration of {}", saved.full_name);

    Ok(match new_name {
        Some(new_name) => ConfigOutcome::RenameRequested {
            entity: saved,
            new_name,
        },
        None => ConfigOutcome::Saved(saved),
    })
}

/// Rename the forwarding entry at `entry_full_name`.
pub fn rename_entry<S, A>(ns: &S, authz: &A, entry_full_name: &str, new_name: &str) -> Result<Entity>
where
    S: NamespaceStore + ?Sized,
    A: Authorizer + ?Sized,
{
    permission::check_rename(authz)?;
    check_good_name(new_name)?;
    let entity = resolve_forwarding(ns, entry_full_name)?;
    ns.rename(entity.id, new_name)
}
