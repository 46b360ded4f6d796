//! Permission checks delegated to the host.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ForwardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Configure,
    Create,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::Configure,
        Permission::Create,
        Permission::Delete,
    ];
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Read => "READ",
            Permission::Configure => "CONFIGURE",
            Permission::Create => "CREATE",
            Permission::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A permission name that is not one of read, configure, create or delete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission '{0}'")]
pub struct ParsePermissionError(pub String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Permission::Read),
            "configure" => Ok(Permission::Configure),
            "create" => Ok(Permission::Create),
            "delete" => Ok(Permission::Delete),
            other => Err(ParsePermissionError(other.to_string())),
        }
    }
}

/// Answers whether the current caller holds a permission.
pub trait Authorizer: Send + Sync {
    fn has_permission(&self, permission: Permission) -> bool;
}

/// Fail with `PermissionDenied` unless `permission` is held.
pub fn check<A: Authorizer + ?Sized>(authz: &A, permission: Permission) -> Result<()> {
    if authz.has_permission(permission) {
        Ok(())
    } else {
        Err(ForwardError::PermissionDenied(permission))
    }
}

/// Renaming is a delete followed by a create, so either `Configure` or both
/// `Create` and `Delete` will do.
pub fn check_rename<A: Authorizer + ?Sized>(authz: &A) -> Result<()> {
    if authz.has_permission(Permission::Configure) {
        return Ok(());
    }
    check(authz, Permission::Create)?;
    check(authz, Permission::Delete)
}

/// Fixed set of granted permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSet {
    granted: HashSet<Permission>,
}

impl GrantSet {
    pub fn new(granted: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::new(Permission::ALL)
    }

    pub fn none() -> Self {
        Self::new([])
    }
}

impl Default for GrantSet {
    fn default() -> Self {
        Self::all()
    }
}

impl Authorizer for GrantSet {
    fn has_permission(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }
}
