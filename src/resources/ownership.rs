//! Owner, group and mode of managed paths.

use std::fs;
use std::os::unix::fs::{chown, MetadataExt, PermissionsExt};
use std::path::Path;

use nix::unistd::{Gid, Group, Uid, User};
use tracing::debug;

use crate::error::{ProvisionError, ValidationErrorKind};

/// Desired owner, group and permission bits of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub user: String,
    pub group: String,
    pub mode: u32,
}

impl Ownership {
    pub fn new(user: &str, group: &str, mode: u32) -> Self {
        Self {
            user: user.to_string(),
            group: group.to_string(),
            mode,
        }
    }

    /// Look up the numeric ids. `None` when either account does not exist.
    fn lookup(&self) -> Result<Option<(Uid, Gid)>, ProvisionError> {
        let user = User::from_name(&self.user).map_err(|e| {
            ProvisionError::execution(format!("Failed to look up user '{}': {}", self.user, e))
        })?;
        let group = Group::from_name(&self.group).map_err(|e| {
            ProvisionError::execution(format!("Failed to look up group '{}': {}", self.group, e))
        })?;
        Ok(user.zip(group).map(|(u, g)| (u.uid, g.gid)))
    }

    fn resolve(&self) -> Result<(Uid, Gid), ProvisionError> {
        self.lookup()?.ok_or_else(|| ProvisionError::Validation {
            kind: ValidationErrorKind::InvalidName {
                name: format!("{}:{}", self.user, self.group),
            },
        })
    }

    /// Whether `path` differs from this ownership. Accounts that do not
    /// exist yet always count as a difference.
    pub fn differs(&self, path: &Path) -> Result<bool, ProvisionError> {
        let metadata = fs::metadata(path)?;
        let mode_differs = metadata.permissions().mode() & 0o7777 != self.mode;

        Ok(match self.lookup()? {
            Some((uid, gid)) => {
                mode_differs || metadata.uid() != uid.as_raw() || metadata.gid() != gid.as_raw()
            }
            None => true,
        })
    }

    /// Apply owner, group and mode to `path`.
    pub fn apply(&self, path: &Path) -> Result<(), ProvisionError> {
        let (uid, gid) = self.resolve()?;
        let metadata = fs::metadata(path)?;

        if metadata.uid() != uid.as_raw() || metadata.gid() != gid.as_raw() {
            debug!(path = %path.display(), user = %self.user, group = %self.group, "Changing ownership");
            chown(path, Some(uid.as_raw()), Some(gid.as_raw())).map_err(|e| {
                ProvisionError::execution(format!(
                    "Failed to set ownership of '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }

        if metadata.permissions().mode() & 0o7777 != self.mode {
            fs::set_permissions(path, fs::Permissions::from_mode(self.mode)).map_err(|e| {
                ProvisionError::execution(format!(
                    "Failed to set permissions of '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}
