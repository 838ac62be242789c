//! Path validation for managed files and directories.

use std::path::{Component, Path};

use crate::error::{ProvisionError, ValidationErrorKind};

/// Validate that a configured path is absolute and free of `..` segments.
///
/// Managed paths are written as root, so a relative path (resolved
/// against whatever directory the run started in) or a traversal segment
/// is rejected outright. Newlines are rejected too since paths are
/// rendered into unit files and init scripts.
pub fn validate_absolute_path(path: &Path) -> Result<&Path, ProvisionError> {
    if !path.is_absolute() {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::RelativePath {
                path: path.to_path_buf(),
            },
        });
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::PathTraversal {
                path: path.to_path_buf(),
            },
        });
    }

    if path.to_string_lossy().contains(['\n', '\r']) {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: "path".to_string(),
                message: format!("'{}' contains a line break", path.display()),
            },
        });
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_paths_pass() {
        assert!(validate_absolute_path(Path::new("/opt/prometheus")).is_ok());
        assert!(validate_absolute_path(Path::new("/etc/systemd/system/")).is_ok());
    }

    #[test]
    fn test_relative_path_rejected() {
        assert!(matches!(
            validate_absolute_path(Path::new("opt/prometheus")),
            Err(ProvisionError::Validation {
                kind: ValidationErrorKind::RelativePath { .. }
            })
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(matches!(
            validate_absolute_path(Path::new("/opt/../etc/shadow")),
            Err(ProvisionError::Validation {
                kind: ValidationErrorKind::PathTraversal { .. }
            })
        ));
    }

    #[test]
    fn test_line_break_rejected() {
        assert!(validate_absolute_path(Path::new("/opt/prom\nExecStartPre=/bin/sh")).is_err());
    }
}
