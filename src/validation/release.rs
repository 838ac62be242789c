//! Release version and checksum validation.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Validate a release version such as `2.2.1` or `0.15.0-rc.1`.
///
/// The version is substituted into download URLs, git tags and cache
/// paths, so only digits, dots and a simple pre-release suffix are
/// accepted.
pub fn validate_version(version: &str) -> Result<&str, ProvisionError> {
    let invalid = || ProvisionError::Validation {
        kind: ValidationErrorKind::InvalidVersion {
            version: version.to_string(),
        },
    };

    let (core, pre) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() < 2 || parts.len() > 4 {
        return Err(invalid());
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid());
    }

    if let Some(pre) = pre {
        if pre.is_empty()
            || !pre
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(invalid());
        }
    }

    Ok(version)
}

/// Validate a SHA-256 checksum: exactly 64 hex characters.
///
/// Returns the checksum lowercased for comparison with computed digests.
pub fn validate_checksum(target: &str, checksum: &str) -> Result<String, ProvisionError> {
    if checksum.len() != 64 || !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::InvalidChecksum {
                target: target.to_string(),
            },
        });
    }
    Ok(checksum.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_versions() {
        assert!(validate_version("2.2.1").is_ok());
        assert!(validate_version("0.14.0").is_ok());
        assert!(validate_version("2.0").is_ok());
        assert!(validate_version("0.15.0-rc.1").is_ok());
    }

    #[test]
    fn test_invalid_versions() {
        assert!(validate_version("").is_err());
        assert!(validate_version("v2.2.1").is_err());
        assert!(validate_version("2").is_err());
        assert!(validate_version("2..1").is_err());
        assert!(validate_version("2.2.1/../../x").is_err());
        assert!(validate_version("2.2.1-").is_err());
    }

    #[test]
    fn test_pinned_checksums_are_valid() {
        assert!(validate_checksum(
            "prometheus",
            "ec1798dbda1636f49d709c3931078dc17eafef76c480b67751aa09828396cf31"
        )
        .is_ok());
        assert!(validate_checksum(
            "alertmanager",
            "caddbbbe3ef8545c6cefb32f9a11207ae18dcc788e8d0fb19659d88c58d14b37"
        )
        .is_ok());
    }

    #[test]
    fn test_short_checksum_rejected() {
        // 63 characters
        let short = "caddbbbe3ef8545c6cefb32f9a11207ae18dcc788e8d0fb19659d88c58d14b3";
        assert!(validate_checksum("alertmanager", short).is_err());
        assert!(validate_checksum("alertmanager", &"g".repeat(64)).is_err());
    }

    #[test]
    fn test_checksum_lowercased() {
        let upper = "EC1798DBDA1636F49D709C3931078DC17EAFEF76C480B67751AA09828396CF31";
        assert_eq!(
            validate_checksum("prometheus", upper).unwrap(),
            upper.to_ascii_lowercase()
        );
    }
}
