//! System user and group name validation.
//!
//! Names end up as arguments to `useradd`/`groupadd` and inside
//! rendered unit files, so they are held to the portable POSIX subset.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Maximum length for system account names (Linux standard).
const MAX_NAME_LENGTH: usize = 32;

/// Validate a system user or group name.
///
/// Rules:
/// - Must not be empty or exceed 32 characters
/// - Must start with a lowercase letter or underscore
/// - May only contain lowercase letters, digits, underscores, and hyphens
pub fn validate_account_name(name: &str) -> Result<&str, ProvisionError> {
    let invalid = || ProvisionError::Validation {
        kind: ValidationErrorKind::InvalidName {
            name: name.to_string(),
        },
    };

    let first = name.chars().next().ok_or_else(invalid)?;
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid());
    }
    if !first.is_ascii_lowercase() && first != '_' {
        return Err(invalid());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(invalid());
    }

    Ok(name)
}
