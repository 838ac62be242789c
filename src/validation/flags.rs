//! Daemon command-line flag validation.
//!
//! Flags are rendered verbatim into `ExecStart=` lines, upstart `exec`
//! stanzas and init scripts. A line break in a value would let a flag
//! smuggle extra directives into those files.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Validate a single `key=value` flag.
pub fn validate_flag(key: &str, value: &str) -> Result<(), ProvisionError> {
    let invalid = |message: &str| ProvisionError::Validation {
        kind: ValidationErrorKind::InvalidFlag {
            key: key.to_string(),
            message: message.to_string(),
        },
    };

    if key.is_empty() {
        return Err(invalid("flag name cannot be empty"));
    }
    if key.starts_with('-') {
        return Err(invalid("flag name must not include leading dashes"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(invalid("flag name may only contain letters, digits, '.', '-' and '_'"));
    }
    if value.contains(['\n', '\r']) {
        return Err(invalid("flag value contains a line break"));
    }
    if value.ends_with('\\') {
        return Err(invalid("flag value must not end with a line continuation"));
    }

    Ok(())
}
