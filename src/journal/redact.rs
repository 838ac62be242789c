//! Credential redaction for journal entries.
//!
//! Release mirrors and git remotes may carry `user:password@` in their
//! URLs; those never reach the journal.

use serde_json::{Map, Value};

/// Keys whose values are always redacted.
const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "credential", "api_key", "auth"];

const REDACTED: &str = "[REDACTED]";

/// Replace the userinfo part of every URL in `text` with `[REDACTED]`.
pub fn redact_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(scheme_end) = rest.find("://") {
        let authority_start = scheme_end + 3;
        out.push_str(&rest[..authority_start]);
        rest = &rest[authority_start..];

        let authority_end = rest
            .find(|c: char| c == '/' || c == '?' || c == '#' || c.is_whitespace() || c == '\'')
            .unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => {
                out.push_str(REDACTED);
                rest = &rest[at..];
            }
            None => {
                out.push_str(&rest[..authority_end]);
                rest = &rest[authority_end..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Redact a JSON detail value: sensitive keys are blanked and URLs in
/// every string lose their credentials.
pub fn redact_detail(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                let key_lower = key.to_lowercase();
                if SENSITIVE_KEYS.iter().any(|&s| key_lower.contains(s)) {
                    redacted.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_detail(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(redact_detail).collect()),
        Value::String(s) => Value::String(redact_urls(s)),
        _ => value.clone(),
    }
}
