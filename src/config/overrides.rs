//! Dotted attribute overrides (`-o prometheus.version=2.3.0`).
//!
//! Overrides are applied to the parsed TOML tree before it is
//! deserialized, so they take precedence over the file and the file over
//! built-in defaults. Key segments containing dots are double-quoted:
//! `prometheus.flags."storage.tsdb.path"=/data`.

use toml::{Table, Value};

use crate::error::ProvisionError;

/// Apply `key=value` overrides onto a TOML table.
pub fn apply_overrides(table: &mut Table, overrides: &[String]) -> Result<(), ProvisionError> {
    for raw in overrides {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            ProvisionError::config(format!("Override '{}' must have the form key=value", raw))
        })?;
        let path = split_key_path(key.trim())?;
        let value = match parse_value(value.trim()) {
            Value::Integer(_) | Value::Boolean(_) | Value::Datetime(_) if expects_string(&path) => {
                Value::String(value.trim().to_string())
            }
            parsed => parsed,
        };
        insert_at(table, &path, value)
            .map_err(|message| ProvisionError::config(format!("Override '{}': {}", raw, message)))?;
    }
    Ok(())
}

/// Split a dotted key path, honoring double-quoted segments.
fn split_key_path(key: &str) -> Result<Vec<String>, ProvisionError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in key.chars() {
        match c {
            '"' => quoted = !quoted,
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if quoted {
        return Err(ProvisionError::config(format!("Unterminated quote in key '{}'", key)));
    }
    segments.push(current);

    if segments.iter().any(|s| s.is_empty()) {
        return Err(ProvisionError::config(format!("Empty segment in key '{}'", key)));
    }
    Ok(segments)
}

/// Interpret the right-hand side as a TOML value, falling back to a string.
///
/// Floats stay strings: `version=2.2` is a version, not a number.
fn parse_value(raw: &str) -> Value {
    format!("v = {}", raw)
        .parse::<Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .filter(|v| !matches!(v, Value::Float(_)))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Settings keys that only take strings, wherever they appear.
const STRING_KEYS: &[&str] = &[
    "level",
    "format",
    "id",
    "family",
    "version",
    "arch",
    "user",
    "group",
    "root_group",
    "checksum",
    "binary_url",
    "file_extension",
    "external_url",
    "source_repository",
    "config_template",
];

/// Whether the value at `path` is a string, so `flags."x"=20` stays `"20"`.
fn expects_string(path: &[String]) -> bool {
    let parent_is_map = path.len() >= 2
        && matches!(path[path.len() - 2].as_str(), "flags" | "environment");
    parent_is_map || path.last().is_some_and(|key| STRING_KEYS.contains(&key.as_str()))
}

fn insert_at(table: &mut Table, path: &[String], value: Value) -> Result<(), String> {
    let (last, parents) = path.split_last().ok_or("empty key")?;
    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Table(Table::new()));
        current = match entry {
            Value::Table(t) => t,
            _ => return Err(format!("'{}' is not a table", segment)),
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_override_creates_tables() {
        let mut table = Table::new();
        apply_overrides(&mut table, &["prometheus.version=2.3.0".to_string()]).unwrap();
        assert_eq!(table["prometheus"]["version"].as_str(), Some("2.3.0"));
    }

    #[test]
    fn test_quoted_segment_keeps_dots() {
        let mut table = Table::new();
        apply_overrides(
            &mut table,
            &["prometheus.flags.\"alertmanager.url\"=http://0.0.0.0:8080".to_string()],
        )
        .unwrap();
        assert_eq!(
            table["prometheus"]["flags"]["alertmanager.url"].as_str(),
            Some("http://0.0.0.0:8080")
        );
    }

    #[test]
    fn test_typed_values() {
        let mut table = Table::new();
        apply_overrides(
            &mut table,
            &["journal.enabled=false".to_string(), "name=\"quoted\"".to_string()],
        )
        .unwrap();
        assert_eq!(table["journal"]["enabled"].as_bool(), Some(false));
        assert_eq!(table["name"].as_str(), Some("quoted"));
    }

    #[test]
    fn test_float_like_values_stay_strings() {
        let mut table = Table::new();
        apply_overrides(&mut table, &["alertmanager.version=0.14".to_string()]).unwrap();
        assert_eq!(table["alertmanager"]["version"].as_str(), Some("0.14"));
    }

    #[test]
    fn test_string_maps_keep_scalars_as_strings() {
        let mut table = Table::new();
        apply_overrides(
            &mut table,
            &[
                "prometheus.flags.\"query.max-concurrency\"=20".to_string(),
                "prometheus.flags.\"web.enable-lifecycle\"=true".to_string(),
                "alertmanager.environment.GOMAXPROCS=4".to_string(),
                "common.user=1001".to_string(),
                "journal.enabled=false".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(table["prometheus"]["flags"]["query.max-concurrency"].as_str(), Some("20"));
        assert_eq!(table["prometheus"]["flags"]["web.enable-lifecycle"].as_str(), Some("true"));
        assert_eq!(table["alertmanager"]["environment"]["GOMAXPROCS"].as_str(), Some("4"));
        assert_eq!(table["common"]["user"].as_str(), Some("1001"));
        assert_eq!(table["journal"]["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn test_flag_overrides_load_into_settings() {
        let settings = crate::config::Settings::from_toml_str(
            "",
            &[
                "prometheus.flags.\"query.max-concurrency\"=20".to_string(),
                "prometheus.flags.\"web.enable-lifecycle\"=true".to_string(),
                "journal.enabled=false".to_string(),
            ],
        )
        .unwrap();
        let flags = &settings.prometheus.flags;
        assert_eq!(flags.get("query.max-concurrency").map(String::as_str), Some("20"));
        assert_eq!(flags.get("web.enable-lifecycle").map(String::as_str), Some("true"));
        assert!(!settings.journal.enabled);
    }

    #[test]
    fn test_override_replaces_file_value() {
        let mut table: Table = "[common]\nuser = \"prometheus\"\n".parse().unwrap();
        apply_overrides(&mut table, &["common.user=prom_user".to_string()]).unwrap();
        assert_eq!(table["common"]["user"].as_str(), Some("prom_user"));
    }

    #[test]
    fn test_malformed_overrides() {
        let mut table = Table::new();
        assert!(apply_overrides(&mut table, &["novalue".to_string()]).is_err());
        assert!(apply_overrides(&mut table, &["a..b=1".to_string()]).is_err());
        assert!(apply_overrides(&mut table, &["a.\"b=1".to_string()]).is_err());

        let mut table: Table = "common = 1".parse().unwrap();
        assert!(apply_overrides(&mut table, &["common.user=x".to_string()]).is_err());
    }
}
