//! Prometheus server definition.

use std::collections::BTreeMap;
use std::path::Path;

use crate::platform::Platform;
use crate::resources::ServiceAction;

use super::traits::DaemonDefinition;

/// The Prometheus monitoring server.
pub struct PrometheusDaemon;

impl DaemonDefinition for PrometheusDaemon {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    fn display_name(&self) -> &'static str {
        "Prometheus"
    }

    fn default_version(&self) -> &'static str {
        "2.2.1"
    }

    fn pinned_checksum(&self, version: &str, archive_platform: &str) -> Option<&'static str> {
        match (version, archive_platform) {
            ("2.2.1", "linux-amd64") => {
                Some("ec1798dbda1636f49d709c3931078dc17eafef76c480b67751aa09828396cf31")
            }
            _ => None,
        }
    }

    fn package_name(&self, _platform: &Platform) -> &'static str {
        "prometheus"
    }

    /// Prometheus re-reads its configuration on SIGHUP.
    fn config_change_action(&self) -> ServiceAction {
        ServiceAction::Reload
    }

    fn default_flags(&self, config_path: &Path, storage_path: &Path) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("config.file".to_string(), config_path.display().to_string()),
            (
                "storage.tsdb.path".to_string(),
                storage_path.display().to_string(),
            ),
        ])
    }

    fn default_template_vars(&self) -> serde_json::Value {
        serde_json::json!({
            "scrape_interval": "15s",
            "evaluation_interval": "15s",
            "job_name": "prometheus",
            "scrape_targets": ["localhost:9090"],
            "alertmanager_targets": [],
            "rule_files": [],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformFamily;
    use std::path::PathBuf;

    #[test]
    fn test_prometheus_definition() {
        let daemon = PrometheusDaemon;
        assert_eq!(daemon.name(), "prometheus");
        assert_eq!(daemon.config_change_action(), ServiceAction::Reload);
        assert_eq!(
            daemon.upstream_repository(),
            "https://github.com/prometheus/prometheus"
        );
    }

    #[test]
    fn test_pinned_checksum_only_for_pinned_release() {
        let daemon = PrometheusDaemon;
        assert!(daemon.pinned_checksum("2.2.1", "linux-amd64").is_some());
        assert!(daemon.pinned_checksum("2.3.0", "linux-amd64").is_none());
        assert!(daemon.pinned_checksum("2.2.1", "linux-arm64").is_none());
    }

    #[test]
    fn test_package_names() {
        let platform = Platform::new("ubuntu", "16.04", PlatformFamily::Debian, "amd64");
        assert_eq!(PrometheusDaemon.package_name(&platform), "prometheus");
        assert_eq!(PrometheusDaemon.package_binary(&platform), "prometheus");
    }

    #[test]
    fn test_default_flags() {
        let flags = PrometheusDaemon.default_flags(
            &PathBuf::from("/opt/prometheus/prometheus.yml"),
            &PathBuf::from("/opt/prometheus/data"),
        );
        assert_eq!(flags["config.file"], "/opt/prometheus/prometheus.yml");
        assert_eq!(flags["storage.tsdb.path"], "/opt/prometheus/data");
    }
}
