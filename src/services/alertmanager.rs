//! Alertmanager definition.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Settings;
use crate::platform::{Platform, PlatformFamily};
use crate::resources::ServiceAction;

use super::traits::DaemonDefinition;

/// The Prometheus Alertmanager.
pub struct AlertmanagerDaemon;

impl DaemonDefinition for AlertmanagerDaemon {
    fn name(&self) -> &'static str {
        "alertmanager"
    }

    fn display_name(&self) -> &'static str {
        "Prometheus Alertmanager"
    }

    fn default_version(&self) -> &'static str {
        "0.14.0"
    }

    fn pinned_checksum(&self, version: &str, archive_platform: &str) -> Option<&'static str> {
        match (version, archive_platform) {
            ("0.14.0", "linux-amd64") => {
                Some("caddbbbe3ef8545c6cefb32f9a11207ae18dcc788e8d0fb19659d88c58d14b37")
            }
            _ => None,
        }
    }

    fn package_name(&self, platform: &Platform) -> &'static str {
        match platform.family {
            PlatformFamily::Debian => "prometheus-alertmanager",
            _ => "alertmanager",
        }
    }

    fn package_binary(&self, platform: &Platform) -> &'static str {
        self.package_name(platform)
    }

    fn config_change_action(&self) -> ServiceAction {
        ServiceAction::Restart
    }

    fn default_flags(&self, config_path: &Path, storage_path: &Path) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("config.file".to_string(), config_path.display().to_string()),
            ("storage.path".to_string(), storage_path.display().to_string()),
        ])
    }

    /// Prometheus is told where Alertmanager lives through its
    /// `alertmanager.url` flag; Alertmanager advertises the same URL.
    fn external_url_fallback(&self, settings: &Settings) -> Option<String> {
        settings.prometheus.flags.get("alertmanager.url").cloned()
    }

    fn default_template_vars(&self) -> serde_json::Value {
        serde_json::json!({
            "resolve_timeout": "5m",
            "receiver": "default",
            "group_by": ["alertname"],
            "group_wait": "30s",
            "group_interval": "5m",
            "repeat_interval": "4h",
            "webhook_url": "",
        })
    }
}
