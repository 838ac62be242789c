//! Daemon definition trait.
//!
//! Defines the interface for daemons the provisioner can manage.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Settings;
use crate::platform::Platform;
use crate::resources::ServiceAction;

/// Describes a manageable daemon.
///
/// Provides the per-daemon facts a convergence needs beyond what the
/// settings carry: release pins, package names, default flags and the
/// reaction to a configuration change.
///
/// # Example
///
/// ```ignore
/// pub struct PushgatewayDaemon;
///
/// impl DaemonDefinition for PushgatewayDaemon {
///     fn name(&self) -> &'static str { "pushgateway" }
///     fn display_name(&self) -> &'static str { "Prometheus Pushgateway" }
///     fn default_version(&self) -> &'static str { "0.5.1" }
///     fn package_name(&self, _: &Platform) -> &'static str { "prometheus-pushgateway" }
///     fn config_change_action(&self) -> ServiceAction { ServiceAction::Restart }
///     fn default_flags(&self, _: &Path, storage: &Path) -> BTreeMap<String, String> {
///         BTreeMap::from([("persistence.file".into(), storage.display().to_string())])
///     }
/// }
/// ```
pub trait DaemonDefinition: Send + Sync {
    /// Daemon identifier; also the binary, service and archive name.
    fn name(&self) -> &'static str;

    /// Human-readable name used in unit descriptions.
    fn display_name(&self) -> &'static str;

    /// Release installed when the settings name no version.
    fn default_version(&self) -> &'static str;

    /// SHA-256 of the release archive pinned for `version`, if any.
    fn pinned_checksum(&self, _version: &str, _archive_platform: &str) -> Option<&'static str> {
        None
    }

    /// Distro package providing the daemon.
    fn package_name(&self, platform: &Platform) -> &'static str;

    /// Binary installed by the distro package.
    fn package_binary(&self, platform: &Platform) -> &'static str {
        self.package_name(platform)
    }

    /// What the running service should do when its config file changes.
    fn config_change_action(&self) -> ServiceAction;

    /// Flags every deployment passes, before user flags are merged in.
    fn default_flags(&self, config_path: &Path, storage_path: &Path) -> BTreeMap<String, String>;

    /// Default variables for the config template. User-supplied
    /// `template_vars` are merged on top.
    fn default_template_vars(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    /// External URL used when the daemon's own settings name none.
    fn external_url_fallback(&self, _settings: &Settings) -> Option<String> {
        None
    }

    /// Upstream repository, used for release downloads and source builds.
    fn upstream_repository(&self) -> String {
        format!("https://github.com/prometheus/{}", self.name())
    }
}
