//! Configuration settings for the provisioner.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ProvisionError, ValidationErrorKind};
use crate::validation::{
    validate_absolute_path, validate_account_name, validate_checksum, validate_flag,
    validate_version,
};

use super::choices::{InitStyle, InstallMethod};
use super::overrides::apply_overrides;

/// Main configuration structure.
///
/// Every section is optional; an empty file converges both daemons with
/// the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
    pub journal: JournalConfig,
    pub platform: PlatformConfig,
    pub common: CommonConfig,
    pub prometheus: DaemonConfig,
    pub alertmanager: DaemonConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format ("pretty" or "json").
    pub format: String,
}

/// Locations of system directories the integrations write into.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Download cache and source checkouts.
    pub cache_dir: PathBuf,
    pub systemd_unit_dir: PathBuf,
    pub upstart_job_dir: PathBuf,
    pub init_script_dir: PathBuf,
    /// Root under which `sysconfig/` and `default/` environment files live.
    pub sysconfig_root: PathBuf,
    pub runit_sv_dir: PathBuf,
    pub runit_service_dir: PathBuf,
    /// Runlevel directory inspected for init.d start links on Debian.
    pub sysv_rc_dir: PathBuf,
}

/// Convergence journal configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

/// Platform overrides. Unset fields are detected from the host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Distribution id, e.g. "ubuntu", "amazon".
    pub id: Option<String>,
    /// Platform family: "debian", "rhel", "fedora" or "amazon".
    pub family: Option<String>,
    pub version: Option<String>,
    /// Release archive architecture, e.g. "amd64".
    pub arch: Option<String>,
    pub os_release_path: PathBuf,
}

/// Settings shared by every managed daemon.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    pub user: String,
    pub group: String,
    pub init_style: InitStyle,
    /// Group owning root-owned files such as init scripts.
    pub root_group: String,
}

/// Per-daemon settings. Unset options take the daemon's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub install_method: InstallMethod,
    pub version: Option<String>,
    /// SHA-256 of the release archive. Required unless the version is pinned.
    pub checksum: Option<String>,
    /// Full archive URL, replacing the GitHub releases URL.
    pub binary_url: Option<String>,
    /// Archive extension; empty means "tar.gz".
    pub file_extension: String,
    pub dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub binary: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub storage_path: Option<PathBuf>,
    /// Public URL rendered as the final `-web.external-url` flag.
    pub external_url: Option<String>,
    /// Extra daemon flags, `name = "value"` without leading dashes.
    pub flags: BTreeMap<String, String>,
    pub source_repository: Option<String>,
    /// Build command run inside the checkout for source installs.
    pub build_command: Option<Vec<String>>,
    /// Directory of `*.tera` templates replacing the built-in config template.
    pub config_template_dir: Option<PathBuf>,
    /// Template name for the main config, e.g. "prometheus.yml.tera".
    pub config_template: Option<String>,
    /// Free-form variables exposed to the config template as `vars`.
    pub template_vars: serde_json::Map<String, serde_json::Value>,
    /// Variables written to the init system's environment file.
    pub environment: BTreeMap<String, String>,
    /// Timeout for downloads, package installs and builds.
    pub install_timeout_seconds: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/var/cache/prometheus-provisioner"),
            systemd_unit_dir: PathBuf::from("/etc/systemd/system"),
            upstart_job_dir: PathBuf::from("/etc/init"),
            init_script_dir: PathBuf::from("/etc/init.d"),
            sysconfig_root: PathBuf::from("/etc"),
            runit_sv_dir: PathBuf::from("/etc/sv"),
            runit_service_dir: PathBuf::from("/etc/service"),
            sysv_rc_dir: PathBuf::from("/etc/rc2.d"),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("/var/log/prometheus-provisioner/journal.log"),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            id: None,
            family: None,
            version: None,
            arch: None,
            os_release_path: PathBuf::from("/etc/os-release"),
        }
    }
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            user: "prometheus".to_string(),
            group: "prometheus".to_string(),
            init_style: InitStyle::default(),
            root_group: "root".to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    /// Load settings from a TOML file, applying dotted overrides on top.
    pub fn load<P: AsRef<Path>>(path: P, overrides: &[String]) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProvisionError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content, overrides).map_err(|e| match e {
            ProvisionError::Config { message } => ProvisionError::config(format!(
                "{} (in '{}')",
                message,
                path.display()
            )),
            other => other,
        })
    }

    /// Parse settings from TOML text, applying dotted overrides on top.
    pub fn from_toml_str(content: &str, overrides: &[String]) -> Result<Self, ProvisionError> {
        let mut table: toml::Table = content
            .parse()
            .map_err(|e| ProvisionError::config(format!("Failed to parse config: {}", e)))?;

        apply_overrides(&mut table, overrides)?;

        let settings: Settings = toml::Value::Table(table)
            .try_into()
            .map_err(|e| ProvisionError::config(format!("Invalid config: {}", e)))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), ProvisionError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ProvisionError::config(format!(
                "Invalid log level '{}'. Valid levels: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ProvisionError::config(format!(
                "Invalid log format '{}'. Valid formats: {:?}",
                self.logging.format, valid_formats
            )));
        }

        validate_account_name(&self.common.user)?;
        validate_account_name(&self.common.group)?;
        validate_account_name(&self.common.root_group)?;

        let paths = &self.paths;
        for path in [
            &paths.cache_dir,
            &paths.systemd_unit_dir,
            &paths.upstart_job_dir,
            &paths.init_script_dir,
            &paths.sysconfig_root,
            &paths.runit_sv_dir,
            &paths.runit_service_dir,
            &paths.sysv_rc_dir,
            &self.journal.path,
        ] {
            validate_absolute_path(path)?;
        }

        for (name, daemon) in [
            ("prometheus", &self.prometheus),
            ("alertmanager", &self.alertmanager),
        ] {
            daemon.validate(name)?;
        }

        Ok(())
    }
}

impl DaemonConfig {
    fn validate(&self, name: &str) -> Result<(), ProvisionError> {
        if let Some(version) = &self.version {
            validate_version(version)?;
        }
        if let Some(checksum) = &self.checksum {
            validate_checksum(name, checksum)?;
        }

        for path in [
            &self.dir,
            &self.log_dir,
            &self.binary,
            &self.config_file,
            &self.storage_path,
            &self.config_template_dir,
        ]
        .into_iter()
        .flatten()
        {
            validate_absolute_path(path)?;
        }

        for (key, value) in &self.flags {
            validate_flag(key, value)?;
        }
        if let Some(url) = &self.external_url {
            validate_flag("web.external-url", url)?;
        }

        for (key, value) in &self.environment {
            let valid_key = key
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
                && key
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if !valid_key {
                return Err(ProvisionError::Validation {
                    kind: ValidationErrorKind::InvalidParameter {
                        param: format!("{}.environment.{}", name, key),
                        message: "must match [A-Z_][A-Z0-9_]*".to_string(),
                    },
                });
            }
            if value.contains(['\n', '\r', '"', '\\']) {
                return Err(ProvisionError::Validation {
                    kind: ValidationErrorKind::InvalidParameter {
                        param: format!("{}.environment.{}", name, key),
                        message: "cannot contain quotes, backslashes or line breaks".to_string(),
                    },
                });
            }
        }

        if !matches!(self.file_extension.as_str(), "" | "tar.gz" | "tgz" | "tar") {
            return Err(ProvisionError::config(format!(
                "{}: unsupported file_extension '{}' (expected tar.gz, tgz or tar)",
                name, self.file_extension
            )));
        }

        if let Some(command) = &self.build_command {
            if command.is_empty() {
                return Err(ProvisionError::config(format!(
                    "{}: build_command cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}
