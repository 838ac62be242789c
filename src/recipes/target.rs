//! Resolved per-daemon convergence targets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::json;

use crate::config::{InstallMethod, Settings};
use crate::error::ProvisionError;
use crate::platform::Platform;
use crate::resources::ServiceAction;
use crate::services::DaemonDefinition;

/// Separator between `ExecStart` lines: a continuation plus indentation.
const LINE_CONTINUATION: &str = " \\\n    ";

/// Default timeout for downloads, package installs and builds.
const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 600;

/// Everything needed to converge one daemon, resolved from the settings,
/// the daemon's definition and the host platform. Immutable for a run.
#[derive(Debug, Clone)]
pub struct ServiceTarget {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub install_method: InstallMethod,
    pub binary_path: PathBuf,
    pub config_path: PathBuf,
    pub storage_path: PathBuf,
    /// Daemon flags without leading dashes, rendered in key order.
    pub flags: BTreeMap<String, String>,
    pub user: String,
    pub group: String,
    pub dir: PathBuf,
    pub log_dir: PathBuf,
    pub external_url: Option<String>,
    pub checksum: Option<String>,
    pub file_extension: String,
    pub archive_platform: String,
    pub binary_url: String,
    pub source_repository: String,
    pub build_command: Vec<String>,
    pub config_template_dir: Option<PathBuf>,
    pub config_template: String,
    /// Defaults merged with user `template_vars`; exposed as `vars`.
    pub template_vars: serde_json::Value,
    pub environment: BTreeMap<String, String>,
    pub package_name: String,
    pub config_change_action: ServiceAction,
    pub install_timeout: Duration,
}

impl ServiceTarget {
    pub fn resolve(
        settings: &Settings,
        definition: &dyn DaemonDefinition,
        platform: &Platform,
    ) -> Result<Self, ProvisionError> {
        let name = definition.name();
        let daemon = match name {
            "prometheus" => &settings.prometheus,
            "alertmanager" => &settings.alertmanager,
            other => {
                return Err(ProvisionError::config(format!(
                    "No settings section for daemon '{}'",
                    other
                )))
            }
        };

        let version = daemon
            .version
            .clone()
            .unwrap_or_else(|| definition.default_version().to_string());
        let dir = daemon
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/opt/{}", name)));
        let log_dir = daemon
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("/var/log/{}", name)));
        let config_path = daemon
            .config_file
            .clone()
            .unwrap_or_else(|| dir.join(format!("{}.yml", name)));
        let storage_path = daemon
            .storage_path
            .clone()
            .unwrap_or_else(|| dir.join("data"));

        let binary_path = match (&daemon.binary, daemon.install_method) {
            (Some(binary), _) => binary.clone(),
            (None, InstallMethod::Package) => {
                PathBuf::from("/usr/bin").join(definition.package_binary(platform))
            }
            (None, InstallMethod::Binary | InstallMethod::Source) => dir.join(name),
        };

        let mut flags = definition.default_flags(&config_path, &storage_path);
        flags.extend(daemon.flags.clone());

        let archive_platform = platform.archive_platform();
        let file_extension = if daemon.file_extension.is_empty() {
            "tar.gz".to_string()
        } else {
            daemon.file_extension.clone()
        };

        let checksum = daemon.checksum.clone().or_else(|| {
            definition
                .pinned_checksum(&version, &archive_platform)
                .map(str::to_string)
        });
        if daemon.install_method == InstallMethod::Binary && checksum.is_none() {
            return Err(ProvisionError::config(format!(
                "{} {} for {} has no pinned checksum; set [{}].checksum",
                name, version, archive_platform, name
            )));
        }

        let binary_url = daemon.binary_url.clone().unwrap_or_else(|| {
            format!(
                "{}/releases/download/v{}/{}-{}.{}.{}",
                definition.upstream_repository(),
                version,
                name,
                version,
                archive_platform,
                file_extension
            )
        });

        let mut template_vars = definition.default_template_vars();
        if let Some(vars) = template_vars.as_object_mut() {
            vars.extend(daemon.template_vars.clone());
        }

        Ok(Self {
            name: name.to_string(),
            display_name: definition.display_name().to_string(),
            version,
            install_method: daemon.install_method,
            binary_path,
            config_path,
            storage_path,
            flags,
            user: settings.common.user.clone(),
            group: settings.common.group.clone(),
            dir,
            log_dir,
            external_url: daemon
                .external_url
                .clone()
                .or_else(|| definition.external_url_fallback(settings)),
            checksum,
            file_extension,
            archive_platform,
            binary_url,
            source_repository: daemon
                .source_repository
                .clone()
                .unwrap_or_else(|| format!("{}.git", definition.upstream_repository())),
            build_command: daemon
                .build_command
                .clone()
                .unwrap_or_else(|| vec!["make".to_string(), "build".to_string()]),
            config_template_dir: daemon.config_template_dir.clone(),
            config_template: daemon
                .config_template
                .clone()
                .unwrap_or_else(|| format!("{}.yml.tera", name)),
            template_vars,
            environment: daemon.environment.clone(),
            package_name: definition.package_name(platform).to_string(),
            config_change_action: definition.config_change_action(),
            install_timeout: Duration::from_secs(
                daemon
                    .install_timeout_seconds
                    .unwrap_or(DEFAULT_INSTALL_TIMEOUT_SECS),
            ),
        })
    }

    /// `{name}-{version}`, the archive and checkout name in the cache.
    pub fn release_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log", self.name))
    }

    fn command_words(&self) -> Vec<String> {
        let mut words = vec![self.binary_path.display().to_string()];
        words.extend(self.flags.iter().map(|(key, value)| format!("-{}={}", key, value)));
        if let Some(url) = &self.external_url {
            words.push(format!("-web.external-url={}", url));
        }
        words
    }

    /// The daemon command line: binary, then one `-key=value` per flag,
    /// then the external URL, each on its own continued line.
    pub fn exec_command(&self) -> String {
        self.command_words().join(LINE_CONTINUATION)
    }

    /// The daemon command line quoted for `sh`.
    pub fn shell_command(&self) -> String {
        self.command_words()
            .iter()
            .map(|word| shell_quote(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Variables for the main configuration template.
    pub fn config_context(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "version": self.version,
            "user": self.user,
            "group": self.group,
            "dir": self.dir,
            "config_path": self.config_path,
            "storage_path": self.storage_path,
            "flags": self.flags,
            "vars": self.template_vars,
        })
    }

    /// Variables for init-system artifacts.
    pub fn init_context(&self, env_file: Option<&Path>) -> serde_json::Value {
        json!({
            "name": self.name,
            "display_name": self.display_name,
            "user": self.user,
            "group": self.group,
            "binary": self.binary_path,
            "dir": self.dir,
            "log_dir": self.log_dir,
            "log_file": self.log_file(),
            "env_file": env_file,
            "exec_command": self.exec_command(),
            "shell_command": self.shell_command(),
            "environment": self.environment,
        })
    }
}

/// Single-quote `word` for POSIX sh.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
