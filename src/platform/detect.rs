//! Platform detection from `/etc/os-release`.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PlatformConfig;
use crate::error::ProvisionError;

/// Platform family, grouping distributions that share packaging and
/// file layout conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Debian,
    Rhel,
    Fedora,
    Amazon,
    Other(String),
}

impl PlatformFamily {
    /// Map a family name or distribution id onto a family.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "debian" | "ubuntu" | "linuxmint" | "raspbian" => Self::Debian,
            "rhel" | "redhat" | "centos" | "rocky" | "almalinux" | "ol" | "oracle"
            | "scientific" => Self::Rhel,
            "fedora" => Self::Fedora,
            "amazon" | "amzn" => Self::Amazon,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Debian => "debian",
            Self::Rhel => "rhel",
            Self::Fedora => "fedora",
            Self::Amazon => "amazon",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host a run converges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    /// Distribution id, e.g. "ubuntu", "amazon".
    pub id: String,
    pub version: String,
    pub family: PlatformFamily,
    /// Release archive architecture, e.g. "amd64".
    pub arch: String,
}

impl Platform {
    /// Build a platform from explicit values.
    pub fn new(id: &str, version: &str, family: PlatformFamily, arch: &str) -> Self {
        Self {
            id: id.to_string(),
            version: version.to_string(),
            family,
            arch: arch.to_string(),
        }
    }

    /// Detect the host platform, letting configured values win.
    ///
    /// A missing or unreadable os-release file is not an error as long as
    /// the configuration names the family.
    pub fn detect(config: &PlatformConfig) -> Result<Self, ProvisionError> {
        let fields = match std::fs::read_to_string(&config.os_release_path) {
            Ok(content) => parse_os_release(&content),
            Err(e) => {
                debug!(
                    path = %config.os_release_path.display(),
                    error = %e,
                    "os-release not readable"
                );
                HashMap::new()
            }
        };

        let id = config
            .id
            .clone()
            .or_else(|| fields.get("ID").cloned())
            .ok_or_else(|| {
                ProvisionError::config(format!(
                    "Cannot determine platform: '{}' has no ID and [platform].id is unset",
                    config.os_release_path.display()
                ))
            })?;

        let family = match &config.family {
            Some(family) => PlatformFamily::from_name(family),
            None => family_from_release(&id, fields.get("ID_LIKE").map(String::as_str)),
        };

        let version = config
            .version
            .clone()
            .or_else(|| fields.get("VERSION_ID").cloned())
            .unwrap_or_default();

        let arch = match &config.arch {
            Some(arch) => arch.clone(),
            None => release_arch(std::env::consts::ARCH),
        };

        if let PlatformFamily::Other(name) = &family {
            warn!(id = %id, family = %name, "Unrecognized platform family");
        }

        let platform = Self {
            id,
            version,
            family,
            arch,
        };
        debug!(platform = ?platform, "Platform detected");
        Ok(platform)
    }

    /// Release archive platform suffix, e.g. "linux-amd64".
    pub fn archive_platform(&self) -> String {
        format!("linux-{}", self.arch)
    }

    /// The package manager command for this family.
    pub fn package_manager(&self) -> &'static str {
        match self.family {
            PlatformFamily::Debian => "apt-get",
            PlatformFamily::Fedora => "dnf",
            PlatformFamily::Rhel | PlatformFamily::Amazon | PlatformFamily::Other(_) => "yum",
        }
    }

    pub fn is_amazon(&self) -> bool {
        self.family == PlatformFamily::Amazon || self.id == "amazon" || self.id == "amzn"
    }
}

/// Pick a family from the distribution id, falling back to `ID_LIKE`.
fn family_from_release(id: &str, id_like: Option<&str>) -> PlatformFamily {
    match PlatformFamily::from_name(id) {
        PlatformFamily::Other(_) => id_like
            .into_iter()
            .flat_map(str::split_whitespace)
            .map(PlatformFamily::from_name)
            .find(|f| !matches!(f, PlatformFamily::Other(_)))
            .unwrap_or_else(|| PlatformFamily::Other(id.to_string())),
        family => family,
    }
}

/// Map a Rust target architecture onto the release archive naming.
fn release_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "armv7",
        "x86" => "386",
        "powerpc64" => "ppc64le",
        "s390x" => "s390x",
        other => other,
    }
    .to_string()
}

/// Parse `KEY=value` lines of an os-release file, unquoting values.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
