//! Enumerated choices that select convergence branches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a daemon binary gets onto the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// Distro package manager.
    Package,
    /// Pre-built release archive, checksum verified.
    #[default]
    Binary,
    /// Git checkout compiled on the host.
    Source,
}

/// Which process supervisor manages the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitStyle {
    Runit,
    #[default]
    Systemd,
    Upstart,
    /// SysV init script under `/etc/init.d`.
    #[serde(rename = "init", alias = "legacy")]
    Legacy,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Package => "package",
            Self::Binary => "binary",
            Self::Source => "source",
        })
    }
}

impl fmt::Display for InitStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Runit => "runit",
            Self::Systemd => "systemd",
            Self::Upstart => "upstart",
            Self::Legacy => "init",
        })
    }
}
