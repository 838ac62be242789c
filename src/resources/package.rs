//! Distro packages.
//!
//! Installs packages through the host's package manager: apt-get on the
//! Debian family, dnf on Fedora and yum on RHEL and Amazon Linux.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ProvisionError;
use crate::executor::{tail_output, CommandSpec, SubprocessResult};
use crate::platform::PlatformFamily;

use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// apt-get's exit code when a package cannot be located.
const APT_NOT_FOUND_EXIT: i32 = 100;

/// An installed distro package.
pub struct Package {
    name: String,
    timeout: Duration,
}

impl Package {
    pub fn new(name: &str, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            timeout,
        }
    }

    fn is_installed(&self, ctx: &RunContext) -> bool {
        let spec = match ctx.platform.family {
            PlatformFamily::Debian => CommandSpec::new("dpkg-query")
                .args(["-W", "-f=${Status}", &self.name]),
            _ => CommandSpec::new("rpm").args(["-q", &self.name]),
        }
        .timeout(ctx.command_timeout);

        match ctx.runner.run(&spec) {
            Ok(result) => match ctx.platform.family {
                PlatformFamily::Debian => {
                    result.success && result.stdout.contains("install ok installed")
                }
                _ => result.success,
            },
            Err(e) => {
                debug!(package = %self.name, error = %e, "Package query failed");
                false
            }
        }
    }

    fn install_command(&self, ctx: &RunContext) -> CommandSpec {
        let manager = ctx.platform.package_manager();
        let spec = match ctx.platform.family {
            PlatformFamily::Debian => CommandSpec::new(manager)
                .args([
                    "install",
                    "-y",
                    "--no-install-recommends",
                    "-o",
                    "Dpkg::Options::=--force-confdef",
                    "-o",
                    "Dpkg::Options::=--force-confold",
                    &self.name,
                ])
                .env("DEBIAN_FRONTEND", "noninteractive"),
            _ => CommandSpec::new(manager).args(["install", "-y", &self.name]),
        };
        spec.timeout(self.timeout)
    }

    fn is_not_found(&self, ctx: &RunContext, result: &SubprocessResult) -> bool {
        let output = format!("{}\n{}", result.stdout, result.stderr);
        match ctx.platform.family {
            PlatformFamily::Debian => {
                result.exit_code == Some(APT_NOT_FOUND_EXIT)
                    && output.contains("Unable to locate package")
            }
            _ => output.contains("No package") || output.contains("No match for argument"),
        }
    }
}

impl Resource for Package {
    fn kind(&self) -> &'static str {
        "package"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        if self.is_installed(ctx) {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            return Ok(Outcome::Updated);
        }

        let spec = self.install_command(ctx);
        debug!(package = %self.name, command = %spec, "Installing package");

        let result = ctx.runner.run(&spec)?;
        if !result.success {
            let manager = ctx.platform.package_manager();
            if self.is_not_found(ctx, &result) {
                return Err(ProvisionError::PackageNotFound {
                    package: self.name.clone(),
                    manager: manager.to_string(),
                });
            }
            warn!(package = %self.name, stderr = %result.stderr, "Package install failed");
            return Err(ProvisionError::execution(format!(
                "{} install {} failed: {}",
                manager,
                self.name,
                tail_output(&result.stderr, 5)
            )));
        }

        info!(package = %self.name, "Package installed");
        Ok(Outcome::Updated)
    }
}
