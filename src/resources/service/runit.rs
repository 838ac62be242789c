//! runit provider.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ProvisionError;
use crate::executor::CommandSpec;
use crate::resources::types::RunContext;

use super::provider::{control, query, ServiceProvider};

/// Controls services through `sv`. A service is enabled by linking its
/// `sv` directory into the directory `runsvdir` watches.
pub struct RunitProvider {
    sv_dir: PathBuf,
    service_dir: PathBuf,
}

impl RunitProvider {
    pub fn new(sv_dir: impl Into<PathBuf>, service_dir: impl Into<PathBuf>) -> Self {
        Self {
            sv_dir: sv_dir.into(),
            service_dir: service_dir.into(),
        }
    }

    fn sv(args: &[&str]) -> CommandSpec {
        CommandSpec::new("sv").args(args)
    }

    /// Wait for `runsv` to pick the service up. `sv` fails with
    /// "unable to open supervise/ok" until it has.
    fn wait_for_supervisor(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        let ok = self.sv_dir.join(service).join("supervise").join("ok");
        let deadline = Instant::now() + ctx.command_timeout;
        loop {
            if ok.exists() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ProvisionError::execution(format!(
                    "runsv did not supervise '{}' within {}s ('{}' missing)",
                    service,
                    ctx.command_timeout.as_secs(),
                    ok.display()
                )));
            }
            thread::sleep(SUPERVISE_POLL.min(ctx.command_timeout));
        }
    }

    fn sv_control(&self, ctx: &RunContext, verb: &str, service: &str) -> Result<(), ProvisionError> {
        self.wait_for_supervisor(ctx, service)?;
        control(ctx, Self::sv(&[verb, service]))
    }
}

const SUPERVISE_POLL: Duration = Duration::from_millis(250);

impl ServiceProvider for RunitProvider {
    fn name(&self) -> &'static str {
        "runit"
    }

    fn is_enabled(&self, _ctx: &RunContext, service: &str) -> bool {
        fs::read_link(self.service_dir.join(service))
            .map(|target| target == self.sv_dir.join(service))
            .unwrap_or(false)
    }

    fn is_running(&self, ctx: &RunContext, service: &str) -> bool {
        let result = query(ctx, Self::sv(&["status", service]));
        result.success && result.stdout.starts_with("run:")
    }

    fn enable(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        let link = self.service_dir.join(service);
        let target = self.sv_dir.join(service);

        fs::create_dir_all(&self.service_dir)?;
        if fs::symlink_metadata(&link).is_ok() {
            debug!(link = %link.display(), "Replacing stale service link");
            fs::remove_file(&link)?;
        }
        symlink(&target, &link).map_err(|e| {
            ProvisionError::execution(format!(
                "Failed to link '{}' to '{}': {}",
                link.display(),
                target.display(),
                e
            ))
        })?;
        self.wait_for_supervisor(ctx, service)
    }

    fn start(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        self.sv_control(ctx, "start", service)
    }

    fn restart(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        self.sv_control(ctx, "restart", service)
    }

    /// runit has no reload verb; `hup` delivers the SIGHUP daemons reload on.
    fn reload(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        self.sv_control(ctx, "hup", service)
    }
}
