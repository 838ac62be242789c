//! SysV init.d provider.

use std::fs;
use std::path::PathBuf;

use crate::error::ProvisionError;
use crate::executor::CommandSpec;
use crate::platform::PlatformFamily;
use crate::resources::types::RunContext;

use super::provider::{control, query, ServiceProvider};

/// Controls services through their init script. Links are managed with
/// `update-rc.d` on the Debian family and `chkconfig` elsewhere.
pub struct SysvProvider {
    init_script_dir: PathBuf,
    rc_dir: PathBuf,
}

impl SysvProvider {
    pub fn new(init_script_dir: impl Into<PathBuf>, rc_dir: impl Into<PathBuf>) -> Self {
        Self {
            init_script_dir: init_script_dir.into(),
            rc_dir: rc_dir.into(),
        }
    }

    fn script(&self, service: &str, action: &str) -> CommandSpec {
        CommandSpec::new(&self.init_script_dir.join(service).display().to_string()).arg(action)
    }

    /// Whether `rc_dir` holds a start link (`S<nn><service>`).
    fn has_start_link(&self, service: &str) -> bool {
        let Ok(entries) = fs::read_dir(&self.rc_dir) else {
            return false;
        };
        entries.flatten().any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.len() == service.len() + 3
                && name.starts_with('S')
                && name
                    .get(1..3)
                    .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
                && name.ends_with(service)
        })
    }
}

impl ServiceProvider for SysvProvider {
    fn name(&self) -> &'static str {
        "sysv"
    }

    fn is_enabled(&self, ctx: &RunContext, service: &str) -> bool {
        match ctx.platform.family {
            PlatformFamily::Debian => self.has_start_link(service),
            _ => {
                let result = query(ctx, CommandSpec::new("chkconfig").args(["--list", service]));
                result.success && result.stdout.contains("3:on")
            }
        }
    }

    fn is_running(&self, ctx: &RunContext, service: &str) -> bool {
        query(ctx, self.script(service, "status")).success
    }

    fn enable(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        match ctx.platform.family {
            PlatformFamily::Debian => control(
                ctx,
                CommandSpec::new("update-rc.d").args([service, "defaults"]),
            ),
            _ => {
                control(ctx, CommandSpec::new("chkconfig").args(["--add", service]))?;
                control(ctx, CommandSpec::new("chkconfig").args([service, "on"]))
            }
        }
    }

    fn start(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, self.script(service, "start"))
    }

    fn restart(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, self.script(service, "restart"))
    }

    fn reload(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, self.script(service, "reload"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::fake::FakeRunner;
    use crate::executor::SubprocessResult;
    use crate::platform::Platform;
    use std::sync::Arc;

    fn context(runner: Arc<FakeRunner>, family: PlatformFamily) -> RunContext {
        RunContext::new(Platform::new("test", "1", family, "amd64"), runner, false)
    }

    #[test]
    fn test_debian_start_link_detection() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SysvProvider::new("/etc/init.d", dir.path());
        let ctx = context(Arc::new(FakeRunner::new()), PlatformFamily::Debian);

        assert!(!provider.is_enabled(&ctx, "prometheus"));
        fs::write(dir.path().join("S01prometheus-extra"), "").unwrap();
        assert!(!provider.is_enabled(&ctx, "prometheus"));
        fs::write(dir.path().join("S20prometheus"), "").unwrap();
        assert!(provider.is_enabled(&ctx, "prometheus"));
    }

    #[test]
    fn test_rhel_enable_uses_chkconfig() {
        let runner = Arc::new(FakeRunner::new());
        let provider = SysvProvider::new("/etc/init.d", "/etc/rc2.d");
        let ctx = context(runner.clone(), PlatformFamily::Amazon);

        runner.respond("chkconfig --list", SubprocessResult::ok("prometheus 0:off 3:off"));
        assert!(!provider.is_enabled(&ctx, "prometheus"));

        provider.enable(&ctx, "prometheus").unwrap();
        assert!(runner.ran("chkconfig --add prometheus"));
        assert!(runner.ran("chkconfig prometheus on"));
    }

    #[test]
    fn test_script_actions() {
        let runner = Arc::new(FakeRunner::new());
        let provider = SysvProvider::new("/etc/init.d", "/etc/rc2.d");
        let ctx = context(runner.clone(), PlatformFamily::Debian);

        provider.reload(&ctx, "prometheus").unwrap();
        assert!(runner.ran("/etc/init.d/prometheus reload"));
    }
}
