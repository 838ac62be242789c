//! systemd provider.

use crate::error::ProvisionError;
use crate::executor::CommandSpec;
use crate::resources::types::RunContext;

use super::provider::{control, query, ServiceProvider};

/// Controls units through `systemctl`.
///
/// Unit files may have changed earlier in the run, so the manager
/// configuration is reloaded before enabling, starting or restarting.
pub struct SystemdProvider;

impl SystemdProvider {
    fn systemctl(args: &[&str]) -> CommandSpec {
        CommandSpec::new("systemctl").args(args)
    }

    fn daemon_reload(ctx: &RunContext) -> Result<(), ProvisionError> {
        control(ctx, Self::systemctl(&["daemon-reload"]))
    }
}

impl ServiceProvider for SystemdProvider {
    fn name(&self) -> &'static str {
        "systemd"
    }

    fn is_enabled(&self, ctx: &RunContext, service: &str) -> bool {
        query(ctx, Self::systemctl(&["is-enabled", service])).success
    }

    fn is_running(&self, ctx: &RunContext, service: &str) -> bool {
        query(ctx, Self::systemctl(&["is-active", service])).success
    }

    fn enable(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        Self::daemon_reload(ctx)?;
        control(ctx, Self::systemctl(&["enable", service]))
    }

    fn start(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        Self::daemon_reload(ctx)?;
        control(ctx, Self::systemctl(&["start", service]))
    }

    fn restart(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        Self::daemon_reload(ctx)?;
        control(ctx, Self::systemctl(&["restart", service]))
    }

    fn reload(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, Self::systemctl(&["reload", service]))
    }
}
