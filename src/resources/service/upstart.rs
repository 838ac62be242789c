//! Upstart provider.

use crate::error::ProvisionError;
use crate::executor::CommandSpec;
use crate::resources::types::RunContext;

use super::provider::{control, query, ServiceProvider};

/// Controls jobs through `initctl`. Jobs under `/etc/init` start on
/// their `start on` stanza, so there is nothing to enable.
pub struct UpstartProvider;

impl UpstartProvider {
    fn initctl(args: &[&str]) -> CommandSpec {
        CommandSpec::new("initctl").args(args)
    }
}

impl ServiceProvider for UpstartProvider {
    fn name(&self) -> &'static str {
        "upstart"
    }

    fn is_enabled(&self, _ctx: &RunContext, _service: &str) -> bool {
        true
    }

    fn is_running(&self, ctx: &RunContext, service: &str) -> bool {
        let result = query(ctx, Self::initctl(&["status", service]));
        result.success && result.stdout.contains("start/running")
    }

    fn enable(&self, _ctx: &RunContext, _service: &str) -> Result<(), ProvisionError> {
        Ok(())
    }

    fn start(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, Self::initctl(&["start", service]))
    }

    fn restart(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        // initctl restart refuses stopped jobs
        if self.is_running(ctx, service) {
            control(ctx, Self::initctl(&["restart", service]))
        } else {
            self.start(ctx, service)
        }
    }

    fn reload(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError> {
        control(ctx, Self::initctl(&["reload", service]))
    }
}
