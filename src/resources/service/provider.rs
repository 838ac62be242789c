//! Service provider trait.

use tracing::debug;

use crate::error::ProvisionError;
use crate::executor::{tail_output, CommandSpec, SubprocessResult};
use crate::resources::types::RunContext;

/// Drives one init system.
///
/// Queries never fail: a command that cannot run counts as "no", so a
/// why-run on a host without the init system still reports changes.
pub trait ServiceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_enabled(&self, ctx: &RunContext, service: &str) -> bool;

    fn is_running(&self, ctx: &RunContext, service: &str) -> bool;

    fn enable(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError>;

    fn start(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError>;

    fn restart(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError>;

    fn reload(&self, ctx: &RunContext, service: &str) -> Result<(), ProvisionError>;
}

/// Run a query command, treating spawn failures as an unsuccessful result.
pub(super) fn query(ctx: &RunContext, spec: CommandSpec) -> SubprocessResult {
    let spec = spec.timeout(ctx.command_timeout);
    ctx.runner.run(&spec).unwrap_or_else(|e| {
        debug!(command = %spec, error = %e, "Service query failed");
        SubprocessResult::failed(-1, &e.to_string())
    })
}

/// Run a control command; a non-zero exit is an error.
pub(super) fn control(ctx: &RunContext, spec: CommandSpec) -> Result<(), ProvisionError> {
    let spec = spec.timeout(ctx.command_timeout);
    let result = ctx.runner.run(&spec)?;
    if !result.success {
        let output = if result.stderr.trim().is_empty() {
            &result.stdout
        } else {
            &result.stderr
        };
        return Err(ProvisionError::execution(format!(
            "{} failed: {}",
            spec,
            tail_output(output, 5)
        )));
    }
    Ok(())
}
