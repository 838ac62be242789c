//! The seam between resources and the host's external commands.

use crate::error::ProvisionError;

use super::subprocess::{CommandSpec, SubprocessResult};

/// Executes external commands on behalf of resources.
///
/// Package managers, service managers, `git` and build tools are all
/// reached through this trait so a run can be exercised without touching
/// the host.
pub trait SystemRunner: Send + Sync {
    /// Run the command and return its captured result.
    ///
    /// A non-zero exit is not an error at this level; callers decide what
    /// a failure means for their resource.
    fn run(&self, spec: &CommandSpec) -> Result<SubprocessResult, ProvisionError>;
}

/// Runs commands directly on this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostRunner;

impl SystemRunner for HostRunner {
    fn run(&self, spec: &CommandSpec) -> Result<SubprocessResult, ProvisionError> {
        spec.spawn_and_wait()
    }
}
