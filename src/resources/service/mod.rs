//! Managed services and their init-system providers.

mod provider;
mod runit;
mod sysv;
mod systemd;
mod upstart;

use tracing::{debug, info};

use crate::error::ProvisionError;

use super::traits::Resource;
use super::types::{Outcome, RunContext, ServiceAction};

pub use provider::ServiceProvider;
pub use runit::RunitProvider;
pub use sysv::SysvProvider;
pub use systemd::SystemdProvider;
pub use upstart::UpstartProvider;

/// Optional actions a service's init integration supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Supports {
    pub status: bool,
    pub restart: bool,
    pub reload: bool,
}

impl Supports {
    pub const ALL: Supports = Supports {
        status: true,
        restart: true,
        reload: true,
    };

    pub const NO_RELOAD: Supports = Supports {
        status: true,
        restart: true,
        reload: false,
    };
}

/// A service kept enabled and running by one init-system provider.
pub struct Service {
    name: String,
    provider: Box<dyn ServiceProvider>,
    actions: Vec<ServiceAction>,
    supports: Supports,
}

impl Service {
    /// A service that is enabled, then started, when converged.
    pub fn new(name: &str, provider: Box<dyn ServiceProvider>, supports: Supports) -> Self {
        Self {
            name: name.to_string(),
            provider,
            actions: vec![ServiceAction::Enable, ServiceAction::Start],
            supports,
        }
    }

    /// The action actually run for a requested one.
    ///
    /// Reload degrades to restart when the integration cannot reload.
    pub fn effective_action(&self, action: ServiceAction) -> ServiceAction {
        match action {
            ServiceAction::Reload if !self.supports.reload => ServiceAction::Restart,
            other => other,
        }
    }

    fn apply(&self, ctx: &RunContext, action: ServiceAction) -> Result<Outcome, ProvisionError> {
        let needed = match action {
            ServiceAction::Enable => !self.provider.is_enabled(ctx, &self.name),
            ServiceAction::Start => !self.provider.is_running(ctx, &self.name),
            ServiceAction::Restart | ServiceAction::Reload => true,
        };
        if !needed {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            debug!(service = %self.name, %action, "Would run service action");
            return Ok(Outcome::Updated);
        }

        match action {
            ServiceAction::Enable => self.provider.enable(ctx, &self.name)?,
            ServiceAction::Start => self.provider.start(ctx, &self.name)?,
            ServiceAction::Restart => self.provider.restart(ctx, &self.name)?,
            ServiceAction::Reload => self.provider.reload(ctx, &self.name)?,
        }

        info!(service = %self.name, provider = self.provider.name(), %action, "Service action complete");
        Ok(Outcome::Updated)
    }
}

impl Resource for Service {
    fn kind(&self) -> &'static str {
        "service"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let mut outcome = Outcome::Unchanged;
        for action in &self.actions {
            outcome = outcome.merge(self.apply(ctx, *action)?);
        }
        Ok(outcome)
    }

    fn handle(&self, ctx: &RunContext, action: ServiceAction) -> Result<(), ProvisionError> {
        let effective = self.effective_action(action);
        if effective != action {
            debug!(service = %self.name, requested = %action, running = %effective, "Reload not supported, restarting");
        }
        self.apply(ctx, effective).map(|_| ())
    }

    fn accepts_notifications(&self) -> bool {
        true
    }
}
