//! Resource types: identifiers, outcomes, actions and the run context.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::executor::SystemRunner;
use crate::platform::Platform;

/// Identity of a declared resource, rendered as `kind[name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId {
    kind: &'static str,
    name: String,
}

impl ResourceId {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Identity of the managed service `name`.
    pub fn service(name: &str) -> Self {
        Self::new("service", name)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.name)
    }
}

/// Result of converging one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Already in the desired state.
    Unchanged,
    /// State was changed (or, in why-run mode, would be).
    Updated,
}

impl Outcome {
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Updated
        } else {
            Self::Unchanged
        }
    }

    pub fn is_updated(self) -> bool {
        self == Self::Updated
    }

    /// Combine the outcomes of two steps of the same resource.
    pub fn merge(self, other: Outcome) -> Self {
        Self::from_changed(self.is_updated() || other.is_updated())
    }
}

/// Action a service resource can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Enable,
    Start,
    Restart,
    Reload,
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enable => "enable",
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Reload => "reload",
        };
        f.write_str(name)
    }
}

/// A delayed notification: run `action` on `target` at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Notification {
    pub target: ResourceId,
    pub action: ServiceAction,
}

impl Notification {
    pub fn new(action: ServiceAction, target: ResourceId) -> Self {
        Self { target, action }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.target)
    }
}

/// State shared by every resource during one convergence.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    /// Report changes without making them.
    pub why_run: bool,
    pub platform: Platform,
    pub runner: Arc<dyn SystemRunner>,
    /// Timeout for short host commands (status queries, service control).
    pub command_timeout: Duration,
}

impl RunContext {
    pub fn new(platform: Platform, runner: Arc<dyn SystemRunner>, why_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            why_run,
            platform,
            runner,
            command_timeout: Duration::from_secs(120),
        }
    }
}
