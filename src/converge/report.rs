//! Convergence reports.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::resources::{Notification, Outcome, ResourceId};

/// Outcome of one resource in a run.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub id: ResourceId,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// What a convergence did (or, in why-run mode, would do).
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub why_run: bool,
    pub resources: Vec<ResourceReport>,
    /// Notifications delivered at the end of the run, in delivery order.
    pub notifications: Vec<Notification>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(run_id: Uuid, why_run: bool) -> Self {
        Self {
            run_id,
            why_run,
            resources: Vec::new(),
            notifications: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Ids of every updated resource, in run order.
    pub fn updated(&self) -> Vec<&ResourceId> {
        self.resources
            .iter()
            .filter(|r| r.outcome.is_updated())
            .map(|r| &r.id)
            .collect()
    }

    pub fn is_unchanged(&self) -> bool {
        self.notifications.is_empty() && self.updated().is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.why_run { "would update" } else { "updated" };
        for resource in &self.resources {
            if resource.outcome.is_updated() {
                writeln!(f, "  {:<13} {}", verb, resource.id)?;
            }
        }
        let verb = if self.why_run { "would notify" } else { "notified" };
        for notification in &self.notifications {
            writeln!(f, "  {:<13} {}", verb, notification)?;
        }
        write!(
            f,
            "{}/{} resources {}, {} notifications in {}ms",
            self.updated().len(),
            self.resources.len(),
            if self.why_run { "would change" } else { "changed" },
            self.notifications.len(),
            self.duration_ms
        )
    }
}
