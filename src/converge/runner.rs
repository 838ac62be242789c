//! The converge runner.
//!
//! Applies a collection in declaration order, stops at the first error,
//! and delivers the queued notifications after the last resource.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::ProvisionError;
use crate::journal::{redact_urls, Journal, JournalEntry, JournalEvent, JournalResult};
use crate::resources::{Outcome, RunContext};

use super::collection::ResourceCollection;
use super::queue::NotificationQueue;
use super::report::{ResourceReport, RunReport};

/// Runs resource collections and journals what happened.
pub struct ConvergeRunner {
    journal: Arc<dyn Journal>,
}

impl ConvergeRunner {
    pub fn new(journal: Arc<dyn Journal>) -> Self {
        Self { journal }
    }

    /// Converge every resource, then deliver notifications.
    ///
    /// The collection is validated before anything runs, so a dangling
    /// notification target never leaves a half-converged host.
    pub fn run(
        &self,
        collection: &ResourceCollection,
        ctx: &RunContext,
    ) -> Result<RunReport, ProvisionError> {
        collection.validate()?;

        let started = Instant::now();
        let mut report = RunReport::new(ctx.run_id, ctx.why_run);
        let mut queue = NotificationQueue::new();

        info!(
            run_id = %ctx.run_id,
            resources = collection.len(),
            why_run = ctx.why_run,
            "Convergence started"
        );
        self.record(
            JournalEntry::new(
                ctx.run_id,
                JournalEvent::RunStarted,
                "run",
                ctx.why_run,
                JournalResult::Unchanged,
                0,
            )
            .with_detail(serde_json::json!({ "resources": collection.len() })),
        );

        for declaration in collection.iter() {
            let id = declaration.id();
            let resource_started = Instant::now();
            let result = declaration.resource().converge(ctx);
            let duration_ms = resource_started.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(run_id = %ctx.run_id, resource = %id, error = %e, "Resource failed");
                    self.record_failure(ctx, JournalEvent::Converge, &id.to_string(), &e, duration_ms);
                    self.finish(ctx, started, Some(&e));
                    return Err(e);
                }
            };

            debug!(resource = %id, ?outcome, duration_ms, "Resource converged");
            self.record(JournalEntry::new(
                ctx.run_id,
                JournalEvent::Converge,
                id.to_string(),
                ctx.why_run,
                journal_result(outcome),
                duration_ms,
            ));

            if outcome.is_updated() {
                for notification in declaration.notifications() {
                    debug!(resource = %id, %notification, "Notification queued");
                    queue.push(notification.clone());
                }
            }

            report.resources.push(ResourceReport {
                id: id.clone(),
                outcome,
                duration_ms,
            });
        }

        for notification in queue.drain() {
            let Some(target) = collection.get(&notification.target) else {
                // validate() guarantees every target exists
                continue;
            };

            let notify_started = Instant::now();
            let result = target.resource().handle(ctx, notification.action);
            let duration_ms = notify_started.elapsed().as_millis() as u64;

            if let Err(e) = result {
                error!(run_id = %ctx.run_id, %notification, error = %e, "Notification failed");
                self.record_failure(ctx, JournalEvent::Notify, &notification.to_string(), &e, duration_ms);
                self.finish(ctx, started, Some(&e));
                return Err(e);
            }

            info!(%notification, why_run = ctx.why_run, "Notification delivered");
            self.record(JournalEntry::new(
                ctx.run_id,
                JournalEvent::Notify,
                notification.to_string(),
                ctx.why_run,
                JournalResult::Updated,
                duration_ms,
            ));
            report.notifications.push(notification);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.finish(ctx, started, None);

        info!(
            run_id = %ctx.run_id,
            updated = report.updated().len(),
            notifications = report.notifications.len(),
            duration_ms = report.duration_ms,
            "Convergence finished"
        );

        Ok(report)
    }

    fn finish(&self, ctx: &RunContext, started: Instant, failure: Option<&ProvisionError>) {
        let duration_ms = started.elapsed().as_millis() as u64;
        match failure {
            Some(e) => self.record_failure(ctx, JournalEvent::RunFinished, "run", e, duration_ms),
            None => self.record(JournalEntry::new(
                ctx.run_id,
                JournalEvent::RunFinished,
                "run",
                ctx.why_run,
                JournalResult::Unchanged,
                duration_ms,
            )),
        }
    }

    fn record_failure(
        &self,
        ctx: &RunContext,
        event: JournalEvent,
        resource: &str,
        error: &ProvisionError,
        duration_ms: u64,
    ) {
        self.record(JournalEntry::new(
            ctx.run_id,
            event,
            resource,
            ctx.why_run,
            JournalResult::Failure {
                error_code: error.code().to_string(),
                error_message: redact_urls(&error.to_string()),
            },
            duration_ms,
        ));
    }

    /// Journal failures are logged, never fatal.
    fn record(&self, entry: JournalEntry) {
        if let Err(e) = self.journal.record(&entry) {
            warn!(error = %e, resource = %entry.resource, "Failed to write journal entry");
        }
    }
}

fn journal_result(outcome: Outcome) -> JournalResult {
    match outcome {
        Outcome::Updated => JournalResult::Updated,
        Outcome::Unchanged => JournalResult::Unchanged,
    }
}
