//! Journal entry types.

use serde::Serialize;
use uuid::Uuid;

use super::redact::redact_detail;

/// A single journal entry.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// RFC 3339 timestamp of when the event finished.
    pub timestamp: String,
    /// Identifier shared by every entry of one convergence.
    pub run_id: Uuid,
    /// What happened.
    pub event: JournalEvent,
    /// Resource id (`kind[name]`) or notification target the entry is about.
    pub resource: String,
    /// Whether the run only reported what it would change.
    pub why_run: bool,
    pub result: JournalResult,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Extra context, already redacted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Kind of journaled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEvent {
    RunStarted,
    Converge,
    Notify,
    RunFinished,
}

/// Outcome of a journaled event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum JournalResult {
    /// The event changed (or in why-run mode, would change) host state.
    #[serde(rename = "updated")]
    Updated,
    /// The resource was already in its desired state.
    #[serde(rename = "unchanged")]
    Unchanged,
    #[serde(rename = "failure")]
    Failure {
        error_code: String,
        error_message: String,
    },
}

impl JournalEntry {
    pub fn new(
        run_id: Uuid,
        event: JournalEvent,
        resource: impl Into<String>,
        why_run: bool,
        result: JournalResult,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            run_id,
            event,
            resource: resource.into(),
            why_run,
            result,
            duration_ms,
            detail: None,
        }
    }

    /// Attach extra context. Credentials are redacted on the way in.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(redact_detail(&detail));
        self
    }
}
