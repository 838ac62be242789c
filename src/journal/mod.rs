//! Run journal module.
//!
//! Records every resource outcome, delivered notification and run failure
//! as JSON lines so a convergence can be reconstructed after the fact.
//!
//! ## Features
//!
//! - Structured JSON entries keyed by run id and resource id
//! - Credentials in URLs redacted before they reach disk
//! - Append-only file writing with sync for durability

mod entry;
mod logger;
mod redact;

pub use entry::{JournalEntry, JournalEvent, JournalResult};
pub use logger::{FileJournal, Journal, NullJournal};
pub use redact::{redact_detail, redact_urls};
