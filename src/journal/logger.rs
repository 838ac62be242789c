//! Journal writers.
//!
//! Writes journal entries as JSON lines (one JSON object per line) for
//! easy parsing by log analysis tools.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::ProvisionError;

use super::entry::JournalEntry;

/// Destination for journal entries.
pub trait Journal: Send + Sync {
    fn record(&self, entry: &JournalEntry) -> Result<(), ProvisionError>;
}

/// Appends journal entries to a file.
pub struct FileJournal {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileJournal {
    /// Open (or create) the journal at `path` in append mode.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn new(path: &Path) -> Result<Self, ProvisionError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                debug!(path = %parent.display(), "Creating journal directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        debug!(path = %path.display(), "Journal opened");

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Journal for FileJournal {
    fn record(&self, entry: &JournalEntry) -> Result<(), ProvisionError> {
        let json = serde_json::to_string(entry)?;

        let mut file = self
            .file
            .lock()
            .map_err(|e| ProvisionError::execution(format!("Journal lock poisoned: {}", e)))?;

        writeln!(file, "{}", json)?;

        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync journal");
        }

        Ok(())
    }
}

/// A journal that discards every entry, used when journaling is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn record(&self, _entry: &JournalEntry) -> Result<(), ProvisionError> {
        Ok(())
    }
}
