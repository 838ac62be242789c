//! Binaries copied into place from an extracted archive or a build tree.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::ProvisionError;

use super::digest::sha256_file;
use super::file::write_atomic;
use super::ownership::Ownership;
use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// A file installed by atomically copying `source` over `path`.
pub struct InstalledFile {
    path: PathBuf,
    source: PathBuf,
    ownership: Ownership,
}

impl InstalledFile {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<PathBuf>, ownership: Ownership) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            ownership,
        }
    }
}

impl Resource for InstalledFile {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        if !self.source.is_file() {
            // An earlier resource produces the source; in why-run it never ran
            if ctx.why_run {
                return Ok(Outcome::Updated);
            }
            return Err(ProvisionError::execution(format!(
                "Install source '{}' does not exist",
                self.source.display()
            )));
        }

        if self.path.is_file() && sha256_file(&self.path)? == sha256_file(&self.source)? {
            if !self.ownership.differs(&self.path)? {
                return Ok(Outcome::Unchanged);
            }
            if !ctx.why_run {
                self.ownership.apply(&self.path)?;
            }
            return Ok(Outcome::Updated);
        }

        if ctx.why_run {
            debug!(path = %self.path.display(), source = %self.source.display(), "Would install file");
            return Ok(Outcome::Updated);
        }

        write_atomic(&self.path, &self.ownership, |out| {
            let mut source = File::open(&self.source)?;
            io::copy(&mut source, out).map(|_| ())
        })?;

        info!(
            path = %self.path.display(),
            source = %self.source.display(),
            bytes = fs::metadata(&self.path)?.len(),
            "File installed"
        );

        Ok(Outcome::Updated)
    }
}
