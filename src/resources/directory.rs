//! Managed directories.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::ProvisionError;

use super::ownership::Ownership;
use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// A directory created recursively with fixed owner, group and mode.
pub struct Directory {
    path: PathBuf,
    ownership: Ownership,
}

impl Directory {
    pub fn new(path: impl Into<PathBuf>, ownership: Ownership) -> Self {
        Self {
            path: path.into(),
            ownership,
        }
    }
}

impl Resource for Directory {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        if self.path.exists() && !self.path.is_dir() {
            return Err(ProvisionError::execution(format!(
                "'{}' exists but is not a directory",
                self.path.display()
            )));
        }

        let missing = !self.path.exists();
        if !missing && !self.ownership.differs(&self.path)? {
            return Ok(Outcome::Unchanged);
        }

        if ctx.why_run {
            debug!(path = %self.path.display(), missing, "Would manage directory");
            return Ok(Outcome::Updated);
        }

        if missing {
            fs::create_dir_all(&self.path)?;
        }
        self.ownership.apply(&self.path)?;

        info!(
            path = %self.path.display(),
            owner = %self.ownership.user,
            group = %self.ownership.group,
            created = missing,
            "Directory converged"
        );

        Ok(Outcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::fake::FakeRunner;
    use crate::platform::{Platform, PlatformFamily};
    use crate::resources::ownership::test_support::current_ownership;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    fn context(why_run: bool) -> RunContext {
        RunContext::new(
            Platform::new("centos", "7", PlatformFamily::Rhel, "amd64"),
            Arc::new(FakeRunner::new()),
            why_run,
        )
    }

    #[test]
    fn test_creates_recursively_with_mode() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("opt/prometheus/data");
        let directory = Directory::new(&path, current_ownership(0o755));

        assert_eq!(directory.converge(&context(false)).unwrap(), Outcome::Updated);
        assert!(path.is_dir());
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o7777, 0o755);
        assert_eq!(directory.converge(&context(false)).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn test_why_run_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("var/log/prometheus");
        let directory = Directory::new(&path, current_ownership(0o755));

        assert_eq!(directory.converge(&context(true)).unwrap(), Outcome::Updated);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_in_the_way() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("prometheus");
        fs::write(&path, "").unwrap();

        let directory = Directory::new(&path, current_ownership(0o755));
        assert!(directory.converge(&context(false)).is_err());
    }
}
