//! Git checkouts pinned to a tag.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::executor::{tail_output, CommandSpec};

use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// A working tree of `repository` checked out at `revision`.
pub struct GitCheckout {
    destination: PathBuf,
    repository: String,
    revision: String,
    timeout: Duration,
}

impl GitCheckout {
    pub fn new(
        destination: impl Into<PathBuf>,
        repository: &str,
        revision: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            destination: destination.into(),
            repository: repository.to_string(),
            revision: revision.to_string(),
            timeout,
        }
    }

    fn git(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new("git").args(args).timeout(self.timeout)
    }

    fn run(&self, ctx: &RunContext, spec: CommandSpec) -> Result<String, ProvisionError> {
        let result = ctx.runner.run(&spec)?;
        if !result.success {
            return Err(ProvisionError::execution(format!(
                "{} failed: {}",
                spec,
                tail_output(&result.stderr, 5)
            )));
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Whether the existing checkout's HEAD is the wanted revision.
    fn at_revision(&self, ctx: &RunContext) -> Result<bool, ProvisionError> {
        let dest = self.destination.display().to_string();
        let head = self.run(ctx, self.git(&["-C", &dest, "rev-parse", "HEAD"]))?;
        let wanted = self.run(
            ctx,
            self.git(&[
                "-C",
                &dest,
                "rev-parse",
                "--verify",
                "-q",
                &format!("{}^{{commit}}", self.revision),
            ]),
        );
        Ok(matches!(wanted, Ok(commit) if commit == head))
    }
}

impl Resource for GitCheckout {
    fn kind(&self) -> &'static str {
        "git"
    }

    fn name(&self) -> String {
        self.destination.display().to_string()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let dest = self.destination.display().to_string();
        let exists = self.destination.join(".git").is_dir();

        if exists && self.at_revision(ctx)? {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            return Ok(Outcome::Updated);
        }

        if exists {
            debug!(path = %dest, revision = %self.revision, "Updating checkout");
            self.run(ctx, self.git(&["-C", &dest, "fetch", "--tags", "origin"]))?;
            self.run(ctx, self.git(&["-C", &dest, "checkout", "-q", &self.revision]))?;
        } else {
            debug!(path = %dest, repository = %self.repository, "Cloning");
            self.run(
                ctx,
                self.git(&[
                    "clone",
                    "--branch",
                    &self.revision,
                    "--depth",
                    "1",
                    &self.repository,
                    &dest,
                ]),
            )?;
        }

        info!(path = %dest, revision = %self.revision, "Checkout synced");
        Ok(Outcome::Updated)
    }
}
