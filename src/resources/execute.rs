//! Build commands.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::executor::{tail_output, CommandSpec};

use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// Lines of build output kept in a compile error.
const FAILURE_TAIL_LINES: usize = 20;

/// A build command run inside a source tree.
///
/// Guarded by `creates`: when that artifact already exists the command is
/// skipped. A non-zero exit is a compile failure for `target`.
pub struct BuildCommand {
    name: String,
    target: String,
    command: Vec<String>,
    cwd: PathBuf,
    creates: PathBuf,
    timeout: Duration,
}

impl BuildCommand {
    pub fn new(
        name: &str,
        target: &str,
        command: &[String],
        cwd: impl Into<PathBuf>,
        creates: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            command: command.to_vec(),
            cwd: cwd.into(),
            creates: creates.into(),
            timeout,
        }
    }
}

impl Resource for BuildCommand {
    fn kind(&self) -> &'static str {
        "execute"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        if self.creates.exists() {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            return Ok(Outcome::Updated);
        }

        let Some((program, args)) = self.command.split_first() else {
            return Err(ProvisionError::config(format!("{}: empty build command", self.name)));
        };
        let spec = CommandSpec::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .timeout(self.timeout);

        info!(target = %self.target, command = %spec, cwd = %self.cwd.display(), "Compiling from source");
        let result = ctx.runner.run(&spec).map_err(|e| ProvisionError::Compile {
            name: self.target.clone(),
            message: e.to_string(),
        })?;

        if !result.success {
            let output = if result.stderr.trim().is_empty() {
                &result.stdout
            } else {
                &result.stderr
            };
            warn!(target = %self.target, exit_code = ?result.exit_code, "Build failed");
            return Err(ProvisionError::Compile {
                name: self.target.clone(),
                message: tail_output(output, FAILURE_TAIL_LINES),
            });
        }

        if !self.creates.exists() {
            return Err(ProvisionError::Compile {
                name: self.target.clone(),
                message: format!("build did not produce '{}'", self.creates.display()),
            });
        }

        Ok(Outcome::Updated)
    }
}
