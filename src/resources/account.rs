//! System users and groups.

use std::path::PathBuf;

use nix::unistd::{Group, User};
use tracing::info;

use crate::error::ProvisionError;
use crate::executor::{tail_output, CommandSpec};

use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// A system group.
pub struct SystemGroup {
    name: String,
}

impl SystemGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Resource for SystemGroup {
    fn kind(&self) -> &'static str {
        "group"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let exists = Group::from_name(&self.name)
            .map_err(|e| ProvisionError::execution(format!("Failed to look up group: {}", e)))?
            .is_some();
        if exists {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            return Ok(Outcome::Updated);
        }

        let spec = CommandSpec::new("groupadd")
            .args(["--system", &self.name])
            .timeout(ctx.command_timeout);
        run_checked(ctx, &spec)?;

        info!(group = %self.name, "System group created");
        Ok(Outcome::Updated)
    }
}

/// A system user without a login shell.
pub struct SystemUser {
    name: String,
    group: String,
    home: PathBuf,
}

impl SystemUser {
    pub fn new(name: &str, group: &str, home: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            home: home.into(),
        }
    }
}

impl Resource for SystemUser {
    fn kind(&self) -> &'static str {
        "user"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let exists = User::from_name(&self.name)
            .map_err(|e| ProvisionError::execution(format!("Failed to look up user: {}", e)))?
            .is_some();
        if exists {
            return Ok(Outcome::Unchanged);
        }
        if ctx.why_run {
            return Ok(Outcome::Updated);
        }

        let home = self.home.display().to_string();
        let spec = CommandSpec::new("useradd")
            .args([
                "--system",
                "--gid",
                &self.group,
                "--home-dir",
                &home,
                "--no-create-home",
                "--shell",
                "/bin/false",
                &self.name,
            ])
            .timeout(ctx.command_timeout);
        run_checked(ctx, &spec)?;

        info!(user = %self.name, group = %self.group, "System user created");
        Ok(Outcome::Updated)
    }
}

fn run_checked(ctx: &RunContext, spec: &CommandSpec) -> Result<(), ProvisionError> {
    let result = ctx.runner.run(spec)?;
    if !result.success {
        return Err(ProvisionError::execution(format!(
            "{} failed: {}",
            spec,
            tail_output(&result.stderr, 5)
        )));
    }
    Ok(())
}
