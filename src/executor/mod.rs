//! Command executor module.
//!
//! Handles subprocess spawning, execution timeouts, and the runner seam
//! every resource uses to reach the host.

mod output;
mod runner;
mod subprocess;

#[cfg(test)]
pub(crate) mod fake;

pub use output::tail_output;
pub use runner::{HostRunner, SystemRunner};
pub use subprocess::{CommandSpec, SubprocessResult};
