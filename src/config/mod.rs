//! Configuration module for the provisioner.
//!
//! Handles loading and validating settings from TOML files plus
//! command-line attribute overrides.

mod choices;
mod overrides;
mod settings;

pub use choices::{InitStyle, InstallMethod};
pub use overrides::apply_overrides;
pub use settings::*;
