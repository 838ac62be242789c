//! Recipes: the steps that turn a daemon's settings into resource
//! declarations.
//!
//! Each managed daemon goes through four steps, in order:
//!
//! 1. `provision`: service account plus data and log directories
//! 2. `install`: exactly one of package, release archive or source build
//! 3. `config`: the daemon's main configuration file
//! 4. `init`: exactly one init-system integration and the service itself
//!
//! `compose` strings them together into one collection.

mod compose;
mod config;
mod init;
mod install;
mod provision;
mod target;

pub use compose::{compile, render_artifacts, resolve_targets, TargetSelection};
pub use config::declare_config;
pub use init::{declare_init, env_file};
pub use install::declare_install;
pub use provision::declare_provision;
pub use target::ServiceTarget;

use crate::config::Settings;
use crate::platform::Platform;
use crate::templates::TemplateEngine;

/// What every recipe step reads besides the target itself.
pub struct RecipeContext<'a> {
    pub settings: &'a Settings,
    pub platform: &'a Platform,
    /// Built-in templates for init-system artifacts.
    pub templates: &'a TemplateEngine,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::platform::PlatformFamily;
    use crate::services::DaemonRegistry;

    /// Owned settings, platform and templates for building recipe contexts.
    pub struct Fixture {
        pub settings: Settings,
        pub platform: Platform,
        pub templates: TemplateEngine,
    }

    impl Fixture {
        /// Settings parsed from `toml` on an Ubuntu amd64 host.
        pub fn new(toml: &str) -> Self {
            Self::on(toml, Platform::new("ubuntu", "16.04", PlatformFamily::Debian, "amd64"))
        }

        pub fn on(toml: &str, platform: Platform) -> Self {
            Self {
                settings: Settings::from_toml_str(toml, &[]).unwrap(),
                platform,
                templates: TemplateEngine::builtin().unwrap(),
            }
        }

        pub fn ctx(&self) -> RecipeContext<'_> {
            RecipeContext {
                settings: &self.settings,
                platform: &self.platform,
                templates: &self.templates,
            }
        }

        pub fn target(&self, name: &str) -> ServiceTarget {
            let definition = DaemonRegistry::new().get(name).unwrap();
            ServiceTarget::resolve(&self.settings, definition.as_ref(), &self.platform).unwrap()
        }
    }
}
