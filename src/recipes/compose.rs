//! Composition of the recipe steps into one resource collection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::Settings;
use crate::converge::ResourceCollection;
use crate::error::ProvisionError;
use crate::platform::Platform;
use crate::services::DaemonRegistry;

use super::config::declare_config;
use super::init::declare_init;
use super::install::declare_install;
use super::provision::declare_provision;
use super::{RecipeContext, ServiceTarget};

/// Which daemons a run converges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSelection {
    #[default]
    All,
    Only(String),
}

impl FromStr for TargetSelection {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            name if DaemonRegistry::new().get(name).is_some() => Ok(Self::Only(name.to_string())),
            other => Err(ProvisionError::config(format!(
                "Unknown target '{}'. Valid targets: all, {}",
                other,
                DaemonRegistry::new().list().join(", ")
            ))),
        }
    }
}

impl fmt::Display for TargetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(name) => f.write_str(name),
        }
    }
}

/// Resolve the selected daemons, Prometheus first.
pub fn resolve_targets(
    settings: &Settings,
    platform: &Platform,
    selection: &TargetSelection,
) -> Result<Vec<ServiceTarget>, ProvisionError> {
    DaemonRegistry::new()
        .all()
        .iter()
        .filter(|definition| match selection {
            TargetSelection::All => true,
            TargetSelection::Only(name) => definition.name() == name.as_str(),
        })
        .map(|definition| ServiceTarget::resolve(settings, definition.as_ref(), platform))
        .collect()
}

/// Declare every step for every target, in order: provision, install,
/// config, init.
pub fn compile(
    ctx: &RecipeContext<'_>,
    targets: &[ServiceTarget],
) -> Result<ResourceCollection, ProvisionError> {
    let mut collection = ResourceCollection::new();

    for target in targets {
        debug!(
            target = %target.name,
            version = %target.version,
            install_method = %target.install_method,
            "Compiling target"
        );
        declare_provision(&mut collection, ctx, target)?;
        declare_install(&mut collection, ctx, target)?;
        declare_config(&mut collection, ctx, target)?;
        declare_init(&mut collection, ctx, target)?;
    }

    collection.validate()?;

    info!(
        targets = targets.len(),
        resources = collection.len(),
        init_style = %ctx.settings.common.init_style,
        "Resource collection compiled"
    );

    Ok(collection)
}

/// Every rendered file in the collection, in declaration order.
pub fn render_artifacts(collection: &ResourceCollection) -> Vec<(PathBuf, String)> {
    collection
        .iter()
        .filter_map(|declaration| declaration.resource().rendered())
        .map(|(path, content)| (path.to_path_buf(), content.to_string()))
        .collect()
}
