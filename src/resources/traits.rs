//! Resource trait definition.

use std::path::Path;

use crate::error::ProvisionError;

use super::types::{Outcome, ResourceId, RunContext, ServiceAction};

/// A unit of desired host state.
///
/// Every resource the provisioner declares implements this trait. A
/// resource inspects the host, changes it only when it differs from the
/// desired state, and reports which of the two happened.
///
/// # Example
///
/// ```ignore
/// pub struct Marker(PathBuf);
///
/// impl Resource for Marker {
///     fn kind(&self) -> &'static str {
///         "marker"
///     }
///
///     fn name(&self) -> String {
///         self.0.display().to_string()
///     }
///
///     fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
///         if self.0.exists() {
///             return Ok(Outcome::Unchanged);
///         }
///         if !ctx.why_run {
///             std::fs::write(&self.0, "")?;
///         }
///         Ok(Outcome::Updated)
///     }
/// }
/// ```
pub trait Resource: Send + Sync {
    /// Resource kind (e.g., "template", "service").
    fn kind(&self) -> &'static str;

    /// Name unique among resources of the same kind.
    fn name(&self) -> String;

    fn id(&self) -> ResourceId {
        ResourceId::new(self.kind(), self.name())
    }

    /// Bring the host in line with this resource.
    ///
    /// In why-run mode the resource must not mutate anything and reports
    /// `Updated` when it would have made a change.
    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError>;

    /// Run a delayed notification addressed to this resource.
    ///
    /// Only services accept notifications; everything else rejects them.
    fn handle(&self, _ctx: &RunContext, action: ServiceAction) -> Result<(), ProvisionError> {
        Err(ProvisionError::config(format!(
            "{} cannot handle '{}' notifications",
            self.id(),
            action
        )))
    }

    /// Whether `handle` accepts notifications.
    fn accepts_notifications(&self) -> bool {
        false
    }

    /// Path and content of the file this resource writes, if it renders one.
    fn rendered(&self) -> Option<(&Path, &str)> {
        None
    }
}
