//! Tera template engine wrapper.
//!
//! Provides the built-in template set, optional override directories,
//! and rendering.

use std::path::Path;
use std::sync::Arc;

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::error::ProvisionError;

/// Templates compiled into the binary, keyed by the name used to render them.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "prometheus.yml.tera",
        include_str!("../../templates/prometheus.yml.tera"),
    ),
    (
        "alertmanager.yml.tera",
        include_str!("../../templates/alertmanager.yml.tera"),
    ),
    (
        "systemd/service.tera",
        include_str!("../../templates/systemd/service.tera"),
    ),
    (
        "fedora/sysconfig.tera",
        include_str!("../../templates/fedora/sysconfig.tera"),
    ),
    (
        "redhat/sysconfig.tera",
        include_str!("../../templates/redhat/sysconfig.tera"),
    ),
    (
        "debian/default.tera",
        include_str!("../../templates/debian/default.tera"),
    ),
    (
        "amazon/default.tera",
        include_str!("../../templates/amazon/default.tera"),
    ),
    (
        "upstart/job.conf.tera",
        include_str!("../../templates/upstart/job.conf.tera"),
    ),
    ("sysv/init.tera", include_str!("../../templates/sysv/init.tera")),
    ("runit/run.tera", include_str!("../../templates/runit/run.tera")),
    (
        "runit/log-run.tera",
        include_str!("../../templates/runit/log-run.tera"),
    ),
];

/// Template engine for rendering managed files.
///
/// Wraps Tera and provides a simplified interface for template operations.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    /// Create an engine holding only the built-in templates.
    pub fn builtin() -> Result<Self, ProvisionError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .map_err(|e| ProvisionError::TemplateRender {
                message: format!("Failed to load built-in templates: {}", e),
            })?;

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Create a new template engine, loading templates from the specified directory.
    ///
    /// Templates are loaded recursively from the directory with `.tera` extension.
    pub fn new(template_dir: &Path) -> Result<Self, ProvisionError> {
        if !template_dir.is_dir() {
            return Err(ProvisionError::TemplateRender {
                message: format!(
                    "Template directory '{}' does not exist",
                    template_dir.display()
                ),
            });
        }

        let pattern = template_dir.join("**/*.tera");
        let pattern_str = pattern.to_string_lossy();

        debug!(pattern = %pattern_str, "Loading templates");

        let tera = Tera::new(&pattern_str).map_err(|e| ProvisionError::TemplateRender {
            message: format!(
                "Failed to load templates from '{}': {}",
                template_dir.display(),
                e
            ),
        })?;

        info!(
            directory = %template_dir.display(),
            count = tera.get_template_names().count(),
            "Template directory loaded"
        );

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Templates from `template_dir`, falling back to the built-ins for
    /// any name the directory does not provide.
    pub fn with_overrides(template_dir: &Path) -> Result<Self, ProvisionError> {
        let builtin = Self::builtin()?;
        let overrides = Self::new(template_dir)?;

        let mut tera = (*overrides.tera).clone();
        tera.extend(&builtin.tera)
            .map_err(|e| ProvisionError::TemplateRender {
                message: format!("Failed to merge templates: {}", e),
            })?;

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template with the given context.
    ///
    /// # Arguments
    ///
    /// * `template_name` - Name of the template (e.g., "systemd/service.tera")
    /// * `context` - JSON value containing template variables
    pub fn render(
        &self,
        template_name: &str,
        context: &serde_json::Value,
    ) -> Result<String, ProvisionError> {
        let tera_context =
            Context::from_serialize(context).map_err(|e| ProvisionError::TemplateRender {
                message: format!("Invalid template context: {}", e),
            })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| ProvisionError::TemplateRender {
                message: format!("Failed to render template '{}': {}", template_name, render_cause(&e)),
            })
    }

    /// Check if a template exists.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Get the number of loaded templates.
    pub fn template_count(&self) -> usize {
        self.tera.get_template_names().count()
    }
}

/// Tera wraps the useful message (e.g. the missing variable) in its
/// source chain; flatten it into one line.
fn render_cause(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
