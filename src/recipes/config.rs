//! The daemon's main configuration file.

use std::borrow::Cow;

use tracing::debug;

use crate::converge::ResourceCollection;
use crate::error::ProvisionError;
use crate::resources::{Ownership, ResourceId, TemplateFile};
use crate::templates::TemplateEngine;

use super::{RecipeContext, ServiceTarget};

const CONFIG_MODE: u32 = 0o644;

/// Declare `config_path`, rendered from the target's config template.
///
/// Templates come from `config_template_dir` when set, falling back to
/// the built-in set. A content change notifies the service with the
/// daemon's config-change action.
pub fn declare_config(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    let engine = match &target.config_template_dir {
        Some(dir) => {
            debug!(target = %target.name, directory = %dir.display(), "Using external config templates");
            Cow::Owned(TemplateEngine::with_overrides(dir)?)
        }
        None => Cow::Borrowed(ctx.templates),
    };

    let file = TemplateFile::render(
        &engine,
        &target.config_template,
        &target.config_context(),
        target.config_path.clone(),
        Ownership::new(&target.user, &target.group, CONFIG_MODE),
    )?;

    collection
        .declare(file)?
        .notifies(target.config_change_action, ResourceId::service(&target.name));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::test_support::Fixture;

    fn rendered(fixture: &Fixture, name: &str) -> (Vec<String>, String) {
        let mut collection = ResourceCollection::new();
        let target = fixture.target(name);
        declare_config(&mut collection, &fixture.ctx(), &target).unwrap();
        let declaration = collection
            .get(&ResourceId::new("template", target.config_path.display().to_string()))
            .unwrap();
        let content = declaration.resource().rendered().unwrap().1.to_string();
        let notifications = declaration
            .notifications()
            .iter()
            .map(|n| n.to_string())
            .collect();
        (notifications, content)
    }

    #[test]
    fn test_prometheus_config_reloads() {
        let fixture = Fixture::new("[prometheus.template_vars]\nscrape_interval = \"30s\"\n");
        let (notifications, content) = rendered(&fixture, "prometheus");
        assert_eq!(notifications, vec!["reload service[prometheus]"]);
        assert!(content.contains("scrape_interval: 30s"));
    }

    #[test]
    fn test_alertmanager_config_restarts() {
        let fixture = Fixture::new("");
        let (notifications, content) = rendered(&fixture, "alertmanager");
        assert_eq!(notifications, vec!["restart service[alertmanager]"]);
        assert!(content.contains("receiver"));
    }

    #[test]
    fn test_template_vars_quoted_in_yaml() {
        let fixture = Fixture::new(
            r#"
            [prometheus.template_vars]
            job_name = 'say "hi"'
            scrape_targets = ["localhost:9090\"\nrule_files: [x]"]

            [alertmanager.template_vars]
            receiver = 'ops\team'
            group_by = ['alert"name']
            webhook_url = 'http://hooks/x"y'
            "#,
        );

        let (_, content) = rendered(&fixture, "prometheus");
        assert!(content.contains(r#"job_name: "say \"hi\"""#));
        assert!(content.contains(r#"- "localhost:9090\"\nrule_files: [x]""#));
        assert!(!content.contains("\nrule_files: [x]"));

        let (_, content) = rendered(&fixture, "alertmanager");
        assert!(content.contains(r#"receiver: "ops\\team""#));
        assert!(content.contains(r#"group_by: ["alert\"name"]"#));
        assert!(content.contains(r#"url: "http://hooks/x\"y""#));
    }

    #[test]
    fn test_external_template_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.yml.tera"),
            "# {{ name }} {{ vars.job_name }}\n",
        )
        .unwrap();

        let fixture = Fixture::new(&format!(
            "[prometheus]\nconfig_template_dir = \"{}\"\nconfig_template = \"custom.yml.tera\"\n",
            dir.path().display()
        ));
        let (_, content) = rendered(&fixture, "prometheus");
        assert_eq!(content, "# prometheus prometheus\n");
    }

    #[test]
    fn test_missing_template_fails_at_declaration() {
        let fixture = Fixture::new("[prometheus]\nconfig_template = \"missing.yml.tera\"\n");
        let mut collection = ResourceCollection::new();
        let err = declare_config(&mut collection, &fixture.ctx(), &fixture.target("prometheus"))
            .unwrap_err();
        assert_eq!(err.code(), "TEMPLATE_RENDER");
        assert!(collection.is_empty());
    }
}
