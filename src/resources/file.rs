//! Rendered files with atomic write semantics.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ProvisionError;
use crate::templates::TemplateEngine;

use super::ownership::Ownership;
use super::traits::Resource;
use super::types::{Outcome, RunContext};

/// Write `path` atomically.
///
/// `fill` writes the content into a uniquely named temporary file next
/// to `path`; the file is synced, given its ownership and mode, and then
/// renamed over the target so readers never see a partial file.
pub fn write_atomic<F>(path: &Path, ownership: &Ownership, fill: F) -> Result<(), ProvisionError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    // Random suffix and O_EXCL so a pre-created symlink cannot be followed
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        Uuid::new_v4().simple()
    );
    let temp_path = path.with_file_name(temp_name);

    let result = (|| -> Result<(), ProvisionError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        fill(&mut file)?;
        file.sync_all()?;
        ownership.apply(&temp_path)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// A file rendered from a template.
///
/// Rendering happens when the resource is declared, so a broken template
/// fails the run before anything is changed.
pub struct TemplateFile {
    path: PathBuf,
    source: String,
    content: String,
    ownership: Ownership,
}

impl TemplateFile {
    pub fn render(
        engine: &TemplateEngine,
        source: &str,
        context: &serde_json::Value,
        path: PathBuf,
        ownership: Ownership,
    ) -> Result<Self, ProvisionError> {
        let content = engine.render(source, context)?;
        Ok(Self {
            path,
            source: source.to_string(),
            content,
            ownership,
        })
    }
}

impl Resource for TemplateFile {
    fn kind(&self) -> &'static str {
        "template"
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn converge(&self, ctx: &RunContext) -> Result<Outcome, ProvisionError> {
        let current = match fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if current.as_deref() == Some(self.content.as_bytes()) {
            if !self.ownership.differs(&self.path)? {
                return Ok(Outcome::Unchanged);
            }
            if !ctx.why_run {
                self.ownership.apply(&self.path)?;
            }
            return Ok(Outcome::Updated);
        }

        if ctx.why_run {
            debug!(path = %self.path.display(), "Would render template");
            return Ok(Outcome::Updated);
        }

        write_atomic(&self.path, &self.ownership, |file| {
            file.write_all(self.content.as_bytes())
        })?;

        info!(
            path = %self.path.display(),
            template = %self.source,
            bytes = self.content.len(),
            "Template rendered"
        );

        Ok(Outcome::Updated)
    }

    fn rendered(&self) -> Option<(&Path, &str)> {
        Some((&self.path, &self.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::fake::FakeRunner;
    use crate::platform::{Platform, PlatformFamily};
    use crate::resources::ownership::test_support::current_ownership;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    fn context(why_run: bool) -> RunContext {
        RunContext::new(
            Platform::new("ubuntu", "16.04", PlatformFamily::Debian, "amd64"),
            Arc::new(FakeRunner::new()),
            why_run,
        )
    }

    fn runit_log_template(path: PathBuf) -> TemplateFile {
        TemplateFile::render(
            &TemplateEngine::builtin().unwrap(),
            "runit/log-run.tera",
            &serde_json::json!({"log_dir": "/var/log/prometheus"}),
            path,
            current_ownership(0o755),
        )
        .unwrap()
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "old").unwrap();

        write_atomic(&path, &current_ownership(0o640), |f| f.write_all(b"new")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o7777, 0o640);
        // No temp files left behind
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_cleans_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let result = write_atomic(&path, &current_ownership(0o644), |_| {
            Err(std::io::Error::other("boom"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_template_converges_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log/run");
        let resource = runit_log_template(path.clone());

        assert_eq!(resource.id().to_string(), format!("template[{}]", path.display()));
        assert_eq!(resource.converge(&context(false)).unwrap(), Outcome::Updated);
        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("exec svlogd -tt /var/log/prometheus"));
        assert_eq!(resource.converge(&context(false)).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn test_template_why_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run");
        let resource = runit_log_template(path.clone());

        assert_eq!(resource.converge(&context(true)).unwrap(), Outcome::Updated);
        assert!(!path.exists());
    }

    #[test]
    fn test_template_fixes_mode_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run");
        let resource = runit_log_template(path.clone());
        resource.converge(&context(false)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        assert_eq!(resource.converge(&context(false)).unwrap(), Outcome::Updated);
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o7777, 0o755);
    }
}
