//! Integration tests for the provisioner.
//!
//! These tests compile complete resource collections and converge them
//! into a temporary directory, recording every host command instead of
//! running it.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use nix::unistd::{getgid, getuid, Group, User};
use tempfile::TempDir;

use prometheus_provisioner::config::Settings;
use prometheus_provisioner::converge::{ConvergeRunner, ResourceCollection, RunReport};
use prometheus_provisioner::error::ProvisionError;
use prometheus_provisioner::executor::{CommandSpec, SubprocessResult, SystemRunner};
use prometheus_provisioner::journal::{FileJournal, NullJournal};
use prometheus_provisioner::platform::{Platform, PlatformFamily};
use prometheus_provisioner::recipes::{
    compile, declare_config, declare_install, declare_provision, render_artifacts,
    resolve_targets, RecipeContext, ServiceTarget, TargetSelection,
};
use prometheus_provisioner::resources::{
    sha256_file, ResourceId, RunContext, Service, Supports, SystemdProvider,
};
use prometheus_provisioner::templates::TemplateEngine;

/// Records command lines and reports success for all of them.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl SystemRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<SubprocessResult, ProvisionError> {
        self.calls.lock().unwrap().push(spec.to_string());
        Ok(SubprocessResult::ok(""))
    }
}

fn ubuntu() -> Platform {
    Platform::new("ubuntu", "16.04", PlatformFamily::Debian, "amd64")
}

/// A host rooted in a temporary directory, owned by the test user.
struct TestHost {
    root: TempDir,
    user: String,
    group: String,
    tarball: PathBuf,
}

impl TestHost {
    fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let user = User::from_uid(getuid()).unwrap().unwrap().name;
        let group = Group::from_gid(getgid()).unwrap().unwrap().name;

        let tarball = root.path().join("mirror").join("release.tar.gz");
        fs::create_dir_all(tarball.parent().unwrap()).unwrap();
        write_release(&tarball, "prometheus-2.2.1.linux-amd64", "prometheus");

        Self {
            root,
            user,
            group,
            tarball,
        }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Settings placing every daemon and system directory under the root.
    fn settings(&self, extra: &str) -> Settings {
        self.settings_with(extra, &[])
    }

    fn settings_with(&self, extra: &str, overrides: &[String]) -> Settings {
        let checksum = sha256_file(&self.tarball).unwrap();
        let toml = format!(
            r#"
            [paths]
            cache_dir = "{root}/cache"
            systemd_unit_dir = "{root}/systemd"
            upstart_job_dir = "{root}/init"
            init_script_dir = "{root}/init.d"
            sysconfig_root = "{root}/etc"
            runit_sv_dir = "{root}/sv"
            runit_service_dir = "{root}/service"

            [journal]
            path = "{root}/journal.log"

            [common]
            user = "{user}"
            group = "{group}"
            root_group = "{group}"

            [prometheus]
            dir = "{root}/opt/prometheus"
            log_dir = "{root}/log/prometheus"
            binary_url = "file://{tarball}"
            checksum = "{checksum}"

            [alertmanager]
            dir = "{root}/opt/alertmanager"
            log_dir = "{root}/log/alertmanager"
            binary_url = "file://{tarball}"
            checksum = "{checksum}"
            {extra}
            "#,
            root = self.root.path().display(),
            user = self.user,
            group = self.group,
            tarball = self.tarball.display(),
            checksum = checksum,
            extra = extra,
        );
        Settings::from_toml_str(&toml, overrides).unwrap()
    }
}

/// Write a gzipped release tarball holding `{top}/{binary}`.
fn write_release(path: &Path, top: &str, binary: &str) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    let content = b"#!/bin/sh\necho release\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, format!("{}/{}", top, binary), &content[..])
        .unwrap();

    builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
}

/// Provision, install and configure `name`, plus a systemd service.
///
/// Init artifacts are owned by root, so they are left out of runs that
/// write to disk.
fn collection_for(settings: &Settings, name: &str) -> ResourceCollection {
    let platform = ubuntu();
    let templates = TemplateEngine::builtin().unwrap();
    let ctx = RecipeContext {
        settings,
        platform: &platform,
        templates: &templates,
    };
    let targets: Vec<ServiceTarget> = resolve_targets(
        settings,
        &platform,
        &TargetSelection::Only(name.to_string()),
    )
    .unwrap();

    let mut collection = ResourceCollection::new();
    let target = &targets[0];
    declare_provision(&mut collection, &ctx, target).unwrap();
    declare_install(&mut collection, &ctx, target).unwrap();
    declare_config(&mut collection, &ctx, target).unwrap();
    collection
        .declare(Service::new(name, Box::new(SystemdProvider), Supports::ALL))
        .unwrap();
    collection
}

fn converge(
    collection: &ResourceCollection,
    runner: &Arc<RecordingRunner>,
    why_run: bool,
) -> Result<RunReport, ProvisionError> {
    let ctx = RunContext::new(ubuntu(), runner.clone(), why_run);
    ConvergeRunner::new(Arc::new(NullJournal)).run(collection, &ctx)
}

fn notifications(report: &RunReport) -> Vec<String> {
    report.notifications.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_binary_install_end_to_end() {
    let host = TestHost::new();
    let settings = host.settings("");
    let runner = Arc::new(RecordingRunner::default());

    let report = converge(&collection_for(&settings, "prometheus"), &runner, false).unwrap();

    let binary = host.path("opt/prometheus/prometheus");
    assert_eq!(fs::read_to_string(&binary).unwrap(), "#!/bin/sh\necho release\n");
    assert_eq!(fs::metadata(&binary).unwrap().permissions().mode() & 0o777, 0o755);
    assert!(host.path("cache/prometheus-2.2.1/prometheus").exists());
    assert!(host.path("opt/prometheus/data").is_dir());
    assert!(host.path("log/prometheus").is_dir());

    let config = fs::read_to_string(host.path("opt/prometheus/prometheus.yml")).unwrap();
    assert!(config.contains("scrape_interval: 15s"));

    // Binary swap and config change both fired; restart absorbs reload
    assert_eq!(notifications(&report), vec!["restart service[prometheus]"]);
    assert!(runner.calls().contains(&"systemctl restart prometheus".to_string()));
}

#[test]
fn test_second_run_is_unchanged() {
    let host = TestHost::new();
    let settings = host.settings("");
    let runner = Arc::new(RecordingRunner::default());
    let collection = collection_for(&settings, "prometheus");

    converge(&collection, &runner, false).unwrap();
    runner.clear();

    let report = converge(&collection, &runner, false).unwrap();
    assert!(report.is_unchanged(), "{}", report);
    assert!(!runner.calls().iter().any(|c| c.starts_with("systemctl restart")));
    assert!(!runner.calls().iter().any(|c| c.starts_with("systemctl reload")));
}

#[test]
fn test_config_change_reloads_prometheus() {
    let host = TestHost::new();
    let runner = Arc::new(RecordingRunner::default());
    converge(&collection_for(&host.settings(""), "prometheus"), &runner, false).unwrap();
    runner.clear();

    let changed = host.settings("[prometheus.template_vars]\nscrape_interval = \"1m\"\n");
    let report = converge(&collection_for(&changed, "prometheus"), &runner, false).unwrap();

    assert_eq!(
        report.updated(),
        vec![&ResourceId::new(
            "template",
            host.path("opt/prometheus/prometheus.yml").display().to_string()
        )]
    );
    assert_eq!(notifications(&report), vec!["reload service[prometheus]"]);
    assert!(runner.calls().contains(&"systemctl reload prometheus".to_string()));
}

#[test]
fn test_config_change_restarts_alertmanager() {
    let host = TestHost::new();
    write_release(&host.tarball, "alertmanager-0.14.0.linux-amd64", "alertmanager");
    let runner = Arc::new(RecordingRunner::default());
    converge(&collection_for(&host.settings(""), "alertmanager"), &runner, false).unwrap();
    runner.clear();

    let changed = host.settings("[alertmanager.template_vars]\nrepeat_interval = \"1h\"\n");
    let report = converge(&collection_for(&changed, "alertmanager"), &runner, false).unwrap();

    assert_eq!(notifications(&report), vec!["restart service[alertmanager]"]);
    let config = fs::read_to_string(host.path("opt/alertmanager/alertmanager.yml")).unwrap();
    assert!(config.contains("repeat_interval: 1h"));
}

#[test]
fn test_why_run_changes_nothing() {
    let host = TestHost::new();
    let runner = Arc::new(RecordingRunner::default());

    let report = converge(&collection_for(&host.settings(""), "prometheus"), &runner, true).unwrap();

    assert!(report.why_run);
    assert!(!report.updated().is_empty());
    assert_eq!(notifications(&report), vec!["restart service[prometheus]"]);
    assert!(!host.path("opt").exists());
    assert!(!host.path("cache").exists());
    assert!(!runner.calls().iter().any(|c| c.starts_with("systemctl restart")));
}

#[test]
fn test_checksum_mismatch_leaves_nothing_installed() {
    let host = TestHost::new();
    let settings = host.settings_with("", &[format!("alertmanager.checksum={}", "0".repeat(64))]);
    let runner = Arc::new(RecordingRunner::default());

    let err = converge(&collection_for(&settings, "alertmanager"), &runner, false).unwrap_err();

    assert!(matches!(err, ProvisionError::ChecksumMismatch { .. }), "{}", err);
    assert!(!host.path("cache/alertmanager-0.14.0").exists());
    assert!(!host.path("opt/alertmanager/alertmanager").exists());
    assert!(!host.path("opt/alertmanager/alertmanager.yml").exists());
}

#[test]
fn test_journal_records_run() {
    let host = TestHost::new();
    let settings = host.settings("");
    let journal = Arc::new(FileJournal::new(&settings.journal.path).unwrap());
    let ctx = RunContext::new(ubuntu(), Arc::new(RecordingRunner::default()), false);

    ConvergeRunner::new(journal)
        .run(&collection_for(&settings, "prometheus"), &ctx)
        .unwrap();

    let lines: Vec<serde_json::Value> = fs::read_to_string(&settings.journal.path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["event"], "run_started");
    assert_eq!(lines.last().unwrap()["event"], "run_finished");
    assert!(lines
        .iter()
        .any(|l| l["event"] == "notify" && l["resource"] == "restart service[prometheus]"));
    assert!(lines.iter().all(|l| l["run_id"] == ctx.run_id.to_string()));
}

fn rendered(settings: &Settings, platform: &Platform, selection: &str) -> Vec<(PathBuf, String)> {
    let templates = TemplateEngine::builtin().unwrap();
    let ctx = RecipeContext {
        settings,
        platform,
        templates: &templates,
    };
    let targets = resolve_targets(settings, platform, &selection.parse::<TargetSelection>().unwrap()).unwrap();
    render_artifacts(&compile(&ctx, &targets).unwrap())
}

fn artifact(artifacts: &[(PathBuf, String)], path: &str) -> String {
    artifacts
        .iter()
        .find(|(p, _)| p == Path::new(path))
        .map(|(_, content)| content.clone())
        .unwrap_or_else(|| panic!("{} not rendered", path))
}

#[test]
fn test_systemd_alertmanager_unit() {
    let settings = Settings::from_toml_str(
        r#"
        [alertmanager]
        binary = "/tmp/alertmanager"
        storage_path = "/tmp/alertmanager_data"
        config_file = "/tmp/alertmanager.conf"

        [prometheus.flags]
        "alertmanager.url" = "http://0.0.0.0:8080"
        "#,
        &[],
    )
    .unwrap();

    let artifacts = rendered(&settings, &ubuntu(), "alertmanager");
    let unit = artifact(&artifacts, "/etc/systemd/system/alertmanager.service");

    assert!(unit.contains("ExecStart=/tmp/alertmanager \\\n"));
    assert!(unit.contains("-storage.path=/tmp/alertmanager_data \\\n"));
    assert!(unit.contains("-config.file=/tmp/alertmanager.conf \\\n"));
    assert!(unit.contains("-web.external-url=http://0.0.0.0:8080"));
    assert!(unit.contains("User=prometheus"));
    assert!(unit.contains("Group=prometheus"));
}

#[test]
fn test_upstart_alertmanager_job() {
    let settings = Settings::from_toml_str(
        "[common]\ninit_style = \"upstart\"\nuser = \"prom_user\"\ngroup = \"prom_group\"\n",
        &[],
    )
    .unwrap();

    let artifacts = rendered(&settings, &ubuntu(), "alertmanager");
    let job = artifact(&artifacts, "/etc/init/alertmanager.conf");

    assert!(job.contains("setuid prom_user"));
    assert!(job.contains("setgid prom_group"));
    assert!(job.contains("exec >> \"/var/log/alertmanager/alertmanager.log\""));
    assert_eq!(artifacts.len(), 2);
}

#[test]
fn test_pinned_release_url() {
    let settings = Settings::from_toml_str("", &[]).unwrap();
    let targets = resolve_targets(
        &settings,
        &ubuntu(),
        &TargetSelection::Only("prometheus".to_string()),
    )
    .unwrap();

    assert_eq!(
        targets[0].binary_url,
        "https://github.com/prometheus/prometheus/releases/download/v2.2.1/prometheus-2.2.1.linux-amd64.tar.gz"
    );
    assert_eq!(
        targets[0].checksum.as_deref(),
        Some("ec1798dbda1636f49d709c3931078dc17eafef76c480b67751aa09828396cf31")
    );
}

#[test]
fn test_unsupported_family_for_systemd() {
    let settings = Settings::from_toml_str("", &[]).unwrap();
    let platform = Platform::new(
        "alpine",
        "3.7",
        PlatformFamily::Other("alpine".to_string()),
        "amd64",
    );
    let templates = TemplateEngine::builtin().unwrap();
    let ctx = RecipeContext {
        settings: &settings,
        platform: &platform,
        templates: &templates,
    };
    let targets = resolve_targets(&settings, &platform, &TargetSelection::All).unwrap();

    let err = compile(&ctx, &targets).err().unwrap();
    assert!(matches!(err, ProvisionError::UnsupportedPlatform { .. }));

    // Other init styles do not need an environment file
    let runit = Settings::from_toml_str("[common]\ninit_style = \"runit\"\n", &[]).unwrap();
    let ctx = RecipeContext {
        settings: &runit,
        platform: &platform,
        templates: &templates,
    };
    assert!(compile(&ctx, &targets).is_ok());
}
