//! Prometheus Provisioner - installs and supervises Prometheus and Alertmanager.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prometheus_provisioner::config::Settings;
use prometheus_provisioner::converge::{ConvergeRunner, ResourceCollection};
use prometheus_provisioner::error::ProvisionError;
use prometheus_provisioner::executor::HostRunner;
use prometheus_provisioner::journal::{FileJournal, Journal, NullJournal};
use prometheus_provisioner::platform::Platform;
use prometheus_provisioner::recipes::{
    compile, render_artifacts, resolve_targets, RecipeContext, TargetSelection,
};
use prometheus_provisioner::resources::RunContext;
use prometheus_provisioner::templates::TemplateEngine;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

const DEFAULT_CONFIG_PATH: &str = "/etc/prometheus-provisioner/config.toml";

#[derive(Parser)]
#[command(name = "prometheus-provisioner", version, about = "Installs and supervises Prometheus and Alertmanager")]
struct Cli {
    /// Path to configuration file [default: /etc/prometheus-provisioner/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Attribute override, e.g. `prometheus.version=2.2.1` (repeatable)
    #[arg(short = 'o', long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Converge the host to the configured state
    Converge {
        /// Daemon to converge: prometheus, alertmanager or all
        #[arg(long, default_value = "all")]
        target: TargetSelection,

        /// Report what would change without changing anything
        #[arg(long)]
        why_run: bool,
    },
    /// Print every file a target would write
    Render {
        /// Daemon to render: prometheus, alertmanager or all
        #[arg(long)]
        target: TargetSelection,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let settings = match load_settings(cli.config.as_deref(), &cli.overrides) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    info!("Starting {} v{}", NAME, VERSION);

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, code = e.code(), "Provisioning failed");
            ExitCode::FAILURE
        }
    }
}

/// Load settings from `--config`, or from the default path when it exists.
///
/// A missing default file means built-in defaults; a missing explicit
/// file is an error.
fn load_settings(path: Option<&Path>, overrides: &[String]) -> Result<Settings, ProvisionError> {
    match path {
        Some(path) => Settings::load(path, overrides),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Settings::load(DEFAULT_CONFIG_PATH, overrides)
        }
        None => Settings::from_toml_str("", overrides),
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), ProvisionError> {
    let platform = Platform::detect(&settings.platform)?;
    info!(
        platform = %platform.id,
        family = %platform.family,
        arch = %platform.arch,
        init_style = %settings.common.init_style,
        "Platform detected"
    );

    let templates = TemplateEngine::builtin()?;
    let ctx = RecipeContext {
        settings,
        platform: &platform,
        templates: &templates,
    };

    match command {
        Command::Converge { target, why_run } => {
            let collection = compile_selection(&ctx, &target)?;
            converge(settings, platform.clone(), &collection, why_run)
        }
        Command::Render { target } => {
            let collection = compile_selection(&ctx, &target)?;
            for (path, content) in render_artifacts(&collection) {
                println!("==> {} <==", path.display());
                print!("{}", content);
                if !content.ends_with('\n') {
                    println!();
                }
            }
            Ok(())
        }
    }
}

fn compile_selection(
    ctx: &RecipeContext<'_>,
    selection: &TargetSelection,
) -> Result<ResourceCollection, ProvisionError> {
    let targets = resolve_targets(ctx.settings, ctx.platform, selection)?;
    compile(ctx, &targets)
}

fn converge(
    settings: &Settings,
    platform: Platform,
    collection: &ResourceCollection,
    why_run: bool,
) -> Result<(), ProvisionError> {
    let runner = ConvergeRunner::new(open_journal(settings));
    let ctx = RunContext::new(platform, Arc::new(HostRunner), why_run);

    let report = runner.run(collection, &ctx)?;
    println!("{}", report);
    Ok(())
}

/// The configured journal. A journal that cannot be opened is logged
/// and skipped; why-run still works on hosts where it is not writable.
fn open_journal(settings: &Settings) -> Arc<dyn Journal> {
    if !settings.journal.enabled {
        return Arc::new(NullJournal);
    }
    match FileJournal::new(&settings.journal.path) {
        Ok(journal) => Arc::new(journal),
        Err(e) => {
            warn!(
                path = %settings.journal.path.display(),
                error = %e,
                "Journal unavailable, continuing without it"
            );
            Arc::new(NullJournal)
        }
    }
}

/// Initialize logging based on settings.
///
/// Logs go to stderr so rendered artifacts and reports own stdout.
fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Default to pretty format
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
