//! Init-system integration: supervision artifacts plus the service.

use std::path::PathBuf;

use tracing::debug;

use crate::config::InitStyle;
use crate::converge::ResourceCollection;
use crate::error::ProvisionError;
use crate::platform::PlatformFamily;
use crate::resources::{
    Directory, Ownership, Package, ResourceId, RunitProvider, Service, ServiceAction, Supports,
    SysvProvider, SystemdProvider, TemplateFile, UpstartProvider,
};

use super::{RecipeContext, ServiceTarget};

const FILE_MODE: u32 = 0o644;
const EXECUTABLE_MODE: u32 = 0o755;

/// Owner of every init-system artifact.
const ARTIFACT_OWNER: &str = "root";

/// Declare the artifacts of the configured init style, then
/// `service[{name}]`, which is enabled and started.
pub fn declare_init(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    let style = ctx.settings.common.init_style;
    debug!(target = %target.name, init_style = %style, "Declaring init integration");

    let service = match style {
        InitStyle::Runit => declare_runit(collection, ctx, target)?,
        InitStyle::Systemd => declare_systemd(collection, ctx, target)?,
        InitStyle::Upstart => declare_upstart(collection, ctx, target)?,
        InitStyle::Legacy => declare_sysv(collection, ctx, target)?,
    };
    collection.declare(service)?;

    Ok(())
}

/// Environment file location and template for systemd units on the
/// host's platform family.
pub fn env_file(
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(PathBuf, &'static str), ProvisionError> {
    let root = &ctx.settings.paths.sysconfig_root;
    let sysconfig = root.join("sysconfig").join(&target.name);
    let default = root.join("default").join(&target.name);

    match &ctx.platform.family {
        PlatformFamily::Fedora => Ok((sysconfig, "fedora/sysconfig.tera")),
        PlatformFamily::Rhel => Ok((sysconfig, "redhat/sysconfig.tera")),
        PlatformFamily::Debian => Ok((default, "debian/default.tera")),
        PlatformFamily::Amazon => Ok((default, "amazon/default.tera")),
        PlatformFamily::Other(family) => Err(ProvisionError::UnsupportedPlatform {
            platform: family.clone(),
            context: format!("the {} systemd environment file", target.name),
        }),
    }
}

/// Render `source` to `path` and have it restart the service on change.
fn declare_artifact(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
    source: &str,
    context: &serde_json::Value,
    path: PathBuf,
    mode: u32,
) -> Result<(), ProvisionError> {
    let ownership = Ownership::new(ARTIFACT_OWNER, &ctx.settings.common.root_group, mode);
    let file = TemplateFile::render(ctx.templates, source, context, path, ownership)?;
    collection
        .declare(file)?
        .notifies(ServiceAction::Restart, ResourceId::service(&target.name));
    Ok(())
}

fn declare_systemd(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<Service, ProvisionError> {
    let (env_path, env_template) = env_file(ctx, target)?;
    let context = target.init_context(Some(env_path.as_path()));

    let unit = ctx
        .settings
        .paths
        .systemd_unit_dir
        .join(format!("{}.service", target.name));
    declare_artifact(collection, ctx, target, "systemd/service.tera", &context, unit, FILE_MODE)?;
    declare_artifact(collection, ctx, target, env_template, &context, env_path, FILE_MODE)?;

    Ok(Service::new(&target.name, Box::new(SystemdProvider), Supports::ALL))
}

fn declare_upstart(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<Service, ProvisionError> {
    let job = ctx
        .settings
        .paths
        .upstart_job_dir
        .join(format!("{}.conf", target.name));
    declare_artifact(
        collection,
        ctx,
        target,
        "upstart/job.conf.tera",
        &target.init_context(None),
        job,
        FILE_MODE,
    )?;

    Ok(Service::new(&target.name, Box::new(UpstartProvider), Supports::NO_RELOAD))
}

fn declare_sysv(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<Service, ProvisionError> {
    let paths = &ctx.settings.paths;
    if ctx.platform.is_amazon() {
        collection.declare_shared(Package::new("chkconfig", target.install_timeout));
    }

    declare_artifact(
        collection,
        ctx,
        target,
        "sysv/init.tera",
        &target.init_context(None),
        paths.init_script_dir.join(&target.name),
        EXECUTABLE_MODE,
    )?;

    let provider = SysvProvider::new(&paths.init_script_dir, &paths.sysv_rc_dir);
    Ok(Service::new(&target.name, Box::new(provider), Supports::ALL))
}

fn declare_runit(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<Service, ProvisionError> {
    let paths = &ctx.settings.paths;
    collection.declare_shared(Package::new("runit", target.install_timeout));

    let sv_dir = paths.runit_sv_dir.join(&target.name);
    let ownership = Ownership::new(
        ARTIFACT_OWNER,
        &ctx.settings.common.root_group,
        EXECUTABLE_MODE,
    );
    collection.declare(Directory::new(sv_dir.clone(), ownership.clone()))?;
    collection.declare(Directory::new(sv_dir.join("log"), ownership))?;

    let context = target.init_context(None);
    declare_artifact(
        collection,
        ctx,
        target,
        "runit/run.tera",
        &context,
        sv_dir.join("run"),
        EXECUTABLE_MODE,
    )?;
    declare_artifact(
        collection,
        ctx,
        target,
        "runit/log-run.tera",
        &context,
        sv_dir.join("log").join("run"),
        EXECUTABLE_MODE,
    )?;

    let provider = RunitProvider::new(&paths.runit_sv_dir, &paths.runit_service_dir);
    Ok(Service::new(&target.name, Box::new(provider), Supports::ALL))
}
