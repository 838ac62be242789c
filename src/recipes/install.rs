//! Install strategy: package, release archive or source build.

use std::path::PathBuf;

use tracing::debug;

use crate::config::InstallMethod;
use crate::converge::ResourceCollection;
use crate::error::ProvisionError;
use crate::platform::PlatformFamily;
use crate::resources::{
    BuildCommand, GitCheckout, InstalledFile, Ownership, Package, ReleaseArchive, ResourceId,
    ServiceAction,
};

use super::{RecipeContext, ServiceTarget};

const BINARY_MODE: u32 = 0o755;

/// Declare the resources of the target's install method, and only those.
///
/// Whatever puts a new binary in place notifies a restart of the service.
pub fn declare_install(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    debug!(target = %target.name, method = %target.install_method, "Declaring install");
    match target.install_method {
        InstallMethod::Package => declare_package(collection, target),
        InstallMethod::Binary => declare_binary(collection, ctx, target),
        InstallMethod::Source => declare_source(collection, ctx, target),
    }
}

fn declare_package(
    collection: &mut ResourceCollection,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    collection
        .declare(Package::new(&target.package_name, target.install_timeout))?
        .notifies(ServiceAction::Restart, ResourceId::service(&target.name));
    Ok(())
}

fn declare_binary(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    let checksum = target.checksum.as_deref().ok_or_else(|| {
        ProvisionError::config(format!("{} has no release checksum", target.name))
    })?;

    let archive = ReleaseArchive::new(
        &target.release_name(),
        &target.binary_url,
        checksum,
        &target.file_extension,
        &ctx.settings.paths.cache_dir,
        target.install_timeout,
    );
    let extracted_binary = archive.extracted_dir().join(&target.name);
    collection.declare(archive)?;

    declare_binary_copy(collection, target, extracted_binary)
}

fn declare_source(
    collection: &mut ResourceCollection,
    ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    for package in build_packages(&ctx.platform.family) {
        collection.declare_shared(Package::new(package, target.install_timeout));
    }

    let checkout = ctx.settings.paths.cache_dir.join(target.release_name());
    collection.declare(GitCheckout::new(
        checkout.clone(),
        &target.source_repository,
        &format!("v{}", target.version),
        target.install_timeout,
    ))?;

    let built_binary = checkout.join(&target.name);
    collection.declare(BuildCommand::new(
        &format!("compile_{}_source", target.name),
        &target.name,
        &target.build_command,
        checkout,
        built_binary.clone(),
        target.install_timeout,
    ))?;

    declare_binary_copy(collection, target, built_binary)
}

fn declare_binary_copy(
    collection: &mut ResourceCollection,
    target: &ServiceTarget,
    source: PathBuf,
) -> Result<(), ProvisionError> {
    let ownership = Ownership::new(&target.user, &target.group, BINARY_MODE);
    collection
        .declare(InstalledFile::new(target.binary_path.clone(), source, ownership))?
        .notifies(ServiceAction::Restart, ResourceId::service(&target.name));
    Ok(())
}

/// Toolchain packages a source build needs on `family`.
fn build_packages(family: &PlatformFamily) -> Vec<&'static str> {
    let mut packages = match family {
        PlatformFamily::Debian => vec!["build-essential"],
        _ => vec!["gcc", "make"],
    };
    packages.extend(["curl", "git", "mercurial", "gzip", "sed"]);
    packages.push(match family {
        PlatformFamily::Debian => "golang-go",
        _ => "golang",
    });
    packages
}
