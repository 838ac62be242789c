//! Resources: the units of desired host state a convergence applies.
//!
//! ## Adding a New Resource
//!
//! 1. Create a new file in this directory (e.g., `cron.rs`)
//! 2. Implement the `Resource` trait, honoring why-run mode
//! 3. Declare it from a recipe in `crate::recipes`

mod account;
mod archive;
mod digest;
mod directory;
mod execute;
mod file;
mod git;
mod install;
mod ownership;
mod package;
mod service;
mod traits;
mod types;

pub use account::{SystemGroup, SystemUser};
pub use archive::ReleaseArchive;
pub use digest::sha256_file;
pub use directory::Directory;
pub use execute::BuildCommand;
pub use file::{write_atomic, TemplateFile};
pub use git::GitCheckout;
pub use install::InstalledFile;
pub use ownership::Ownership;
pub use package::Package;
pub use service::{
    RunitProvider, Service, ServiceProvider, Supports, SysvProvider, SystemdProvider,
    UpstartProvider,
};
pub use traits::Resource;
pub use types::{Notification, Outcome, ResourceId, RunContext, ServiceAction};

#[cfg(test)]
pub(crate) use archive::test_support::write_tarball;
#[cfg(test)]
pub(crate) use ownership::test_support::current_ownership;
