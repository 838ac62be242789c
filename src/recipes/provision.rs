//! Service account and directories.

use crate::converge::ResourceCollection;
use crate::error::ProvisionError;
use crate::resources::{Directory, Ownership, SystemGroup, SystemUser};

use super::{RecipeContext, ServiceTarget};

const DIRECTORY_MODE: u32 = 0o755;

/// Declare the system group and user, then the target's directories.
///
/// The account is shared by every target; only the first declaration
/// counts, so its home is the first target's directory.
pub fn declare_provision(
    collection: &mut ResourceCollection,
    _ctx: &RecipeContext<'_>,
    target: &ServiceTarget,
) -> Result<(), ProvisionError> {
    collection.declare_shared(SystemGroup::new(&target.group));
    collection.declare_shared(SystemUser::new(&target.user, &target.group, &target.dir));

    let ownership = Ownership::new(&target.user, &target.group, DIRECTORY_MODE);
    for path in [&target.dir, &target.log_dir, &target.storage_path] {
        collection.declare_shared(Directory::new(path.clone(), ownership.clone()));
    }

    Ok(())
}
