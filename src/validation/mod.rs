//! Input validation module.
//!
//! Provides validators for account names, paths, release versions and
//! checksums, and the CLI flags rendered into supervision files.

mod flags;
mod names;
mod path;
mod release;

pub use flags::validate_flag;
pub use names::validate_account_name;
pub use path::validate_absolute_path;
pub use release::{validate_checksum, validate_version};
