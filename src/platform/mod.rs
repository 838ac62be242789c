//! Host platform detection.
//!
//! Resolves the distribution, platform family and release architecture
//! that drive package names, package managers and environment file
//! locations.

mod detect;

pub use detect::{parse_os_release, Platform, PlatformFamily};
