//! Daemon definitions module.
//!
//! Contains daemon definitions and the daemon registry.
//!
//! ## Adding a New Daemon
//!
//! 1. Create a new file in this directory (e.g., `pushgateway.rs`)
//! 2. Implement the `DaemonDefinition` trait
//! 3. Register the daemon in `DaemonRegistry::new()`

mod alertmanager;
mod prometheus;
mod registry;
mod traits;

pub use alertmanager::AlertmanagerDaemon;
pub use prometheus::PrometheusDaemon;
pub use registry::DaemonRegistry;
pub use traits::DaemonDefinition;
