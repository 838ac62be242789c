//! Convergence: the ordered resource collection and the runner that
//! applies it with delayed, de-duplicated notifications.

mod collection;
mod queue;
mod report;
mod runner;

pub use collection::{Declaration, ResourceCollection};
pub use queue::NotificationQueue;
pub use report::{ResourceReport, RunReport};
pub use runner::ConvergeRunner;
