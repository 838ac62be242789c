//! Daemon registry.
//!
//! Central registry for all daemon definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::alertmanager::AlertmanagerDaemon;
use super::prometheus::PrometheusDaemon;
use super::traits::DaemonDefinition;

/// Registry of all manageable daemons.
pub struct DaemonRegistry {
    daemons: BTreeMap<&'static str, Arc<dyn DaemonDefinition>>,
}

impl DaemonRegistry {
    /// Create a new registry with all built-in daemons.
    pub fn new() -> Self {
        let mut registry = Self {
            daemons: BTreeMap::new(),
        };

        registry.register(Arc::new(PrometheusDaemon));
        registry.register(Arc::new(AlertmanagerDaemon));

        debug!(count = registry.daemons.len(), "Daemon registry initialized");

        registry
    }

    fn register(&mut self, daemon: Arc<dyn DaemonDefinition>) {
        self.daemons.insert(daemon.name(), daemon);
    }

    /// Get a daemon definition by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DaemonDefinition>> {
        self.daemons.get(name).cloned()
    }

    /// All registered daemons, in convergence order (Prometheus first).
    pub fn all(&self) -> Vec<Arc<dyn DaemonDefinition>> {
        let mut daemons: Vec<_> = self.daemons.values().cloned().collect();
        daemons.sort_by_key(|d| d.name() != "prometheus");
        daemons
    }

    /// List all registered daemon names.
    pub fn list(&self) -> Vec<&'static str> {
        self.daemons.keys().copied().collect()
    }
}

impl Default for DaemonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_daemons() {
        let registry = DaemonRegistry::new();
        assert!(registry.get("prometheus").is_some());
        assert!(registry.get("alertmanager").is_some());
        assert!(registry.get("pushgateway").is_none());
    }

    #[test]
    fn test_prometheus_converges_first() {
        let names: Vec<_> = DaemonRegistry::new()
            .all()
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(names, vec!["prometheus", "alertmanager"]);
    }
}
