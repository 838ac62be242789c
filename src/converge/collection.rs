//! The ordered resource collection.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ProvisionError;
use crate::resources::{Notification, Resource, ResourceId, ServiceAction};

/// A declared resource and the notifications it sends when updated.
pub struct Declaration {
    resource: Box<dyn Resource>,
    id: ResourceId,
    notifies: Vec<Notification>,
}

impl Declaration {
    /// Queue `action` on `target` whenever this resource is updated.
    pub fn notifies(&mut self, action: ServiceAction, target: ResourceId) -> &mut Self {
        let notification = Notification::new(action, target);
        if !self.notifies.contains(&notification) {
            self.notifies.push(notification);
        }
        self
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifies
    }
}

/// Resources in declaration order, unique by id.
#[derive(Default)]
pub struct ResourceCollection {
    declarations: Vec<Declaration>,
    index: HashMap<ResourceId, usize>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource. Declaring the same id twice is an error.
    pub fn declare<R: Resource + 'static>(
        &mut self,
        resource: R,
    ) -> Result<&mut Declaration, ProvisionError> {
        let id = resource.id();
        if self.index.contains_key(&id) {
            return Err(ProvisionError::config(format!(
                "Resource {} declared more than once",
                id
            )));
        }
        Ok(self.push(id, Box::new(resource)))
    }

    /// Declare a resource shared between targets, such as a build package
    /// or the service account. Returns `None` when it is already declared.
    pub fn declare_shared<R: Resource + 'static>(&mut self, resource: R) -> Option<&mut Declaration> {
        let id = resource.id();
        if self.index.contains_key(&id) {
            debug!(resource = %id, "Shared resource already declared");
            return None;
        }
        Some(self.push(id, Box::new(resource)))
    }

    fn push(&mut self, id: ResourceId, resource: Box<dyn Resource>) -> &mut Declaration {
        let position = self.declarations.len();
        self.index.insert(id.clone(), position);
        self.declarations.push(Declaration {
            resource,
            id,
            notifies: Vec::new(),
        });
        &mut self.declarations[position]
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Declaration> {
        self.index.get(id).map(|&i| &self.declarations[i])
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn ids(&self) -> Vec<&ResourceId> {
        self.declarations.iter().map(|d| &d.id).collect()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Check every notification points at a declared resource that
    /// accepts notifications.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        for declaration in &self.declarations {
            for notification in &declaration.notifies {
                let target = self.get(&notification.target).ok_or_else(|| {
                    ProvisionError::config(format!(
                        "{} notifies undeclared resource {}",
                        declaration.id, notification.target
                    ))
                })?;
                if !target.resource.accepts_notifications() {
                    return Err(ProvisionError::config(format!(
                        "{} notifies {}, which does not accept notifications",
                        declaration.id, notification.target
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use crate::error::ProvisionError;
    use crate::resources::{Outcome, Resource, RunContext, ServiceAction};

    /// A resource with a scripted outcome that records what happened to it.
    pub struct Scripted {
        pub kind: &'static str,
        pub name: String,
        pub outcome: Result<Outcome, &'static str>,
        pub log: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        pub fn new(kind: &'static str, name: &str, outcome: Outcome, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                kind,
                name: name.to_string(),
                outcome: Ok(outcome),
                log: log.clone(),
            }
        }

        pub fn failing(kind: &'static str, name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                kind,
                name: name.to_string(),
                outcome: Err("scripted failure"),
                log: log.clone(),
            }
        }
    }

    impl Resource for Scripted {
        fn kind(&self) -> &'static str {
            self.kind
        }

        fn name(&self) -> String {
            self.name.clone()
        }

        fn converge(&self, _ctx: &RunContext) -> Result<Outcome, ProvisionError> {
            self.log.lock().unwrap().push(format!("converge {}", self.id()));
            self.outcome.map_err(ProvisionError::execution)
        }

        fn handle(&self, _ctx: &RunContext, action: ServiceAction) -> Result<(), ProvisionError> {
            self.log.lock().unwrap().push(format!("{} {}", action, self.id()));
            Ok(())
        }

        fn accepts_notifications(&self) -> bool {
            self.kind == "service"
        }
    }
}
