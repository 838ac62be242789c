//! Delayed notification queue.

use crate::resources::{Notification, ServiceAction};

/// Notifications waiting for the end of the run.
///
/// Each `(target, action)` pair is queued once, in first-queued order. A
/// restart absorbs a reload of the same target, whichever came first.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        if self.pending.contains(&notification) {
            return;
        }

        match notification.action {
            ServiceAction::Reload => {
                let restart_queued = self.pending.iter().any(|n| {
                    n.target == notification.target && n.action == ServiceAction::Restart
                });
                if restart_queued {
                    return;
                }
            }
            ServiceAction::Restart => {
                if let Some(reload) = self.pending.iter_mut().find(|n| {
                    n.target == notification.target && n.action == ServiceAction::Reload
                }) {
                    reload.action = ServiceAction::Restart;
                    return;
                }
            }
            ServiceAction::Enable | ServiceAction::Start => {}
        }

        self.pending.push(notification);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued notification in delivery order.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }
}
