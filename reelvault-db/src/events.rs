//! Model change notifications.
//!
//! Repositories publish a [`ModelEvent`] after each single-entity insert,
//! update or delete has been applied. Delivery is fire-and-forget: a sink
//! that cannot deliver drops the event.

use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelAction {
    Created,
    Updated,
    Deleted,
}

/// One entity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEvent {
    pub table: &'static str,
    pub id: i64,
    pub action: ModelAction,
}

/// Receiver of model events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ModelEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: ModelEvent) {}
}

impl EventSink for Sender<ModelEvent> {
    fn publish(&self, event: ModelEvent) {
        if self.send(event).is_err() {
            log::debug!("Model event dropped, receiver is gone");
        }
    }
}
