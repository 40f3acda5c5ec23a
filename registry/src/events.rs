//! Notifications emitted by the registry for subscribers.

use std::sync::Mutex;

use tally_types::{AccountId, RecordId, VoteCategory};

/// Registry-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A record was validated and catalogued.
    RecordCreated {
        id: RecordId,
        /// Value of the schema's title field.
        title: String,
        creator: AccountId,
    },
    /// An account cast a new vote or changed its vote.
    VoteCast {
        record_id: RecordId,
        voter: AccountId,
        category: VoteCategory,
    },
}

/// Anything that receives registry notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &RegistryEvent);
}

/// Synchronous fan-out event bus for registry events.
///
/// Listeners are invoked inline while the registry's write lock is held, so
/// they observe events in commit order. They must not call back into the
/// registry's write operations.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&RegistryEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &RegistryEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for EventBus {
    fn notify(&self, event: &RegistryEvent) {
        self.emit(event);
    }
}

/// Append-only in-memory notification log.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<RegistryEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event received so far, oldest first.
    pub fn events(&self) -> Vec<RegistryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for EventLog {
    fn notify(&self, event: &RegistryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
