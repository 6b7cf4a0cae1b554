//! In-memory audit log

use std::sync::Mutex;

use crate::events::{AccessEvent, EventSink};

/// Append-only event log held in memory
#[derive(Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<AccessEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events, oldest first
    pub fn events(&self) -> Vec<AccessEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&self, event: AccessEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event);
    }
}
