//! Event ordering history

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::events::{Event, EventPriority};

/// What was seen for one build
#[derive(Debug, Clone)]
pub struct EventHistoryEntry {
    pub last_event: Event,
    pub consequent_accepted: bool,
    seq: u64,
}

/// Per-build record of accepted events, bounded to `capacity` builds
pub struct EventHistory {
    entries: RwLock<HashMap<u64, EventHistoryEntry>>,
    capacity: u64,
    seq: AtomicU64,
}

impl EventHistory {
    /// Create a new event history
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            seq: AtomicU64::new(0),
        }
    }

    /// Record `event` for `build_id`, returning `false` if it arrived out of order
    pub fn accept(&self, build_id: u64, event: Event) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        if let Some(entry) = entries.get_mut(&build_id) {
            if event.priority() == EventPriority::First && entry.consequent_accepted {
                return false;
            }
            entry.last_event = event;
            entry.consequent_accepted |= event.is_consequent_task();
            entry.seq = seq;
            return true;
        }

        // Evict oldest if at capacity
        if entries.len() as u64 >= self.capacity {
            if let Some(oldest_id) = entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(id, _)| *id)
            {
                entries.remove(&oldest_id);
            }
        }

        entries.insert(
            build_id,
            EventHistoryEntry {
                last_event: event,
                consequent_accepted: event.is_consequent_task(),
                seq,
            },
        );
        true
    }

    /// Get the history of a build
    pub fn get(&self, build_id: u64) -> Option<EventHistoryEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&build_id).cloned()
    }

    /// Forget a build
    pub fn remove(&self, build_id: u64) -> Option<EventHistoryEntry> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&build_id)
    }

    /// Get history size
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
