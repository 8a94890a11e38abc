use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::FeedSnapshot;

/// One row of the history view, ready for the API and the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: String,
    pub magnitude: Option<f64>,
    pub severity: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

/// In-memory mirror of the feed, most-recent-first, capped.
///
/// The feed delivers full snapshots, so this is replaced wholesale on
/// every update rather than appended to. Nothing is persisted.
pub struct EventHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Replace the history with the contents of a snapshot, dropping
    /// anything past the capacity (the snapshot is most-recent-first, so
    /// the oldest entries fall off).
    pub fn update(&mut self, snapshot: &FeedSnapshot) {
        self.entries.clear();
        for (key, event) in snapshot.iter().take(self.capacity) {
            self.entries.push_back(HistoryEntry {
                key: key.clone(),
                magnitude: event.magnitude,
                severity: event.severity_label(),
                time: event.time(),
            });
        }
    }

    /// The most recent event, if any. Backs the "latest magnitude" view.
    pub fn latest(&self) -> Option<HistoryEntry> {
        self.entries.front().cloned()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

pub type SharedHistory = Arc<Mutex<EventHistory>>;

pub fn shared_history(capacity: usize) -> SharedHistory {
    Arc::new(Mutex::new(EventHistory::new(capacity)))
}
