//! Activity log for a research session.
//!
//! The model caller only appends `Warning` entries when an attempt fails and
//! a retry follows. Other statuses are written by the code that drives the
//! research session.

use chrono::{DateTime, Utc};
use deep_research_core::ActivityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Status of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Work has started.
    Pending,
    /// Work finished successfully.
    Complete,
    /// Something went wrong but work continues.
    Warning,
    /// Work failed.
    Error,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique identifier.
    pub id: ActivityId,
    /// Activity kind (e.g. "search", "extract", "analyze").
    pub kind: String,
    /// Entry status.
    pub status: ActivityStatus,
    /// Human-readable message.
    pub message: String,
    /// When the entry was added.
    pub timestamp: DateTime<Utc>,
}

/// Append-only sink for activity entries.
pub trait ActivityTracker: Send + Sync {
    /// Appends an entry.
    fn add(&self, kind: &str, status: ActivityStatus, message: &str);
}

/// In-memory activity tracker.
#[derive(Debug, Default)]
pub struct InMemoryActivityTracker {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryActivityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts entries per status.
    #[must_use]
    pub fn count_by_status(&self) -> HashMap<ActivityStatus, usize> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = HashMap::new();
        for entry in entries.iter() {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }
}

impl ActivityTracker for InMemoryActivityTracker {
    fn add(&self, kind: &str, status: ActivityStatus, message: &str) {
        let entry = ActivityEntry {
            id: ActivityId::new(),
            kind: kind.to_string(),
            status,
            message: message.to_string(),
            timestamp: Utc::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_insertion_order() {
        let tracker = InMemoryActivityTracker::new();
        assert!(tracker.is_empty());

        tracker.add("search", ActivityStatus::Pending, "searching");
        tracker.add("search", ActivityStatus::Complete, "found 4 sources");
        tracker.add("analyze", ActivityStatus::Warning, "retrying");

        let entries = tracker.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "searching");
        assert_eq!(entries[2].kind, "analyze");
        assert_eq!(entries[2].status, ActivityStatus::Warning);
        assert!(entries[0].timestamp <= entries[2].timestamp);
    }

    #[test]
    fn count_by_status() {
        let tracker = InMemoryActivityTracker::new();
        tracker.add("extract", ActivityStatus::Warning, "a");
        tracker.add("extract", ActivityStatus::Warning, "b");
        tracker.add("extract", ActivityStatus::Error, "c");

        let counts = tracker.count_by_status();
        assert_eq!(counts.get(&ActivityStatus::Warning), Some(&2));
        assert_eq!(counts.get(&ActivityStatus::Error), Some(&1));
        assert_eq!(counts.get(&ActivityStatus::Complete), None);
    }

    #[test]
    fn status_serde_is_snake_case() {
        let json = serde_json::to_string(&ActivityStatus::Warning).expect("serialize");
        assert_eq!(json, "\"warning\"");
        assert_eq!(ActivityStatus::Complete.to_string(), "complete");
    }
}
