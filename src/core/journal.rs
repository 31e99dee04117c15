//! Record of handled transitions.
//!
//! A machine with its journal enabled appends one [`TransitionRecord`] for
//! every event it handles. Records name states rather than holding vertex
//! ids, so a journal stays meaningful after it is serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One handled event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The trigger that was dispatched.
    pub trigger: String,
    /// Leaf state before the event.
    pub from: String,
    /// Leaf state after the event, equal to `from` for internal transitions.
    pub to: String,
    /// When the transition completed.
    pub timestamp: DateTime<Utc>,
}

/// Ordered list of handled transitions.
///
/// # Example
///
/// ```rust
/// use nested::core::{Journal, TransitionRecord};
/// use chrono::Utc;
///
/// let mut journal = Journal::new();
/// journal.record(TransitionRecord {
///     trigger: "DOOR_OPEN".to_string(),
///     from: "toasting".to_string(),
///     to: "door_open".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(journal.path(), vec!["toasting", "door_open"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    records: Vec<TransitionRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        self.records.push(record);
    }

    /// States visited: the first record's `from`, then every `to`.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Time between the first and last record, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
