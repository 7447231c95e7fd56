// Recent-history ring: the last few processed records, for inspection.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A processed record as shown to viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedRecord {
    pub id: String,
    pub author: Option<String>,
    pub text: String,
    pub keywords: Vec<String>,
    pub observed_at: DateTime<Utc>,
}

/// Bounded ring; pushing past capacity drops the oldest entry.
#[derive(Debug)]
pub struct RecentHistory {
    entries: VecDeque<ProcessedRecord>,
    capacity: usize,
}

impl RecentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, record: ProcessedRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// Entries oldest first.
    pub fn snapshot(&self) -> Vec<ProcessedRecord> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ProcessedRecord {
        ProcessedRecord {
            id: id.to_string(),
            author: None,
            text: String::new(),
            keywords: vec![],
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_drops_oldest_past_capacity() {
        let mut history = RecentHistory::new(2);
        history.push(record("1"));
        history.push(record("2"));
        history.push(record("3"));
        let ids: Vec<String> = history.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = RecentHistory::new(0);
        history.push(record("1"));
        assert!(history.is_empty());
    }
}
