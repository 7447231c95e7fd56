// Seen-ID ledger: a bounded FIFO window of record ids already processed.
//
// This is a dedup window, not a cache: looking an id up never extends its
// life. When the window is full, the id admitted longest ago is forgotten,
// and if it ever shows up again it is treated as new.

use std::collections::{HashSet, VecDeque};

#[derive(Debug)]
pub struct SeenLedger {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl SeenLedger {
    /// A capacity of 0 remembers nothing and admits every id.
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity.min(4096)),
            members: HashSet::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Admit `id` if it is not in the window. Returns false for a repeat.
    pub fn try_admit(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        if self.capacity == 0 {
            return true;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.members.insert(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids in admission order, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
