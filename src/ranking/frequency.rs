// Frequency table: running occurrence counts with a deterministic top-K.

use std::collections::HashMap;

use serde::Serialize;

/// One row of a ranking snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedWord {
    pub word: String,
    pub count: u64,
}

/// Word → count, remembering the order in which words were first seen.
///
/// Entries live in a Vec in first-increment order; the HashMap only maps a
/// word to its slot. Sorting that Vec with a stable sort gives the tie-break
/// for free. There is no cap on distinct words.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    slots: HashMap<String, usize>,
    entries: Vec<RankedWord>,
    total: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, word: &str) {
        match self.slots.get(word) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.slots.insert(word.to_string(), self.entries.len());
                self.entries.push(RankedWord {
                    word: word.to_string(),
                    count: 1,
                });
            }
        }
        self.total += 1;
    }

    pub fn increment_all<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.increment(word.as_ref());
        }
    }

    pub fn count(&self, word: &str) -> u64 {
        self.slots
            .get(word)
            .map(|&slot| self.entries[slot].count)
            .unwrap_or(0)
    }

    /// The `k` most frequent words, highest count first; ties keep first-seen order.
    pub fn top(&self, k: usize) -> Vec<RankedWord> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(k);
        ranked
    }

    /// Drop every count. The only operation that makes a count go down.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.entries.clear();
        self.total = 0;
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_duplicates() {
        let mut table = FrequencyTable::new();
        table.increment_all(["平和", "朝", "平和"]);
        assert_eq!(table.count("平和"), 2);
        assert_eq!(table.count("朝"), 1);
        assert_eq!(table.count("夜"), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn test_top_sorted_with_first_seen_tie_break() {
        let mut table = FrequencyTable::new();
        table.increment_all(["c", "a", "b", "a", "b", "d"]);
        let top: Vec<(String, u64)> = table
            .top(10)
            .into_iter()
            .map(|r| (r.word, r.count))
            .collect();
        assert_eq!(
            top,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_truncates_and_handles_zero() {
        let mut table = FrequencyTable::new();
        table.increment_all(["a", "b", "c"]);
        assert_eq!(table.top(2).len(), 2);
        assert!(table.top(0).is_empty());
        assert!(FrequencyTable::new().top(5).is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut table = FrequencyTable::new();
        table.increment_all(["a", "b"]);
        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.count("a"), 0);
        assert_eq!(table.total(), 0);
        // First-seen order restarts after a reset.
        table.increment_all(["b", "a"]);
        assert_eq!(table.top(1)[0].word, "b");
    }
}
