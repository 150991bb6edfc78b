use std::collections::VecDeque;

/// Maximum number of entries kept in the history drawer.
pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first list of completed calculations.
/// Inserting past capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a history from entries already ordered newest first.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::new();
        history.entries = entries.into_iter().take(history.capacity).collect();
        history
    }

    pub fn push(&mut self, entry: String) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn front(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
