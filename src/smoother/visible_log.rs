//! Lines currently on screen

use std::collections::VecDeque;

/// Lines kept on screen by default
pub const DEFAULT_VISIBLE_CAPACITY: usize = 10;

/// Fixed-capacity, most-recent-first list of rendered lines
#[derive(Debug)]
pub struct VisibleLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl VisibleLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend a line, returning the evicted oldest line if over capacity
    pub fn prepend(&mut self, line: String) -> Option<String> {
        self.lines.push_front(line);
        if self.lines.len() > self.capacity {
            self.lines.pop_back()
        } else {
            None
        }
    }

    /// Lines newest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn newest(&self) -> Option<&str> {
        self.lines.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for VisibleLog {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBLE_CAPACITY)
    }
}
