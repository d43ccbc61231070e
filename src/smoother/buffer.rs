//! Pending events awaiting display

use std::collections::VecDeque;

use crate::types::CertEvent;

/// FIFO of events waiting for their display slot
///
/// Entries are appended at the tail and released from the head; nothing is
/// reordered or expired once enqueued.
#[derive(Debug, Default)]
pub struct DisplayBuffer {
    queue: VecDeque<CertEvent>,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CertEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<CertEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Peek at pending events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &CertEvent> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(cn: &str) -> CertEvent {
        CertEvent::from_domains(vec![cn.to_string()], None).unwrap()
    }

    #[test]
    fn test_pops_in_insertion_order() {
        let mut buffer = DisplayBuffer::new();
        buffer.push(event("first.com"));
        buffer.push(event("second.com"));
        buffer.push(event("third.com"));

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.pop().unwrap().common_name, "first.com");
        assert_eq!(buffer.pop().unwrap().common_name, "second.com");
        assert_eq!(buffer.pop().unwrap().common_name, "third.com");
        assert!(buffer.pop().is_none());
        assert!(buffer.is_empty());
    }
}
