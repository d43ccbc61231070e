//! Delayed ingestion timers for demo replay

use crate::types::StreamMessage;

/// A replayed frame waiting for its due time
#[derive(Clone, Debug)]
struct PendingReplay {
    id: u64,
    due_at_ms: u64,
    message: StreamMessage,
}

/// Independent one-shot timers, cancelable as a group
///
/// Each timer carries its own absolute due time; firing order follows due
/// time, with scheduling order breaking ties.
#[derive(Debug, Default)]
pub struct ReplaySchedule {
    pending: Vec<PendingReplay>,
    next_id: u64,
}

impl ReplaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a frame; returns the timer id
    pub fn schedule(&mut self, due_at_ms: u64, message: StreamMessage) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(PendingReplay {
            id,
            due_at_ms,
            message,
        });
        id
    }

    /// Remove and return every frame due at or before `now_ms`
    pub fn take_due(&mut self, now_ms: u64) -> Vec<StreamMessage> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.due_at_ms <= now_ms);
        self.pending = rest;

        due.sort_by_key(|p| (p.due_at_ms, p.id));
        due.into_iter().map(|p| p.message).collect()
    }

    /// Cancel all pending timers, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    /// Earliest due time among pending timers
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_at_ms).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
