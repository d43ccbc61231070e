//! Feed smoother
//!
//! Decouples arrival cadence from display cadence: bursts of certificate
//! frames are buffered and released one per tick, oldest first, onto a
//! capped on-screen log.
//!
//! ## Pieces
//! - `DisplayBuffer`: FIFO of events waiting for a display slot
//! - `VisibleLog`: newest-first lines on screen, capped at 10
//! - `ReplaySchedule`: jittered one-shot timers for demo replay
//! - `Clock`: injected time so timers run deterministically in tests

pub mod buffer;
pub mod clock;
pub mod format;
pub mod replay;
pub mod sink;
pub mod visible_log;

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use rand::Rng;

use crate::config::FeedConfig;
use crate::types::{CertEvent, DropReason, StreamMessage};
use crate::utils::{local_offset, utc_offset};

pub use buffer::DisplayBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{format_line, preview_lines};
pub use replay::ReplaySchedule;
pub use sink::{DisplaySink, MemorySink, TerminalSink};
pub use visible_log::{VisibleLog, DEFAULT_VISIBLE_CAPACITY};

/// Exclusive upper bound of replay jitter by default
pub const DEFAULT_REPLAY_MAX_DELAY_MS: u64 = 2500;

/// Outcome of handing one frame to the smoother
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ingest {
    /// Appended to the display buffer
    Buffered,
    /// Silently discarded
    Dropped(DropReason),
}

/// Buffers certificate events and releases them at a steady cadence
pub struct FeedSmoother<S: DisplaySink> {
    buffer: DisplayBuffer,
    visible: VisibleLog,
    replays: ReplaySchedule,
    replay_used: bool,
    replay_max_delay_ms: u64,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
    sink: S,
}

impl<S: DisplaySink> FeedSmoother<S> {
    /// Create a smoother with default capacity and jitter, rendering in UTC
    pub fn new(sink: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            buffer: DisplayBuffer::new(),
            visible: VisibleLog::default(),
            replays: ReplaySchedule::new(),
            replay_used: false,
            replay_max_delay_ms: DEFAULT_REPLAY_MAX_DELAY_MS,
            offset: utc_offset(),
            clock,
            sink,
        }
    }

    /// Create a smoother from runtime configuration
    pub fn with_config(sink: S, clock: Arc<dyn Clock>, config: &FeedConfig) -> Self {
        let offset = if config.use_utc {
            utc_offset()
        } else {
            local_offset()
        };

        Self {
            visible: VisibleLog::new(config.visible_capacity),
            replay_max_delay_ms: config.replay_max_delay_ms.max(1),
            offset,
            ..Self::new(sink, clock)
        }
    }

    /// Parse a raw text frame and buffer it if displayable
    ///
    /// Invalid JSON, heartbeats and empty domain lists are dropped without
    /// surfacing anything to the viewer.
    pub fn ingest(&mut self, raw: &str) -> Ingest {
        match serde_json::from_str::<StreamMessage>(raw) {
            Ok(message) => self.ingest_message(message),
            Err(e) => {
                tracing::debug!("[Feed] Dropping unparseable frame: {}", e);
                Ingest::Dropped(DropReason::MalformedPayload)
            }
        }
    }

    /// Buffer an already-parsed frame if displayable
    pub fn ingest_message(&mut self, message: StreamMessage) -> Ingest {
        match CertEvent::from_message(message) {
            Ok(event) => {
                self.buffer.push(event);
                Ingest::Buffered
            }
            Err(reason) => {
                if reason != DropReason::HeartbeatIgnored {
                    tracing::debug!("[Feed] Dropping frame: {}", reason);
                }
                Ingest::Dropped(reason)
            }
        }
    }

    /// Schedule the first `count` sample frames for jittered ingestion
    ///
    /// Each frame gets its own delay in `[0, max_delay)` from a single anchor
    /// (now), so release order among them is not preserved. Only the first
    /// call in a session schedules anything; returns the number scheduled.
    pub fn replay_sample<R: Rng>(
        &mut self,
        sample: &[StreamMessage],
        count: usize,
        rng: &mut R,
    ) -> usize {
        if self.replay_used {
            tracing::debug!("[Feed] Sample replay already used this session");
            return 0;
        }
        self.replay_used = true;

        let anchor = self.clock.now_ms();
        let mut scheduled = 0;
        for message in sample.iter().take(count) {
            let delay = rng.gen_range(0..self.replay_max_delay_ms);
            self.replays.schedule(anchor + delay, message.clone());
            scheduled += 1;
        }

        tracing::info!(
            "[Feed] Scheduled {} sample events over {}ms",
            scheduled,
            self.replay_max_delay_ms
        );
        scheduled
    }

    /// Ingest every replayed frame whose delay has elapsed
    pub fn fire_due_replays(&mut self) -> usize {
        let due = self.replays.take_due(self.clock.now_ms());
        let fired = due.len();
        for message in due {
            self.ingest_message(message);
        }
        fired
    }

    /// Cancel all pending replay timers at once
    pub fn cancel_replay(&mut self) -> usize {
        let cancelled = self.replays.cancel_all();
        if cancelled > 0 {
            tracing::info!("[Feed] Cancelled {} pending sample events", cancelled);
        }
        cancelled
    }

    /// Time until the next replay timer is due, if any are pending
    pub fn next_replay_in(&self) -> Option<Duration> {
        self.replays.next_due().map(|due| {
            let now = self.clock.now_ms();
            Duration::from_millis(due.saturating_sub(now))
        })
    }

    /// Release at most one buffered event to the display
    ///
    /// Returns true if a line was released.
    pub fn tick(&mut self) -> bool {
        let Some(event) = self.buffer.pop() else {
            return false;
        };

        let line = format_line(&event, self.clock.now_secs(), &self.offset);
        self.sink.display(&line);
        if self.visible.prepend(line).is_some() {
            self.sink.evict_oldest();
        }
        true
    }

    /// Number of events waiting for display
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of replay timers not yet fired
    pub fn pending_replays(&self) -> usize {
        self.replays.len()
    }

    /// Nothing buffered and no replay pending
    pub fn is_drained(&self) -> bool {
        self.buffer.is_empty() && self.replays.is_empty()
    }

    pub fn replay_used(&self) -> bool {
        self.replay_used
    }

    /// Lines currently on screen, newest first
    pub fn visible_lines(&self) -> Vec<String> {
        self.visible.lines().map(str::to_string).collect()
    }

    pub fn visible(&self) -> &VisibleLog {
        &self.visible
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn smoother() -> (FeedSmoother<MemorySink>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let smoother = FeedSmoother::new(MemorySink::new(), Arc::new(clock.clone()));
        (smoother, clock)
    }

    fn update(domains: &[&str]) -> String {
        serde_json::json!({
            "message_type": "certificate_update",
            "data": {
                "leaf_cert": {"all_domains": domains},
                "seen": 1700000000.0
            }
        })
        .to_string()
    }

    #[test]
    fn test_ingest_buffers_certificate_update() {
        let (mut smoother, _) = smoother();
        assert_eq!(smoother.ingest(&update(&["a.com"])), Ingest::Buffered);
        assert_eq!(smoother.pending(), 1);
    }

    #[test]
    fn test_ingest_drops_heartbeat() {
        let (mut smoother, _) = smoother();
        let outcome = smoother.ingest(r#"{"message_type":"heartbeat","timestamp":1.5}"#);
        assert_eq!(outcome, Ingest::Dropped(DropReason::HeartbeatIgnored));
        assert_eq!(smoother.pending(), 0);
    }

    #[test]
    fn test_ingest_drops_malformed_json() {
        let (mut smoother, _) = smoother();
        assert_eq!(
            smoother.ingest("{not json"),
            Ingest::Dropped(DropReason::MalformedPayload)
        );
        assert_eq!(smoother.pending(), 0);
    }

    #[test]
    fn test_ingest_drops_empty_domain_list() {
        let (mut smoother, _) = smoother();
        assert_eq!(
            smoother.ingest(&update(&[])),
            Ingest::Dropped(DropReason::EmptyDomainList)
        );
        assert_eq!(smoother.pending(), 0);
    }

    #[test]
    fn test_tick_releases_one_event() {
        let (mut smoother, _) = smoother();
        smoother.ingest(&update(&["a.com", "b.com"]));
        smoother.ingest(&update(&["c.com"]));

        assert!(smoother.tick());
        assert_eq!(smoother.pending(), 1);
        assert_eq!(
            smoother.sink().displayed,
            vec!["[11/14/23 22:13:20] a.com (SAN: b.com)".to_string()]
        );
    }

    #[test]
    fn test_tick_on_empty_buffer_is_noop() {
        let (mut smoother, _) = smoother();
        assert!(!smoother.tick());
        assert!(smoother.visible().is_empty());
        assert!(smoother.sink().displayed.is_empty());
    }

    #[test]
    fn test_tick_evicts_past_capacity() {
        let (mut smoother, _) = smoother();
        for i in 0..12 {
            smoother.ingest(&update(&[&format!("site{}.com", i)]));
        }
        for _ in 0..12 {
            smoother.tick();
        }

        assert_eq!(smoother.visible().len(), 10);
        assert_eq!(smoother.sink().evictions, 2);
        let lines = smoother.visible_lines();
        assert!(lines[0].ends_with("site11.com"));
        assert!(lines[9].ends_with("site2.com"));
    }

    #[test]
    fn test_replay_fires_after_delay() {
        let (mut smoother, clock) = smoother();
        let sample = vec![StreamMessage::certificate_update(
            crate::types::CertUpdateData::with_domains(vec!["demo.com".to_string()], None),
        )];
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(smoother.replay_sample(&sample, 5, &mut rng), 1);
        assert_eq!(smoother.pending_replays(), 1);

        clock.advance(DEFAULT_REPLAY_MAX_DELAY_MS);
        assert_eq!(smoother.fire_due_replays(), 1);
        assert_eq!(smoother.pending(), 1);

        // Released without a seen time, so stamped with the release time
        smoother.tick();
        assert!(smoother.sink().displayed[0].ends_with("] demo.com"));
    }

    #[test]
    fn test_next_replay_in_counts_down() {
        let (mut smoother, clock) = smoother();
        assert_eq!(smoother.next_replay_in(), None);

        let sample = vec![StreamMessage::certificate_update(
            crate::types::CertUpdateData::with_domains(vec!["demo.com".to_string()], None),
        )];
        smoother.replay_sample(&sample, 1, &mut StdRng::seed_from_u64(1));

        let wait = smoother.next_replay_in().unwrap();
        assert!(wait < Duration::from_millis(DEFAULT_REPLAY_MAX_DELAY_MS));

        clock.advance(DEFAULT_REPLAY_MAX_DELAY_MS);
        assert_eq!(smoother.next_replay_in(), Some(Duration::ZERO));
    }
}
