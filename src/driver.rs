//! Feed driver
//!
//! Owns the smoother and is the only thing that touches it: display ticks,
//! replay timers and stream notifications are interleaved in one
//! `tokio::select!` loop, so the buffer and log need no locking.

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, sleep_until, Instant, MissedTickBehavior};

use crate::client::{ConnectionState, SourceEvent};
use crate::config::FeedConfig;
use crate::smoother::{DisplaySink, FeedSmoother, Ingest};
use crate::types::StreamMessage;

/// Drives a [`FeedSmoother`] from a stream connection and a sample batch
pub struct FeedDriver<S: DisplaySink, R: Rng> {
    smoother: FeedSmoother<S>,
    sample: Vec<StreamMessage>,
    replay_count: usize,
    replay_grace: Duration,
    tick_interval: Duration,
    rng: R,
    state: ConnectionState,
    live_seen: bool,
    replay_at: Option<Instant>,
}

impl<S: DisplaySink, R: Rng> FeedDriver<S, R> {
    pub fn new(
        smoother: FeedSmoother<S>,
        sample: Vec<StreamMessage>,
        config: &FeedConfig,
        rng: R,
    ) -> Self {
        Self {
            smoother,
            sample,
            replay_count: config.replay_count,
            replay_grace: config.replay_grace(),
            tick_interval: config.tick_interval(),
            rng,
            state: ConnectionState::Disconnected,
            live_seen: false,
            replay_at: None,
        }
    }

    pub fn smoother(&self) -> &FeedSmoother<S> {
        &self.smoother
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Demo replay is armed and waiting for its grace period
    pub fn replay_armed(&self) -> bool {
        self.replay_at.is_some()
    }

    /// React to one connection notification
    pub fn handle_source_event(&mut self, event: SourceEvent) {
        self.state = self.state.on_event(&event);

        match event {
            SourceEvent::Opened => {
                tracing::info!("[Feed] Connection established! Waiting for events...");
                if !self.live_seen && !self.sample.is_empty() && !self.smoother.replay_used() {
                    self.replay_at = Some(Instant::now() + self.replay_grace);
                }
            }
            SourceEvent::Message(raw) => {
                if self.smoother.ingest(&raw) == Ingest::Buffered && !self.live_seen {
                    // Live data supersedes the demo trickle
                    self.live_seen = true;
                    self.replay_at = None;
                    self.smoother.cancel_replay();
                }
            }
            SourceEvent::Closed => {
                tracing::info!("[Feed] Connection lost");
            }
        }
    }

    /// Start demo replay of the sample batch now
    pub fn start_replay(&mut self) -> usize {
        self.replay_at = None;
        self.smoother
            .replay_sample(&self.sample, self.replay_count, &mut self.rng)
    }

    /// One display period: fire due replays, then release one line
    pub fn on_tick(&mut self) -> bool {
        self.smoother.fire_due_replays();
        self.smoother.tick()
    }

    /// Run against a live connection until its channel closes
    pub async fn run_live(mut self, mut rx: mpsc::Receiver<SourceEvent>) -> FeedSmoother<S> {
        self.state = ConnectionState::Connecting;
        let mut timer = interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let replay_wait = self.smoother.next_replay_in();
            let replay_at = self.replay_at;

            tokio::select! {
                _ = timer.tick() => {
                    self.on_tick();
                }

                _ = sleep(replay_wait.unwrap_or_default()), if replay_wait.is_some() => {
                    self.smoother.fire_due_replays();
                }

                _ = sleep_until(replay_at.unwrap_or_else(Instant::now)), if replay_at.is_some() => {
                    self.start_replay();
                }

                event = rx.recv() => {
                    match event {
                        Some(e) => self.handle_source_event(e),
                        None => {
                            tracing::info!("[Feed] Stream closed, stopping feed");
                            break;
                        }
                    }
                }
            }
        }

        self.smoother
    }

    /// Replay the sample without a connection until everything is shown
    pub async fn run_demo(mut self) -> FeedSmoother<S> {
        self.start_replay();
        let mut timer = interval(self.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.smoother.is_drained() {
            timer.tick().await;
            self.on_tick();
        }

        tracing::info!("[Feed] Demo replay finished");
        self.smoother
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::smoother::{ManualClock, MemorySink, SystemClock};
    use crate::types::CertUpdateData;

    fn sample(n: usize) -> Vec<StreamMessage> {
        (0..n)
            .map(|i| {
                StreamMessage::certificate_update(CertUpdateData::with_domains(
                    vec![format!("demo{}.com", i)],
                    Some(1700000000.0),
                ))
            })
            .collect()
    }

    fn live_frame(cn: &str) -> String {
        serde_json::to_string(&StreamMessage::certificate_update(CertUpdateData::with_domains(
            vec![cn.to_string()],
            Some(1700000000.0),
        )))
        .unwrap()
    }

    fn driver(
        sample: Vec<StreamMessage>,
        clock: ManualClock,
    ) -> FeedDriver<MemorySink, StdRng> {
        let smoother = FeedSmoother::new(MemorySink::new(), Arc::new(clock));
        FeedDriver::new(
            smoother,
            sample,
            &FeedConfig::default(),
            StdRng::seed_from_u64(42),
        )
    }

    #[tokio::test]
    async fn test_open_arms_replay_when_sample_present() {
        let mut driver = driver(sample(3), ManualClock::new(0));
        driver.handle_source_event(SourceEvent::Opened);

        assert_eq!(driver.state(), ConnectionState::Connected);
        assert!(driver.replay_armed());
    }

    #[tokio::test]
    async fn test_open_without_sample_does_not_arm_replay() {
        let mut driver = driver(vec![], ManualClock::new(0));
        driver.handle_source_event(SourceEvent::Opened);
        assert!(!driver.replay_armed());
    }

    #[tokio::test]
    async fn test_live_message_cancels_pending_replay() {
        let clock = ManualClock::new(0);
        let mut driver = driver(sample(5), clock.clone());

        driver.handle_source_event(SourceEvent::Opened);
        assert_eq!(driver.start_replay(), 5);
        assert_eq!(driver.smoother().pending_replays(), 5);

        driver.handle_source_event(SourceEvent::Message(live_frame("live.com")));
        assert_eq!(driver.smoother().pending_replays(), 0);
        assert!(!driver.replay_armed());

        clock.advance(5_000);
        driver.on_tick();
        driver.on_tick();
        assert_eq!(
            driver.smoother().sink().displayed,
            vec!["[11/14/23 22:13:20] live.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_heartbeat_does_not_cancel_replay() {
        let mut driver = driver(sample(2), ManualClock::new(0));
        driver.start_replay();

        driver.handle_source_event(SourceEvent::Message(
            r#"{"message_type":"heartbeat","timestamp":1.0}"#.to_string(),
        ));
        assert_eq!(driver.smoother().pending_replays(), 2);
    }

    #[tokio::test]
    async fn test_reopen_after_live_data_does_not_rearm() {
        let mut driver = driver(sample(2), ManualClock::new(0));
        driver.handle_source_event(SourceEvent::Opened);
        driver.handle_source_event(SourceEvent::Message(live_frame("live.com")));
        driver.handle_source_event(SourceEvent::Closed);
        assert_eq!(driver.state(), ConnectionState::Connecting);

        driver.handle_source_event(SourceEvent::Opened);
        assert!(!driver.replay_armed());
    }

    #[tokio::test]
    async fn test_run_demo_drains_sample() {
        let config = FeedConfig {
            tick_interval_ms: 1,
            replay_max_delay_ms: 20,
            use_utc: true,
            ..FeedConfig::default()
        };
        let smoother = FeedSmoother::with_config(MemorySink::new(), Arc::new(SystemClock), &config);
        let driver = FeedDriver::new(smoother, sample(4), &config, StdRng::seed_from_u64(3));

        let smoother = driver.run_demo().await;
        assert!(smoother.is_drained());
        assert_eq!(smoother.sink().displayed.len(), 4);
    }

    #[tokio::test]
    async fn test_run_live_ingests_until_channel_closes() {
        let config = FeedConfig {
            tick_interval_ms: 1,
            ..FeedConfig::default()
        };
        let smoother = FeedSmoother::new(MemorySink::new(), Arc::new(SystemClock));
        let driver = FeedDriver::new(smoother, vec![], &config, StdRng::seed_from_u64(3));

        let (tx, rx) = mpsc::channel(16);
        tx.send(SourceEvent::Opened).await.unwrap();
        tx.send(SourceEvent::Message(live_frame("a.com"))).await.unwrap();
        tx.send(SourceEvent::Message("garbage".to_string())).await.unwrap();
        drop(tx);

        let smoother = driver.run_live(rx).await;
        // The channel may close before a tick releases the buffered event
        assert_eq!(smoother.pending() + smoother.sink().displayed.len(), 1);
    }
}
