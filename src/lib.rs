//! certstream-feed
//!
//! A client for certificate transparency streams (certstream) that turns a
//! bursty firehose into a steady, readable trickle of domains.
//!
//! # Features
//!
//! - **Feed smoothing**: buffered events released one per 100ms tick, oldest first
//! - **Capped display**: the 10 most recent lines, newest first
//! - **Demo replay**: sample data trickled in with randomized jitter while no
//!   live data is flowing, cancelled as soon as it is
//! - **Relay**: re-broadcast an upstream feed with `/latest.json` and stats
//!
//! # Modules
//!
//! - `types`: Wire frames, certificate events and errors
//! - `smoother`: The feed smoother and its buffer, log, timers and sinks
//! - `driver`: Async loop that ticks the smoother and routes stream events
//! - `client`: Upstream WebSocket client and sample loader
//! - `relay`: Axum relay server
//! - `config`: Environment configuration
//! - `utils`: Time helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use certstream_feed::smoother::{FeedSmoother, ManualClock, MemorySink};
//!
//! let clock = ManualClock::new(1_700_000_000_000);
//! let mut smoother = FeedSmoother::new(MemorySink::new(), Arc::new(clock));
//!
//! smoother.ingest(r#"{"message_type":"certificate_update",
//!     "data":{"leaf_cert":{"all_domains":["a.com","b.com"]},"seen":1700000000}}"#);
//! smoother.tick();
//!
//! assert_eq!(smoother.visible_lines(), vec!["[11/14/23 22:13:20] a.com (SAN: b.com)"]);
//! ```

pub mod client;
pub mod config;
pub mod driver;
pub mod relay;
pub mod smoother;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{FeedConfig, Mode};
pub use driver::FeedDriver;
pub use smoother::{DisplaySink, FeedSmoother, Ingest};
pub use types::{CertEvent, DropReason, FeedError, FeedResult, StreamMessage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
