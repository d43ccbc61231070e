//! certstream-feed - Binary Entry Point
//!
//! ```bash
//! certstream-feed            # live feed (default)
//! certstream-feed demo       # replay CERTSTREAM_SAMPLE only
//! certstream-feed relay      # re-broadcast the upstream feed on PORT
//! ```

use std::env;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certstream_feed::client::{load_sample, StreamClient};
use certstream_feed::relay::{self, RelayState};
use certstream_feed::smoother::{preview_lines, Clock, SystemClock, TerminalSink};
use certstream_feed::types::StreamMessage;
use certstream_feed::{FeedConfig, FeedDriver, FeedError, FeedResult, FeedSmoother, Mode};

/// Frames buffered between the socket task and its consumer
const SOURCE_CHANNEL_CAPACITY: usize = 1024;

/// Sample lines shown before the feed starts
const PREVIEW_COUNT: usize = 5;

#[tokio::main]
async fn main() -> FeedResult<()> {
    // Logs go to stderr; stdout carries the feed itself
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certstream_feed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = FeedConfig::from_env()?;
    let mode = match env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => Mode::default(),
    };

    tracing::info!("Starting {} v{} in {:?} mode", certstream_feed::NAME, certstream_feed::VERSION, mode);

    match mode {
        Mode::Watch => run_watch(config).await,
        Mode::Demo => run_demo(config).await,
        Mode::Relay => run_relay(config).await,
    }
}

/// Live feed, with demo replay while waiting for the first certificate
async fn run_watch(config: FeedConfig) -> FeedResult<()> {
    let sample = match &config.sample_source {
        Some(source) => match load_sample(source).await {
            Ok(batch) => batch.messages,
            Err(e) => {
                tracing::warn!("[Sample] Could not load {}: {}, running live only", source, e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    print_preview(&sample, &config, clock.as_ref());

    let smoother = FeedSmoother::with_config(TerminalSink::stdout(), clock, &config);
    let driver = FeedDriver::new(smoother, sample, &config, rand::thread_rng());

    let (tx, rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
    let client = StreamClient::new(config.stream_url.clone(), config.reconnect_delay());
    let client_task = tokio::spawn(client.run(tx));

    tokio::select! {
        _ = driver.run_live(rx) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Got stop order, exiting...");
        }
    }

    client_task.abort();
    Ok(())
}

/// Replay the sample batch with no connection
async fn run_demo(config: FeedConfig) -> FeedResult<()> {
    let source = config.sample_source.clone().ok_or_else(|| {
        FeedError::InvalidConfig("demo mode needs CERTSTREAM_SAMPLE".to_string())
    })?;
    let sample = load_sample(&source).await?.messages;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    print_preview(&sample, &config, clock.as_ref());

    let smoother = FeedSmoother::with_config(TerminalSink::stdout(), clock, &config);
    let driver = FeedDriver::new(smoother, sample, &config, rand::thread_rng());

    tokio::select! {
        _ = driver.run_demo() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Got stop order, exiting...");
        }
    }
    Ok(())
}

/// Relay the upstream feed to local WebSocket clients
async fn run_relay(config: FeedConfig) -> FeedResult<()> {
    let state = Arc::new(RelayState::new(&config));

    let (tx, rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
    let client = StreamClient::new(config.stream_url.clone(), config.reconnect_delay());
    let client_task = tokio::spawn(client.run(tx));
    let pump_task = tokio::spawn(relay::pump_upstream(Arc::clone(&state), rx));
    let heartbeat_task = relay::spawn_heartbeats(Arc::clone(&state), config.heartbeat_interval());

    let result = tokio::select! {
        result = relay::serve(state, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Got stop order, exiting...");
            Ok(())
        }
    };

    client_task.abort();
    pump_task.abort();
    heartbeat_task.abort();
    result
}

fn print_preview(sample: &[StreamMessage], config: &FeedConfig, clock: &dyn Clock) {
    let offset = if config.use_utc {
        certstream_feed::utils::utc_offset()
    } else {
        certstream_feed::utils::local_offset()
    };

    let lines = preview_lines(sample, PREVIEW_COUNT, clock.now_secs(), &offset);
    if lines.is_empty() {
        return;
    }

    println!("Recently seen:");
    for line in lines {
        println!("  {}", line);
    }
    println!();
}
