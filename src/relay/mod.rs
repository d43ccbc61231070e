//! Relay server
//!
//! Re-broadcasts an upstream certstream feed to local WebSocket clients and
//! serves recent packets over HTTP.
//!
//! ## Endpoints
//! - `/`: WebSocket stream of certificate updates and heartbeats
//! - `/latest.json`: the most recent packets
//! - `/example.json`: one packet
//! - `/<STATS_URL>`: connected clients
//! - `/health`

pub mod events;
pub mod handler;
pub mod http;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::client::SourceEvent;
use crate::config::FeedConfig;
use crate::types::FeedResult;

pub use http::create_router;
pub use state::{ClientInfo, ClientRegistration, RelayState};

/// Forward upstream frames into the relay until the stream channel closes
pub async fn pump_upstream(state: Arc<RelayState>, mut rx: mpsc::Receiver<SourceEvent>) {
    let mut relayed: u64 = 0;

    while let Some(event) = rx.recv().await {
        match event {
            SourceEvent::Opened => tracing::info!("[Relay] Upstream connected"),
            SourceEvent::Closed => tracing::warn!("[Relay] Upstream disconnected"),
            SourceEvent::Message(raw) => {
                if state.publish_upstream(&raw) {
                    relayed += 1;
                    if relayed % 1000 == 0 {
                        tracing::debug!("[Relay] Relayed {} certificates", relayed);
                    }
                }
            }
        }
    }

    tracing::info!("[Relay] Upstream channel closed after {} certificates", relayed);
}

/// Send heartbeats on a fixed period for as long as the task lives
pub fn spawn_heartbeats(state: Arc<RelayState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("[Relay] Starting heartbeats every {}s", period.as_secs());
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        timer.tick().await;

        loop {
            timer.tick().await;
            tracing::debug!("[Relay] Sending heartbeat");
            state.broadcast_heartbeat();
        }
    })
}

/// Bind and serve the relay router until the process stops
pub async fn serve(state: Arc<RelayState>, config: &FeedConfig) -> FeedResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Relay] Listening on http://{}", addr);

    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
