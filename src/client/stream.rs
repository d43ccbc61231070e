//! Upstream certstream WebSocket client

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::types::FeedResult;

/// Lifecycle notifications from the stream connection
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// Handshake completed
    Opened,
    /// One text frame, passed on untouched
    Message(String),
    /// Connection lost; a reconnect follows after the configured delay
    Closed,
}

/// Connection state as seen by the viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Next state after a lifecycle notification
    pub fn on_event(self, event: &SourceEvent) -> Self {
        match event {
            SourceEvent::Opened | SourceEvent::Message(_) => ConnectionState::Connected,
            SourceEvent::Closed => ConnectionState::Connecting,
        }
    }
}

/// Keeps a connection to a certstream server, forwarding frames to a channel
pub struct StreamClient {
    url: String,
    reconnect_delay: Duration,
}

impl StreamClient {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and forward frames until the receiver goes away
    ///
    /// Connection failures are logged and retried after a fixed delay.
    pub async fn run(self, tx: mpsc::Sender<SourceEvent>) -> FeedResult<()> {
        loop {
            tracing::info!("[Stream] Connecting to {}", self.url);

            match self.forward_session(&tx).await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => tracing::warn!("[Stream] Connection error: {}", e),
            }

            if tx.send(SourceEvent::Closed).await.is_err() {
                return Ok(());
            }

            tracing::info!(
                "[Stream] Reconnecting in {}ms",
                self.reconnect_delay.as_millis()
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Run one connection; Ok(false) means the receiver is gone
    async fn forward_session(&self, tx: &mpsc::Sender<SourceEvent>) -> FeedResult<bool> {
        let (mut ws_stream, response) = connect_async(self.url.as_str()).await?;
        tracing::info!("[Stream] Connected (status: {})", response.status());

        if tx.send(SourceEvent::Opened).await.is_err() {
            return Ok(false);
        }

        while let Some(frame) = ws_stream.next().await {
            match frame? {
                Message::Text(text) => {
                    if tx.send(SourceEvent::Message(text.as_str().to_owned())).await.is_err() {
                        return Ok(false);
                    }
                }
                Message::Close(reason) => {
                    tracing::info!("[Stream] Server closed connection: {:?}", reason);
                    break;
                }
                // Ping replies are queued by tungstenite itself
                _ => {}
            }
        }

        Ok(true)
    }
}
