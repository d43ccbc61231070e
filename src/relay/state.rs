//! Relay application state

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use super::events::{HeartbeatFrame, LatestResponse, StatsResponse};
use crate::config::FeedConfig;
use crate::types::StreamMessage;
use crate::utils::{current_timestamp, current_timestamp_f64, pretty_since};

/// Broadcast buffer per client before it starts lagging
const CHANNEL_CAPACITY: usize = 1024;

/// A connected WebSocket client
#[derive(Clone, Debug)]
pub struct ClientInfo {
    pub addr: String,
    /// Unix seconds at connect time
    pub connected_at: u64,
}

/// Shared state for relay connections and endpoints
pub struct RelayState {
    /// Serialized frames fanned out to every client
    tx: broadcast::Sender<String>,

    /// Most recent certificate packets, oldest first
    recent: Mutex<VecDeque<Value>>,
    recent_capacity: usize,

    clients: Mutex<HashMap<u64, ClientInfo>>,
    next_client_id: AtomicU64,

    /// Stats endpoint path, without leading slash
    pub stats_path: String,
}

impl RelayState {
    pub fn new(config: &FeedConfig) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            tx,
            recent: Mutex::new(VecDeque::with_capacity(config.recent_capacity)),
            recent_capacity: config.recent_capacity.max(1),
            clients: Mutex::new(HashMap::new()),
            next_client_id: AtomicU64::new(0),
            stats_path: config.stats_path.clone(),
        }
    }

    /// Accept one upstream text frame
    ///
    /// Certificate packets are retained and re-broadcast untouched.
    /// Upstream heartbeats and anything unparseable are dropped; the relay
    /// sends its own heartbeats. Returns true if the frame was relayed.
    pub fn publish_upstream(&self, raw: &str) -> bool {
        let packet: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("[Relay] Dropping unparseable upstream frame: {}", e);
                return false;
            }
        };

        let relayable = serde_json::from_value::<StreamMessage>(packet.clone())
            .map(|message| !message.is_heartbeat() && message.data.is_some())
            .unwrap_or(false);
        if !relayable {
            return false;
        }

        {
            let mut recent = self.recent.lock();
            if recent.len() >= self.recent_capacity {
                recent.pop_front();
            }
            recent.push_back(packet);
        }

        // Ignore send errors - they just mean no clients are connected
        let _ = self.tx.send(raw.to_string());
        true
    }

    /// Send a heartbeat to every connected client
    pub fn broadcast_heartbeat(&self) {
        let frame = HeartbeatFrame::new(current_timestamp_f64());
        if let Ok(json) = serde_json::to_string(&frame) {
            let _ = self.tx.send(json);
        }
    }

    /// Subscribe to receive relayed frames
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Track a client until the returned registration is dropped
    pub fn register_client(self: &Arc<Self>, addr: String) -> ClientRegistration {
        let id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        self.clients.lock().insert(
            id,
            ClientInfo {
                addr: addr.clone(),
                connected_at: current_timestamp(),
            },
        );
        tracing::info!("[Relay] Client {} connected from {}", id, addr);

        ClientRegistration {
            state: Arc::clone(self),
            id,
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn latest(&self) -> LatestResponse {
        LatestResponse {
            messages: self.recent.lock().iter().cloned().collect(),
        }
    }

    /// Oldest retained packet, if any
    pub fn example(&self) -> Option<Value> {
        self.recent.lock().front().cloned()
    }

    pub fn stats(&self) -> StatsResponse {
        let now = current_timestamp();
        let clients = self.clients.lock();

        let mut entries: Vec<&ClientInfo> = clients.values().collect();
        entries.sort_by_key(|c| c.connected_at);

        StatsResponse {
            connected_client_count: clients.len(),
            clients: entries
                .into_iter()
                .map(|c| (c.addr.clone(), pretty_since(c.connected_at, now)))
                .collect(),
        }
    }
}

/// Removes its client from the registry when dropped
pub struct ClientRegistration {
    state: Arc<RelayState>,
    id: u64,
}

impl ClientRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ClientRegistration {
    fn drop(&mut self) {
        self.state.clients.lock().remove(&self.id);
        tracing::info!("[Relay] Client {} disconnected", self.id);
    }
}
