//! Relay response and frame types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::HEARTBEAT;

/// Keepalive frame the relay sends to its own clients
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatFrame {
    pub message_type: String,
    /// Unix time (fractional seconds) the heartbeat was sent
    pub timestamp: f64,
}

impl HeartbeatFrame {
    pub fn new(timestamp: f64) -> Self {
        Self {
            message_type: HEARTBEAT.to_string(),
            timestamp,
        }
    }
}

/// Body of `/latest.json`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatestResponse {
    /// Recent packets, oldest first
    pub messages: Vec<Value>,
}

/// Body of the stats endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub connected_client_count: usize,
    /// (address, connection age) pairs
    pub clients: Vec<(String, String)>,
}

/// Notice sent to a client that fell behind the broadcast channel
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaggedNotice {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub code: String,
    pub message: String,
}

impl LaggedNotice {
    pub fn new(missed: u64) -> Self {
        Self {
            msg_type: "error".to_string(),
            code: "lagged".to_string(),
            message: format!("Missed {} messages", missed),
        }
    }
}
