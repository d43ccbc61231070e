//! Wire envelope for certstream messages

use serde::{Deserialize, Serialize};

/// Message type carried by keepalive frames
pub const HEARTBEAT: &str = "heartbeat";

/// Message type carried by certificate frames
pub const CERTIFICATE_UPDATE: &str = "certificate_update";

/// A single frame received from a certstream server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamMessage {
    pub message_type: String,

    /// Certificate payload, absent on heartbeats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CertUpdateData>,
}

impl StreamMessage {
    /// Build a certificate update frame
    pub fn certificate_update(data: CertUpdateData) -> Self {
        Self {
            message_type: CERTIFICATE_UPDATE.to_string(),
            data: Some(data),
        }
    }

    /// Build a heartbeat frame
    pub fn heartbeat() -> Self {
        Self {
            message_type: HEARTBEAT.to_string(),
            data: None,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.message_type == HEARTBEAT
    }
}

/// Certificate payload of a `certificate_update` frame
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CertUpdateData {
    pub leaf_cert: LeafCert,

    /// Unix timestamp (seconds, possibly fractional) when the log entry was seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen: Option<f64>,

    /// "X509LogEntry" or "PreCertEntry"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_index: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<LogSource>,
}

impl CertUpdateData {
    /// Payload with only a domain list, as synthesized by tests and demos
    pub fn with_domains(domains: Vec<String>, seen: Option<f64>) -> Self {
        Self {
            leaf_cert: LeafCert {
                all_domains: domains,
            },
            seen,
            update_type: None,
            cert_index: None,
            source: None,
        }
    }
}

/// Leaf certificate fields the feed cares about
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeafCert {
    /// Common name first, then SAN entries
    #[serde(default)]
    pub all_domains: Vec<String>,
}

/// The CT log an entry came from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogSource {
    pub url: String,
    pub name: String,
}

/// A batch of recent frames, as served from `/latest.json`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SampleBatch {
    #[serde(default)]
    pub messages: Vec<StreamMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_certificate_update() {
        let json = r#"{
            "message_type": "certificate_update",
            "data": {
                "update_type": "X509LogEntry",
                "leaf_cert": {"all_domains": ["example.com", "www.example.com"], "subject": {"CN": "example.com"}},
                "cert_index": 42,
                "seen": 1700000000.25,
                "source": {"url": "ct.googleapis.com/logs/argon2023", "name": "Google 'Argon2023' log"}
            }
        }"#;

        let msg: StreamMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.is_heartbeat());
        let data = msg.data.unwrap();
        assert_eq!(data.leaf_cert.all_domains.len(), 2);
        assert_eq!(data.seen, Some(1700000000.25));
        assert_eq!(data.cert_index, Some(42));
        assert_eq!(data.source.unwrap().name, "Google 'Argon2023' log");
    }

    #[test]
    fn test_parses_heartbeat_without_data() {
        let json = r#"{"message_type": "heartbeat", "timestamp": 1700000000.5}"#;
        let msg: StreamMessage = serde_json::from_str(json).unwrap();
        assert!(msg.is_heartbeat());
        assert!(msg.data.is_none());
    }

    #[test]
    fn test_heartbeat_serializes_without_data() {
        let json = serde_json::to_string(&StreamMessage::heartbeat()).unwrap();
        assert_eq!(json, r#"{"message_type":"heartbeat"}"#);
    }

    #[test]
    fn test_sample_batch_defaults_to_empty() {
        let batch: SampleBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.messages.is_empty());
    }
}
