//! Certificate observation event

use super::error::DropReason;
use super::message::{CertUpdateData, StreamMessage};

/// A single observed certificate, ready for display
#[derive(Clone, Debug, PartialEq)]
pub struct CertEvent {
    /// When the certificate was logged (seconds since epoch), if known
    pub seen_at: Option<f64>,

    /// First entry of the domain list
    pub common_name: String,

    /// Remaining domain entries, in wire order
    pub subject_alt_names: Vec<String>,
}

impl CertEvent {
    /// Split a domain list into common name and SANs
    ///
    /// An empty list has no common name and is rejected.
    pub fn from_domains(domains: Vec<String>, seen_at: Option<f64>) -> Result<Self, DropReason> {
        let mut domains = domains.into_iter();
        let common_name = domains.next().ok_or(DropReason::EmptyDomainList)?;

        Ok(Self {
            seen_at,
            common_name,
            subject_alt_names: domains.collect(),
        })
    }

    /// Extract the displayable event from a wire frame
    pub fn from_message(message: StreamMessage) -> Result<Self, DropReason> {
        if message.is_heartbeat() {
            return Err(DropReason::HeartbeatIgnored);
        }

        let CertUpdateData {
            leaf_cert, seen, ..
        } = message.data.ok_or(DropReason::MalformedPayload)?;

        Self::from_domains(leaf_cert.all_domains, seen)
    }

    /// Seen timestamp floored to whole seconds
    pub fn seen_secs(&self) -> Option<i64> {
        self.seen_at
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.floor() as i64)
    }
}
