//! Data types for the certstream feed
//!
//! Wire frames, the displayable certificate event and error types.

mod cert;
mod error;
mod message;

pub use cert::CertEvent;
pub use error::{DropReason, FeedError, FeedResult};
pub use message::{
    CertUpdateData, LeafCert, LogSource, SampleBatch, StreamMessage, CERTIFICATE_UPDATE,
    HEARTBEAT,
};
