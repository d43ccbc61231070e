//! External collaborators of the feed
//!
//! The upstream WebSocket connection and the sample-data loader.

pub mod sample;
pub mod stream;

pub use sample::{fetch_sample, load_sample, read_sample};
pub use stream::{ConnectionState, SourceEvent, StreamClient};
