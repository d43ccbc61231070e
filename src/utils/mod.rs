//! Utility functions and helpers
//!
//! This module contains timestamp utilities.

pub mod time;

pub use time::{
    current_timestamp, current_timestamp_f64, current_timestamp_ms, format_display_time,
    local_offset, pretty_since, utc_offset,
};
