//! Time and timestamp utilities

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Display pattern for feed lines (MM/DD/YY HH:mm:ss)
pub const DISPLAY_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Get current Unix timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Current Unix time as fractional seconds, the heartbeat timestamp format
pub fn current_timestamp_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Offset of the local time zone right now
pub fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// UTC as a fixed offset
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Format Unix seconds for a feed line in the given offset
///
/// Out-of-range timestamps fall back to the epoch.
pub fn format_display_time(secs: i64, offset: &FixedOffset) -> String {
    let utc = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    utc.with_timezone(offset).format(DISPLAY_FORMAT).to_string()
}

/// Human readable age of a Unix timestamp relative to `now`
pub fn pretty_since(then: u64, now: u64) -> String {
    let diff = now.saturating_sub(then);

    match diff {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{} seconds ago", diff),
        60..=119 => "a minute ago".to_string(),
        120..=3599 => format!("{} minutes ago", diff / 60),
        3600..=7199 => "an hour ago".to_string(),
        7200..=86399 => format!("{} hours ago", diff / 3600),
        86400..=172799 => "Yesterday".to_string(),
        _ => format!("{} days ago", diff / 86400),
    }
}
