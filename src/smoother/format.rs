//! Display line formatting

use chrono::FixedOffset;

use crate::types::{CertEvent, StreamMessage};
use crate::utils::format_display_time;

/// Render an event as `[MM/DD/YY HH:mm:ss] cn (SAN: a, b)`
///
/// The event's own `seen` time wins; `released_at` (Unix seconds) is used
/// for events that carry none. The SAN suffix is omitted when the
/// certificate covers only its common name.
pub fn format_line(event: &CertEvent, released_at: i64, offset: &FixedOffset) -> String {
    let secs = event.seen_secs().unwrap_or(released_at);
    let mut line = format!(
        "[{}] {}",
        format_display_time(secs, offset),
        event.common_name
    );

    if !event.subject_alt_names.is_empty() {
        line.push_str(" (SAN: ");
        line.push_str(&event.subject_alt_names.join(", "));
        line.push(')');
    }

    line
}

/// Static preview of a sample batch, newest first
///
/// Takes the first `count` frames and lists them the way successive
/// prepends would leave them on screen. Frames that are not displayable
/// are skipped.
pub fn preview_lines(
    messages: &[StreamMessage],
    count: usize,
    released_at: i64,
    offset: &FixedOffset,
) -> Vec<String> {
    messages
        .iter()
        .take(count)
        .filter_map(|message| CertEvent::from_message(message.clone()).ok())
        .map(|event| format_line(&event, released_at, offset))
        .rev()
        .collect()
}
