//! Parsing of `conntrack` command-line output.
//!
//! Everything that depends on the tool's text format lives here; the rest of
//! the system only sees [`EventKind`] values and entry counts.

use super::EventKind;

/// Counts flow entries in a `conntrack --dump` listing.
///
/// The tool writes one entry per stdout line; its `conntrack v… (flow
/// entries…)` summary goes to stderr, so every non-empty stdout line is an
/// entry.
pub fn count_entries(listing: &str) -> i64 {
    listing.lines().filter(|line| !line.trim().is_empty()).count() as i64
}

/// Classifies one line of `conntrack --event` output.
///
/// Event lines are tagged with a bracketed, right-aligned event type. Only
/// NEW and DESTROY contribute to the connection count; anything else
/// (UPDATE lines from an unfiltered tracker, blank lines) is `None`.
pub fn parse_event_line(line: &str) -> Option<EventKind> {
    let line = line.trim_start();
    if line.starts_with("[NEW]") {
        Some(EventKind::Opened)
    } else if line.starts_with("[DESTROY]") {
        Some(EventKind::Closed)
    } else {
        None
    }
}
