//! Date-window filtering of parsed entries.
//!
//! Mirrors the engine's `entry.filter` so callers can filter offline and
//! check engine results against the same rule.

use crate::client::Entry;

/// How a directive kind takes part in date filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Open,
    Close,
    Commodity,
    Other,
}

impl DirectiveKind {
    pub fn parse(kind: &str) -> Self {
        if kind.eq_ignore_ascii_case("open") {
            DirectiveKind::Open
        } else if kind.eq_ignore_ascii_case("close") {
            DirectiveKind::Close
        } else if kind.eq_ignore_ascii_case("commodity") {
            DirectiveKind::Commodity
        } else {
            DirectiveKind::Other
        }
    }
}

/// Whether `entry` is visible in the window `[begin_date, end_date)`.
///
/// - `Open`: kept while the account is open before the window ends
/// - `Close`: kept if it closes at or after the window start
/// - `Commodity`: never kept
/// - anything else: kept if its date lies inside the window
///
/// Dates are ISO `YYYY-MM-DD`, for which string order is date order.
pub fn entry_in_window(entry: &Entry, begin_date: &str, end_date: &str) -> bool {
    let date = entry.date.as_str();
    match DirectiveKind::parse(&entry.kind) {
        DirectiveKind::Open => date < end_date,
        DirectiveKind::Close => date >= begin_date,
        DirectiveKind::Commodity => false,
        DirectiveKind::Other => begin_date <= date && date < end_date,
    }
}

/// Keep the entries visible in `[begin_date, end_date)`, preserving order.
pub fn filter_entries(entries: &[Entry], begin_date: &str, end_date: &str) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| entry_in_window(entry, begin_date, end_date))
        .cloned()
        .collect()
}
