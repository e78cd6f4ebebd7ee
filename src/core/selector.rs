//! Cheapest hours selection.
//!
//! All the functions take a shared snapshot of the price table and never reorder it:
//! candidates are copied out first, and then stable-sorted by price, so ties keep the
//! provider's chronological order.

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike};
use itertools::Itertools;

use crate::core::point::PricePoint;

/// Select the `n` cheapest hours out of the entire table.
#[must_use]
pub fn cheapest(table: &[PricePoint], n: i64) -> Vec<PricePoint> {
    take_cheapest(table.iter().copied(), n)
}

/// Select the `n` cheapest hours which start in the current hour or later.
#[must_use]
pub fn cheapest_since(table: &[PricePoint], now: DateTime<FixedOffset>, n: i64) -> Vec<PricePoint> {
    let since = truncate_to_hour(now);
    take_cheapest(table.iter().copied().filter(|point| point.starts_at >= since), n)
}

/// Select the `n` cheapest hours which start within `[from, from + window_hours]`.
///
/// The window start gets truncated to the hour, and both ends are inclusive.
#[must_use]
pub fn cheapest_within(
    table: &[PricePoint],
    from: DateTime<FixedOffset>,
    window_hours: i64,
    n: i64,
) -> Vec<PricePoint> {
    if window_hours < 0 {
        return Vec::new();
    }
    let start = truncate_to_hour(from);

    // `None` means that the end does not fit into the calendar, so the window is open-ended:
    let end = TimeDelta::try_hours(window_hours).and_then(|delta| start.checked_add_signed(delta));

    take_cheapest(
        table.iter().copied().filter(|point| {
            point.starts_at >= start && end.is_none_or(|end| point.starts_at <= end)
        }),
        n,
    )
}

/// Truncate the timestamp down to the hour boundary in its own offset.
#[must_use]
pub fn truncate_to_hour(timestamp: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    timestamp
        .with_minute(0)
        .and_then(|timestamp| timestamp.with_second(0))
        .and_then(|timestamp| timestamp.with_nanosecond(0))
        .unwrap_or(timestamp)
}

fn take_cheapest(candidates: impl Iterator<Item = PricePoint>, n: i64) -> Vec<PricePoint> {
    let Ok(n) = usize::try_from(n) else {
        return Vec::new();
    };
    candidates.sorted_by_key(|point| point.total).take(n).collect()
}
