//! Calendar date to trading day resolution.
//!
//! Markets are closed on weekends and holidays, so a calendar offset does not
//! map onto a fixed number of trading days. The resolver walks calendar days
//! one at a time inside an explicit bound and returns the first date the
//! series has a close for.

use crate::domain::price_series::PriceSeries;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Strictly before the anchor: `anchor - 1` down to `anchor - max_offset_days`.
    Backward,
    /// From the anchor itself: `anchor` up to `anchor + max_offset_days`.
    Forward,
}

/// Nearest trading day from `anchor` in `direction`, or `None` when no date
/// inside the bound is present in `series`.
pub fn resolve(
    series: &PriceSeries,
    anchor: NaiveDate,
    direction: Direction,
    max_offset_days: u32,
) -> Option<NaiveDate> {
    let offsets = match direction {
        Direction::Backward => 1..=i64::from(max_offset_days),
        Direction::Forward => 0..=i64::from(max_offset_days),
    };

    for offset in offsets {
        let candidate = match direction {
            Direction::Backward => anchor.checked_sub_signed(Duration::days(offset))?,
            Direction::Forward => anchor.checked_add_signed(Duration::days(offset))?,
        };
        if series.contains(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Like [`resolve`] but also returns the close on the resolved day.
pub fn resolve_close(
    series: &PriceSeries,
    anchor: NaiveDate,
    direction: Direction,
    max_offset_days: u32,
) -> Option<(NaiveDate, f64)> {
    let date = resolve(series, anchor, direction, max_offset_days)?;
    series.close_on(date).map(|close| (date, close))
}
