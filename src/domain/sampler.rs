//! Before/after price sampling around an event date.

use crate::domain::error::BillpulseError;
use crate::domain::price_series::PriceSeries;
use crate::domain::resolver::{Direction, resolve_close};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// How the first price of the pair is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPoint {
    /// Last trading day strictly before the anchor, within `window_days`.
    Before { window_days: u32 },
    /// First trading day on or after the anchor, within `window_days`.
    OnDate { window_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub start: StartPoint,
    /// Calendar days from the anchor to where the forward search for the
    /// second price begins.
    pub after_horizon_days: u32,
    pub after_window_days: u32,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self {
            start: StartPoint::Before { window_days: 30 },
            after_horizon_days: 30,
            after_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservedMove {
    pub date_before: NaiveDate,
    pub price_before: f64,
    pub date_after: NaiveDate,
    pub price_after: f64,
    pub pct_change: f64,
}

/// Percentage change from `before` to `after`. A zero starting price is
/// malformed data and is reported rather than coerced.
pub fn pct_change(before: f64, after: f64) -> Result<f64, BillpulseError> {
    if before == 0.0 {
        return Err(BillpulseError::DivisionByZero {
            context: "starting price is zero".into(),
        });
    }
    Ok((after - before) / before * 100.0)
}

/// Samples a price pair around `anchor`.
///
/// `Ok(None)` means one of the endpoints had no trading day inside its
/// window; a partial sample is never returned.
pub fn sample(
    series: &PriceSeries,
    anchor: NaiveDate,
    window: &SampleWindow,
) -> Result<Option<ObservedMove>, BillpulseError> {
    let before = match window.start {
        StartPoint::Before { window_days } => {
            resolve_close(series, anchor, Direction::Backward, window_days)
        }
        StartPoint::OnDate { window_days } => {
            resolve_close(series, anchor, Direction::Forward, window_days)
        }
    };
    let Some((date_before, price_before)) = before else {
        return Ok(None);
    };

    let Some(after_anchor) =
        anchor.checked_add_signed(Duration::days(i64::from(window.after_horizon_days)))
    else {
        return Ok(None);
    };
    let Some((date_after, price_after)) = resolve_close(
        series,
        after_anchor,
        Direction::Forward,
        window.after_window_days,
    ) else {
        return Ok(None);
    };

    let pct_change = pct_change(price_before, price_after).map_err(|_| {
        BillpulseError::DivisionByZero {
            context: format!(
                "{} close on {} is zero",
                series.ticker(),
                date_before
            ),
        }
    })?;

    Ok(Some(ObservedMove {
        date_before,
        price_before,
        date_after,
        price_after,
        pct_change,
    }))
}
