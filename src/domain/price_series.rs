//! Closing-price series for one proxy instrument.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    /// A usable close is finite and strictly positive.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Trading-day closes for a single ticker, sorted by date with no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from points in any order. On duplicate dates the last
    /// point supplied wins.
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.reverse();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            points: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closing price on `date`, if that date is a trading day in the series.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.close_on(date).is_some()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// (first date, last date, point count), or `None` for an empty series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate, usize)> {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => Some((a.date, b.date, self.len())),
            _ => None,
        }
    }

    /// Percentage change from the first to the last close.
    pub fn total_change_pct(&self) -> Option<f64> {
        let start = self.first()?.close;
        let end = self.last()?.close;
        if start == 0.0 {
            return None;
        }
        Some((end - start) / start * 100.0)
    }
}
