#![allow(dead_code)]

use billpulse::domain::error::BillpulseError;
use billpulse::domain::event::EventRecord;
use billpulse::domain::price_series::{PricePoint, PriceSeries};
use billpulse::ports::data_port::DataPort;
use billpulse::ports::event_port::EventPort;
use chrono::{Datelike, Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_points(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self, ticker: &str) -> usize {
        self.calls.borrow().iter().filter(|(t, _, _)| t == ticker).count()
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BillpulseError> {
        self.calls
            .borrow_mut()
            .push((ticker.to_string(), start_date, end_date));
        if let Some(reason) = self.errors.get(ticker) {
            return Err(BillpulseError::Database {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(ticker)
            .map(|pts| {
                pts.iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(ticker, points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, BillpulseError> {
        let mut tickers: Vec<_> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BillpulseError> {
        Ok(self
            .data
            .get(ticker)
            .and_then(|pts| PriceSeries::new(ticker, pts.clone()).date_range()))
    }
}

pub struct MockEventPort {
    pub records: Vec<EventRecord>,
}

impl EventPort for MockEventPort {
    fn load_events(&self) -> Result<Vec<EventRecord>, BillpulseError> {
        Ok(self.records.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn is_weekday(d: NaiveDate) -> bool {
    d.weekday().num_days_from_monday() < 5
}

/// Weekday closes from `start` until `count` trading days exist, each
/// produced by `price(trading_day_index)`.
pub fn weekday_points(start: NaiveDate, count: usize, price: impl Fn(usize) -> f64) -> Vec<PricePoint> {
    let mut points = Vec::with_capacity(count);
    let mut day = start;
    while points.len() < count {
        if is_weekday(day) {
            let close = price(points.len());
            points.push(PricePoint { date: day, close });
        }
        day += Duration::days(1);
    }
    points
}

pub fn record(bill_id: &str, date: &str, sector: &str, label: &str) -> EventRecord {
    EventRecord {
        bill_id: bill_id.to_string(),
        title: Some(format!("Bill {bill_id}")),
        date: date.to_string(),
        sector: Some(sector.to_string()),
        predicted_label: Some(label.to_string()),
        ..Default::default()
    }
}
