//! CSV file price adapter.
//!
//! One file per ticker, `<base_path>/<TICKER>.csv`, with a header row that
//! contains at least `date` (YYYY-MM-DD) and `close` columns. Other columns
//! (open, high, volume, ...) are ignored.

use crate::domain::error::BillpulseError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, BillpulseError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| BillpulseError::Database {
            reason: format!("missing {} column", name),
        })
}

/// Reads every row of a price CSV, optionally restricted to a date range.
pub fn read_price_csv(
    path: &Path,
    ticker: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<PriceSeries, BillpulseError> {
    let content = fs::read_to_string(path).map_err(|e| BillpulseError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| BillpulseError::Database {
            reason: format!("CSV parse error: {}", e),
        })?
        .clone();
    let date_col = column_index(&headers, "date")?;
    let close_col = column_index(&headers, "close")?;

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| BillpulseError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = record.get(date_col).ok_or_else(|| BillpulseError::Database {
            reason: "missing date value".into(),
        })?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            BillpulseError::Database {
                reason: format!("invalid date format: {}", e),
            }
        })?;

        if let Some((start, end)) = range {
            if date < start || date > end {
                continue;
            }
        }

        let close: f64 = record
            .get(close_col)
            .ok_or_else(|| BillpulseError::Database {
                reason: "missing close value".into(),
            })?
            .trim()
            .parse()
            .map_err(|e| BillpulseError::Database {
                reason: format!("invalid close value: {}", e),
            })?;

        let point = PricePoint { date, close };
        if !point.has_valid_close() {
            return Err(BillpulseError::Database {
                reason: format!(
                    "{}: invalid close {} on {}",
                    path.display(),
                    close,
                    date
                ),
            });
        }
        points.push(point);
    }

    Ok(PriceSeries::new(ticker.to_uppercase(), points))
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BillpulseError> {
        read_price_csv(&self.csv_path(ticker), ticker, Some((start_date, end_date)))
    }

    fn list_tickers(&self) -> Result<Vec<String>, BillpulseError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BillpulseError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BillpulseError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BillpulseError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            return Ok(None);
        }
        Ok(read_price_csv(&path, ticker, None)?.date_range())
    }
}
