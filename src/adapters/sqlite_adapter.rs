//! SQLite price store.
//!
//! Persists fetched close series between runs so baselines over long history
//! do not need to be re-downloaded. Dates are stored as `YYYY-MM-DD` text,
//! which sorts chronologically.

use crate::domain::error::BillpulseError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> BillpulseError {
    BillpulseError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> BillpulseError {
    BillpulseError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, BillpulseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| BillpulseError::Database {
        reason: format!("stored date {:?}: {}", value, e),
    })
}

impl SqliteAdapter {
    /// Opens the database named by `[sqlite] path` and ensures the schema exists.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BillpulseError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BillpulseError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4))
            .ok()
            .filter(|size| *size >= 1)
            .ok_or_else(|| BillpulseError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: "pool_size must be between 1 and 4294967295".into(),
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, BillpulseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, BillpulseError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), BillpulseError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL NOT NULL,
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_prices_ticker ON prices(ticker);",
            )
            .map_err(query_err)
    }

    /// Upserts every point of `series`. Returns the number of rows written.
    /// Nothing is written if any close is non-finite or non-positive.
    pub fn import_series(&self, series: &PriceSeries) -> Result<usize, BillpulseError> {
        if let Some(bad) = series.points().iter().find(|p| !p.has_valid_close()) {
            return Err(BillpulseError::Database {
                reason: format!(
                    "refusing to import invalid close {} for {} on {}",
                    bad.close,
                    series.ticker(),
                    bad.date
                ),
            });
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO prices (ticker, date, close) VALUES (?1, ?2, ?3)",
                )
                .map_err(query_err)?;
            for point in series.points() {
                written += stmt
                    .execute(params![
                        series.ticker(),
                        point.date.format(DATE_FORMAT).to_string(),
                        point.close
                    ])
                    .map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)?;
        Ok(written)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BillpulseError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, close FROM prices
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![
                    ticker.to_uppercase(),
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )
            .map_err(query_err)?;

        let mut points = Vec::new();
        for row in rows {
            let (date_str, close) = row.map_err(query_err)?;
            let point = PricePoint {
                date: parse_stored_date(&date_str)?,
                close,
            };
            if !point.has_valid_close() {
                return Err(BillpulseError::Database {
                    reason: format!(
                        "stored close {} for {} on {} is invalid",
                        close,
                        ticker.to_uppercase(),
                        point.date
                    ),
                });
            }
            points.push(point);
        }

        Ok(PriceSeries::new(ticker.to_uppercase(), points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, BillpulseError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM prices ORDER BY ticker")
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BillpulseError> {
        let conn = self.conn()?;
        let (min, max, count): (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE ticker = ?1",
                params![ticker.to_uppercase()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((
                parse_stored_date(&min)?,
                parse_stored_date(&max)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
