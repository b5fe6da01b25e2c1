//! Configuration access port trait.
//!
//! Raw lookups fall back to the caller's default when a key is absent or does
//! not parse. The typed helpers report those cases as config errors instead.

use crate::domain::error::BillpulseError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Required `YYYY-MM-DD` value.
    fn get_date(&self, section: &str, key: &str) -> Result<NaiveDate, BillpulseError> {
        let value = self
            .get_string(section, key)
            .ok_or_else(|| BillpulseError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })?;
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            BillpulseError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {key} format, expected YYYY-MM-DD"),
            }
        })
    }

    /// Non-negative calendar-day count, `default` when absent.
    fn get_days(&self, section: &str, key: &str, default: u32) -> Result<u32, BillpulseError> {
        let value = self.get_int(section, key, i64::from(default));
        u32::try_from(value).map_err(|_| BillpulseError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a non-negative number of days"),
        })
    }
}
