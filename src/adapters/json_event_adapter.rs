//! JSON file event adapter.
//!
//! Reads the array of bill records produced by the ingestion/classification
//! step. Unknown fields are ignored so the raw scraper output can be fed in
//! directly.

use crate::domain::error::BillpulseError;
use crate::domain::event::EventRecord;
use crate::ports::event_port::EventPort;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct JsonEventAdapter {
    path: PathBuf,
}

/// Scraper output names the id fields separately and calls the date
/// `latest_action_date`; both shapes are accepted.
#[derive(Debug, Deserialize)]
struct RawBill {
    #[serde(default)]
    bill_id: Option<String>,
    #[serde(default)]
    bill_type: Option<String>,
    #[serde(default)]
    bill_number: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "latest_action_date", alias = "enactment_date")]
    date: Option<String>,
    #[serde(default, alias = "primary_sector")]
    sector: Option<String>,
    #[serde(default, alias = "label")]
    predicted_label: Option<String>,
    #[serde(default)]
    llm_analysis: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl RawBill {
    /// A missing date is passed through empty so the engine rejects only
    /// this record.
    fn into_record(self, index: usize) -> EventRecord {
        let number = match self.bill_number {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let bill_id = match (self.bill_id, self.bill_type, number) {
            (Some(id), _, _) => id,
            (None, Some(kind), Some(number)) => format!("{}-{}", kind.to_lowercase(), number),
            (None, None, Some(number)) => number,
            _ => format!("#{}", index + 1),
        };
        EventRecord {
            bill_id,
            title: self.title,
            date: self.date.unwrap_or_default(),
            sector: self.sector,
            predicted_label: self.predicted_label,
            llm_analysis: self.llm_analysis,
            text: self.text,
        }
    }
}

impl JsonEventAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<EventRecord>, BillpulseError> {
        let raw: Vec<RawBill> =
            serde_json::from_str(content).map_err(|e| BillpulseError::EventParse {
                reason: format!("invalid events JSON: {}", e),
            })?;
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, bill)| bill.into_record(i))
            .collect())
    }
}

impl EventPort for JsonEventAdapter {
    fn load_events(&self) -> Result<Vec<EventRecord>, BillpulseError> {
        let content = fs::read_to_string(&self.path)?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_engine_shape() {
        let json = r#"[
            {"bill_id": "hr-100", "title": "Clean Energy Act", "date": "2023-08-16",
             "sector": "energy", "predicted_label": "positive"}
        ]"#;
        let records = JsonEventAdapter::parse(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bill_id, "hr-100");
        assert_eq!(records[0].sector.as_deref(), Some("energy"));
        assert_eq!(records[0].predicted_label.as_deref(), Some("positive"));
    }

    #[test]
    fn parses_scraper_shape() {
        let json = r#"[
            {"bill_type": "HR", "bill_number": 3746, "title": "Fiscal Responsibility Act",
             "latest_action_date": "2023-06-03",
             "llm_analysis": "RELEVANT, finance, negative", "text": "...", "url": "x"}
        ]"#;
        let records = JsonEventAdapter::parse(json).unwrap();
        assert_eq!(records[0].bill_id, "hr-3746");
        assert_eq!(records[0].date, "2023-06-03");
        assert_eq!(
            records[0].llm_analysis.as_deref(),
            Some("RELEVANT, finance, negative")
        );
    }

    #[test]
    fn falls_back_to_position_for_id() {
        let json = r#"[{"date": "2023-01-01"}, {"date": "2023-01-02"}]"#;
        let records = JsonEventAdapter::parse(json).unwrap();
        assert_eq!(records[1].bill_id, "#2");
    }

    #[test]
    fn missing_date_keeps_the_other_records() {
        let json = r#"[{"bill_id": "s-9"}, {"bill_id": "s-10", "date": "2023-01-02"}]"#;
        let records = JsonEventAdapter::parse(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bill_id, "s-9");
        assert_eq!(records[0].date, "");
        assert_eq!(records[1].date, "2023-01-02");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            JsonEventAdapter::parse("{not json"),
            Err(BillpulseError::EventParse { .. })
        ));
    }

    #[test]
    fn load_events_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"[{"bill_id": "s-1", "date": "2022-08-16", "sector": "healthcare", "label": "positive"}]"#,
        )
        .unwrap();
        let adapter = JsonEventAdapter::new(file.path().to_path_buf());
        let records = adapter.load_events().unwrap();
        assert_eq!(records[0].predicted_label.as_deref(), Some("positive"));
    }

    #[test]
    fn load_events_missing_file_is_io_error() {
        let adapter = JsonEventAdapter::new(PathBuf::from("/nonexistent/events.json"));
        assert!(matches!(adapter.load_events(), Err(BillpulseError::Io(_))));
    }
}
