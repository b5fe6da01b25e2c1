//! Dated bill events and their predicted market direction.

use crate::domain::error::BillpulseError;
use crate::domain::sector::{Sector, predict_sectors};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directional label, both as a prediction and as an observed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = BillpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Label::Positive),
            "negative" => Ok(Label::Negative),
            "neutral" => Ok(Label::Neutral),
            _ => Err(BillpulseError::InvalidLabel {
                label: s.to_string(),
            }),
        }
    }
}

/// An event as delivered by the ingestion layer, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub bill_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// `YYYY-MM-DD`; empty when the source had no date.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub predicted_label: Option<String>,
    /// Raw classifier verdict, e.g. `RELEVANT, energy, positive`.
    #[serde(default)]
    pub llm_analysis: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A validated event ready for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub bill_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub sector: Sector,
    pub predicted_label: Label,
}

impl Event {
    pub fn ticker(&self) -> &'static str {
        self.sector.ticker()
    }
}

/// Parsed form of a classifier response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierVerdict {
    Relevant { sector: Sector, label: Label },
    NotRelevant,
}

/// Parses `RELEVANT, <sector>, <positive|negative>` or `NOT_RELEVANT`.
///
/// Brackets around fields are tolerated since the model sometimes echoes the
/// prompt template.
pub fn parse_classifier_response(response: &str) -> Result<ClassifierVerdict, BillpulseError> {
    let line = response.trim();
    let upper = line.to_uppercase();
    if upper.starts_with("NOT_RELEVANT") || upper.starts_with("NOT RELEVANT") {
        return Ok(ClassifierVerdict::NotRelevant);
    }
    if !upper.starts_with("RELEVANT") {
        return Err(BillpulseError::EventParse {
            reason: format!("unrecognised classifier response: {line}"),
        });
    }

    let fields: Vec<&str> = line
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '[' || c == ']').trim())
        .collect();
    if fields.len() != 3 {
        return Err(BillpulseError::EventParse {
            reason: format!("expected 3 fields in classifier response: {line}"),
        });
    }

    let sector = fields[1].parse::<Sector>()?;
    let label = fields[2].parse::<Label>()?;
    Ok(ClassifierVerdict::Relevant { sector, label })
}

impl TryFrom<&EventRecord> for Event {
    type Error = BillpulseError;

    /// Explicit `sector`/`predicted_label` fields take precedence over the
    /// classifier verdict; keyword prediction is the last resort for the
    /// sector only.
    fn try_from(record: &EventRecord) -> Result<Self, Self::Error> {
        let raw_date = record.date.trim();
        if raw_date.is_empty() {
            return Err(BillpulseError::EventParse {
                reason: format!("{}: missing date", record.bill_id),
            });
        }
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            BillpulseError::EventParse {
                reason: format!("{}: invalid date {:?}: {}", record.bill_id, record.date, e),
            }
        })?;

        // The verdict is only consulted for fields the record leaves out.
        let parse_verdict = || -> Result<Option<ClassifierVerdict>, BillpulseError> {
            match record.llm_analysis.as_deref() {
                Some(response) if !response.trim().is_empty() => {
                    parse_classifier_response(response).map(Some)
                }
                _ => Ok(None),
            }
        };

        let (sector, predicted_label) = match (&record.sector, &record.predicted_label) {
            (Some(name), Some(label)) => (name.parse::<Sector>()?, label.parse::<Label>()?),
            (sector_field, label_field) => {
                let verdict = parse_verdict()?;
                if verdict == Some(ClassifierVerdict::NotRelevant)
                    && sector_field.is_none()
                    && label_field.is_none()
                {
                    return Err(BillpulseError::EventParse {
                        reason: format!("{}: classified as not sector-relevant", record.bill_id),
                    });
                }

                let sector = match (sector_field, verdict) {
                    (Some(name), _) => name.parse::<Sector>()?,
                    (None, Some(ClassifierVerdict::Relevant { sector, .. })) => sector,
                    (None, _) => record
                        .text
                        .as_deref()
                        .and_then(|text| predict_sectors(text).first().map(|(s, _)| *s))
                        .ok_or_else(|| BillpulseError::UnknownSector {
                            name: format!("{}: no sector given or predicted", record.bill_id),
                        })?,
                };

                let label = match (label_field, verdict) {
                    (Some(label), _) => label.parse::<Label>()?,
                    (None, Some(ClassifierVerdict::Relevant { label, .. })) => label,
                    (None, _) => {
                        return Err(BillpulseError::InvalidLabel {
                            label: String::new(),
                        });
                    }
                };
                (sector, label)
            }
        };

        Ok(Event {
            bill_id: record.bill_id.clone(),
            title: record.title.clone().unwrap_or_default(),
            date,
            sector,
            predicted_label,
        })
    }
}
