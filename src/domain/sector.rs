//! Sector to proxy-ETF mapping.
//!
//! Each sector is represented by one SPDR sector ETF. The keyword lists feed
//! the fallback sector predictor used when an event arrives without a
//! classifier verdict.

use crate::domain::error::BillpulseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Healthcare,
    Technology,
    Finance,
    Energy,
    Consumer,
    Industrials,
    Materials,
}

impl Sector {
    pub const ALL: [Sector; 7] = [
        Sector::Healthcare,
        Sector::Technology,
        Sector::Finance,
        Sector::Energy,
        Sector::Consumer,
        Sector::Industrials,
        Sector::Materials,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sector::Healthcare => "healthcare",
            Sector::Technology => "technology",
            Sector::Finance => "finance",
            Sector::Energy => "energy",
            Sector::Consumer => "consumer",
            Sector::Industrials => "industrials",
            Sector::Materials => "materials",
        }
    }

    /// Proxy instrument for the sector.
    pub fn ticker(self) -> &'static str {
        match self {
            Sector::Healthcare => "XLV",
            Sector::Technology => "XLK",
            Sector::Finance => "XLF",
            Sector::Energy => "XLE",
            Sector::Consumer => "XLY",
            Sector::Industrials => "XLI",
            Sector::Materials => "XLB",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Sector::Healthcare => &[
                "health", "medical", "drug", "pharmaceutical", "medicare", "medicaid",
                "hospital", "patient", "disease", "clinical", "healthcare", "prescription",
                "fda", "vaccine", "treatment", "therapy", "nursing",
            ],
            Sector::Technology => &[
                "technology", "tech", "software", "data", "cyber", "internet", "digital",
                "ai", "artificial intelligence", "semiconductor", "computer", "algorithm",
                "broadband", "5g", "telecom", "communications",
            ],
            Sector::Finance => &[
                "bank", "finance", "financial", "loan", "credit", "mortgage", "insurance",
                "deposit", "banking", "investor", "securities", "investment", "capital",
                "interest rate", "fed", "federal reserve",
            ],
            Sector::Energy => &[
                "energy", "oil", "gas", "petroleum", "fossil fuel", "renewable", "solar",
                "wind", "coal", "fuel", "power plant", "utility", "electric",
            ],
            Sector::Consumer => &[
                "consumer", "retail", "store", "shop", "purchase", "sales", "product",
                "brand", "restaurant", "food service", "advertising", "e-commerce",
            ],
            Sector::Industrials => &[
                "manufacturing", "industrial", "factory", "construction", "infrastructure",
                "machinery", "transport", "airline", "defense", "aerospace", "railroad",
            ],
            Sector::Materials => &[
                "material", "chemical", "mining", "metal", "steel", "commodity",
                "agriculture", "cement", "paper", "plastic",
            ],
        }
    }

    pub fn from_ticker(ticker: &str) -> Option<Sector> {
        Sector::ALL
            .into_iter()
            .find(|s| s.ticker().eq_ignore_ascii_case(ticker.trim()))
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = BillpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BillpulseError::UnknownSector {
                name: s.to_string(),
            })
    }
}

/// Scores every sector by raw keyword occurrence count in `text`.
///
/// Returns sectors with a non-zero score, highest first. Ties keep the
/// declaration order of [`Sector::ALL`].
pub fn predict_sectors(text: &str) -> Vec<(Sector, usize)> {
    let lower = text.to_lowercase();
    let mut scores: Vec<(Sector, usize)> = Sector::ALL
        .into_iter()
        .map(|sector| {
            let score = sector
                .keywords()
                .iter()
                .map(|kw| lower.matches(kw).count())
                .sum();
            (sector, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Healthcare".parse::<Sector>().unwrap(), Sector::Healthcare);
        assert_eq!(" ENERGY ".parse::<Sector>().unwrap(), Sector::Energy);
    }

    #[test]
    fn unknown_sector_is_an_error() {
        let err = "utilities".parse::<Sector>().unwrap_err();
        assert!(matches!(err, BillpulseError::UnknownSector { name } if name == "utilities"));
    }

    #[test]
    fn tickers_are_unique() {
        let mut tickers: Vec<_> = Sector::ALL.iter().map(|s| s.ticker()).collect();
        tickers.sort();
        tickers.dedup();
        assert_eq!(tickers.len(), Sector::ALL.len());
    }

    #[test]
    fn from_ticker_round_trips() {
        for sector in Sector::ALL {
            assert_eq!(Sector::from_ticker(sector.ticker()), Some(sector));
        }
        assert_eq!(Sector::from_ticker("xlv"), Some(Sector::Healthcare));
        assert_eq!(Sector::from_ticker("SPY"), None);
    }

    #[test]
    fn predict_sectors_ranks_by_count() {
        let text = "A bill to expand Medicare drug coverage and hospital funding for oil states";
        let ranked = predict_sectors(text);
        assert_eq!(ranked[0].0, Sector::Healthcare);
        assert!(ranked.iter().any(|(s, _)| *s == Sector::Energy));
    }

    #[test]
    fn predict_sectors_empty_for_unrelated_text() {
        assert!(predict_sectors("To designate the post office building").is_empty());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Sector::Industrials).unwrap();
        assert_eq!(json, "\"industrials\"");
    }
}
