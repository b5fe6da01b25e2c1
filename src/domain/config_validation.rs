//! Configuration validation.
//!
//! Validates all config fields before an analysis runs.

use crate::domain::error::BillpulseError;
use crate::ports::config_port::ConfigPort;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    validate_data_source(config)?;
    validate_baseline_dates(config)?;
    validate_horizon(config)?;
    validate_window(config)?;
    validate_threshold(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> BillpulseError {
    BillpulseError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> BillpulseError {
    BillpulseError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> bool {
    matches!(config.get_string(section, key), Some(s) if !s.trim().is_empty())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => {
            if !non_empty(config, "data", "csv_dir") {
                return Err(missing("data", "csv_dir"));
            }
        }
        "sqlite" => {
            if !non_empty(config, "sqlite", "path") {
                return Err(missing("sqlite", "path"));
            }
            if config.get_int("sqlite", "pool_size", 4) < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
        }
        _ => return Err(invalid("data", "source", "source must be csv or sqlite")),
    }
    Ok(())
}

fn validate_baseline_dates(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    let start_date = config.get_date("baseline", "start_date")?;
    let end_date = config.get_date("baseline", "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "baseline",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    let value = config.get_int("baseline", "horizon_days", 30);
    if value < 1 {
        return Err(invalid(
            "baseline",
            "horizon_days",
            "horizon_days must be at least 1",
        ));
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    match config
        .get_string("window", "mode")
        .map(|m| m.trim().to_lowercase())
        .as_deref()
    {
        None | Some("around") | Some("on_date") => {}
        Some(_) => return Err(invalid("window", "mode", "mode must be around or on_date")),
    }

    for (key, default) in [
        ("before_days", 30),
        ("after_horizon_days", 30),
        ("after_window_days", 30),
        ("on_date_window_days", 10),
    ] {
        config.get_days("window", key, default)?;
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), BillpulseError> {
    let value = config.get_double("grading", "threshold", 2.0);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "grading",
            "threshold",
            "threshold must be a non-negative number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const BASE: &str = "[data]\ncsv_dir = prices\n[baseline]\nstart_date = 2015-01-01\nend_date = 2024-12-31\n";

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[data]
source = csv
csv_dir = data/prices

[baseline]
start_date = 2015-01-01
end_date = 2024-12-31
horizon_days = 30

[window]
mode = around
before_days = 30
after_horizon_days = 30
after_window_days = 30

[grading]
threshold = 2.0
"#,
        );
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn defaults_are_accepted() {
        assert!(validate_analysis_config(&make_config(BASE)).is_ok());
    }

    #[test]
    fn missing_csv_dir_fails() {
        let config = make_config("[baseline]\nstart_date = 2015-01-01\nend_date = 2024-12-31\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn sqlite_source_needs_path() {
        let config = make_config("[data]\nsource = sqlite\n[baseline]\nstart_date = 2015-01-01\nend_date = 2024-12-31\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(
            matches!(err, BillpulseError::ConfigMissing { section, key } if section == "sqlite" && key == "path")
        );
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[data]\nsource = parquet\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn missing_start_date_fails() {
        let config = make_config("[data]\ncsv_dir = p\n[baseline]\nend_date = 2024-12-31\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[data]\ncsv_dir = p\n[baseline]\nstart_date = 01/01/2015\nend_date = 2024-12-31\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[data]\ncsv_dir = p\n[baseline]\nstart_date = 2024-12-31\nend_date = 2015-01-01\n");
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn zero_horizon_fails() {
        let config = make_config(&format!("{BASE}horizon_days = 0\n"));
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "horizon_days"));
    }

    #[test]
    fn unknown_window_mode_fails() {
        let config = make_config(&format!("{BASE}[window]\nmode = sideways\n"));
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "mode"));
    }

    #[test]
    fn negative_window_fails() {
        let config = make_config(&format!("{BASE}[window]\nbefore_days = -3\n"));
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "before_days"));
    }

    #[test]
    fn negative_threshold_fails() {
        let config = make_config(&format!("{BASE}[grading]\nthreshold = -1\n"));
        let err = validate_analysis_config(&config).unwrap_err();
        assert!(matches!(err, BillpulseError::ConfigInvalid { key, .. } if key == "threshold"));
    }
}
