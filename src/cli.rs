//! CLI definition and dispatch.

use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_event_adapter::JsonEventAdapter;
use crate::adapters::json_report_adapter::{JsonReportAdapter, skipped_path};
use crate::domain::baseline::DEFAULT_HORIZON_DAYS;
use crate::domain::config_validation::validate_analysis_config;
use crate::domain::deviation::Severity;
use crate::domain::engine::{self, AnalysisReport, EngineConfig};
use crate::domain::error::BillpulseError;
use crate::domain::grader::DEFAULT_THRESHOLD_PCT;
use crate::domain::sampler::{SampleWindow, StartPoint};
use crate::domain::sector::Sector;
use crate::domain::summary::{Summary, compare_to_benchmark};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::event_port::EventPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "billpulse", about = "Bill enactment market-reaction anomaly engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grade events against sector baselines
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Events JSON (overrides [events] path)
        #[arg(short, long)]
        events: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the baseline table as CSV
        #[arg(long)]
        baselines: Option<PathBuf>,
    },
    /// Compute and print sector baselines
    Baseline {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        sector: Option<String>,
    },
    /// List sectors and their proxy tickers
    Sectors,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import a price CSV into the SQLite store
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        csv: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            events,
            output,
            baselines,
        } => run_analyze(&config, events.as_ref(), output.as_ref(), baselines.as_ref()),
        Command::Baseline { config, sector } => run_baseline(&config, sector.as_deref()),
        Command::Sectors => run_sectors(),
        Command::Validate { config } => run_validate(&config),
        Command::ImportPrices {
            config,
            ticker,
            csv,
        } => run_import_prices(&config, &ticker, &csv),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

pub fn build_sample_window(config: &dyn ConfigPort) -> Result<SampleWindow, BillpulseError> {
    let mode = config
        .get_string("window", "mode")
        .map(|m| m.trim().to_lowercase())
        .unwrap_or_else(|| "around".to_string());

    let start = match mode.as_str() {
        "around" => StartPoint::Before {
            window_days: config.get_days("window", "before_days", 30)?,
        },
        "on_date" => StartPoint::OnDate {
            window_days: config.get_days("window", "on_date_window_days", 10)?,
        },
        _ => {
            return Err(BillpulseError::ConfigInvalid {
                section: "window".into(),
                key: "mode".into(),
                reason: "mode must be around or on_date".into(),
            });
        }
    };

    Ok(SampleWindow {
        start,
        after_horizon_days: config.get_days("window", "after_horizon_days", 30)?,
        after_window_days: config.get_days("window", "after_window_days", 30)?,
    })
}

pub fn build_engine_config(adapter: &dyn ConfigPort) -> Result<EngineConfig, BillpulseError> {
    let baseline_start = adapter.get_date("baseline", "start_date")?;
    let baseline_end = adapter.get_date("baseline", "end_date")?;

    let horizon = adapter.get_int("baseline", "horizon_days", DEFAULT_HORIZON_DAYS as i64);
    let horizon_days = usize::try_from(horizon)
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| BillpulseError::ConfigInvalid {
            section: "baseline".into(),
            key: "horizon_days".into(),
            reason: "horizon_days must be at least 1".into(),
        })?;

    Ok(EngineConfig {
        baseline_start,
        baseline_end,
        horizon_days,
        window: build_sample_window(adapter)?,
        threshold: adapter.get_double("grading", "threshold", DEFAULT_THRESHOLD_PCT),
    })
}

/// Opens the price source selected by `[data] source`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, BillpulseError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| BillpulseError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        other => Err(BillpulseError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unsupported source {other:?}"),
        }),
    }
}

fn run_analyze(
    config_path: &Path,
    events_override: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    baselines_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Resolve ports
    let events_path = match events_override
        .cloned()
        .or_else(|| adapter.get_string("events", "path").map(PathBuf::from))
    {
        Some(p) => p,
        None => {
            let err = BillpulseError::ConfigMissing {
                section: "events".into(),
                key: "path".into(),
            };
            eprintln!("error: {err} (or pass --events)");
            return (&err).into();
        }
    };
    let event_port = JsonEventAdapter::new(events_path);

    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report_port = JsonReportAdapter::new(adapter.get_bool("report", "include_failures", false));
    let output = output_path
        .cloned()
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("anomaly_results.json"));
    let benchmark = adapter
        .get_string("benchmark", "ticker")
        .unwrap_or_else(|| "SPY".to_string());

    run_analysis_pipeline(
        data_port.as_ref(),
        &event_port,
        &report_port,
        &engine_config,
        &output,
        baselines_path.map(PathBuf::as_path),
        Some(&benchmark),
    )
}

/// Stages 3-6: load events, grade them, write reports, print the summary.
pub fn run_analysis_pipeline(
    data_port: &dyn DataPort,
    event_port: &dyn EventPort,
    report_port: &dyn ReportPort,
    config: &EngineConfig,
    output_path: &Path,
    baselines_path: Option<&Path>,
    benchmark_ticker: Option<&str>,
) -> ExitCode {
    // Stage 3: Load events
    let records = match event_port.load_events() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if records.is_empty() {
        eprintln!("error: no events to analyze");
        return ExitCode::from(4);
    }

    // Stage 4: Run the engine
    let report = engine::run_analysis(data_port, &records, config);

    // Stage 5: Write hand-off records
    if let Err(e) = report_port.write_results(&report, output_path) {
        eprintln!("error: failed to write results: {e}");
        return (&e).into();
    }
    eprintln!("Results written to: {}", output_path.display());
    if let Some(path) = baselines_path {
        if let Err(e) = report_port.write_baselines(&report.baselines, path) {
            eprintln!("error: failed to write baselines: {e}");
            return (&e).into();
        }
        eprintln!("Baselines written to: {}", path.display());
    }

    // Stage 6: Console summary
    let benchmark_move = benchmark_ticker.and_then(|t| benchmark_change(data_port, t, &report));
    print_summary(&report, benchmark_ticker.zip(benchmark_move));

    if report.results.is_empty() {
        eprintln!("error: no events could be graded");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

/// Benchmark move from the first event date to 30 days after the last one.
fn benchmark_change(data_port: &dyn DataPort, ticker: &str, report: &AnalysisReport) -> Option<f64> {
    let start = report.results.iter().map(|r| r.date).min()?;
    let end = report.results.iter().map(|r| r.date).max()? + Duration::days(30);
    match data_port.fetch_series(ticker, start, end) {
        Ok(series) => {
            let change = series.total_change_pct();
            if change.is_none() {
                warn!(ticker, "benchmark series empty; skipping comparison");
            }
            change
        }
        Err(e) => {
            warn!(ticker, error = %e, "benchmark unavailable; skipping comparison");
            None
        }
    }
}

fn print_summary(report: &AnalysisReport, benchmark: Option<(&str, f64)>) {
    let summary = Summary::compute(&report.results);

    eprintln!("\n=== Summary ===");
    eprintln!("Events:           {}", report.total());
    eprintln!("Graded:           {}", report.processed());
    eprintln!("Skipped:          {}", report.skipped());
    for (kind, count) in report.failure_counts() {
        eprintln!("  {:?}: {}", kind, count);
    }

    if summary.total > 0 {
        eprintln!("\n=== Impact Classification ===");
        for severity in Severity::ALL {
            eprintln!(
                "  {:<17} {} ({:.1}%)",
                severity.as_str(),
                summary.count(severity),
                summary.share(severity) * 100.0
            );
        }

        eprintln!("\n=== Prediction Accuracy ===");
        eprintln!("  correct:   {}", summary.correct);
        eprintln!("  incorrect: {}", summary.incorrect);
        eprintln!("  accuracy:  {:.1}%", summary.accuracy() * 100.0);

        eprintln!("\n=== Anomalies by Sector ===");
        for (sector, counts) in &summary.sector_severity {
            let parts: Vec<String> = counts
                .iter()
                .map(|(severity, n)| format!("{}={}", severity, n))
                .collect();
            eprintln!("  {}: {}", sector, parts.join(", "));
        }
    }

    if let Some((ticker, change)) = benchmark {
        let rows = compare_to_benchmark(&report.results, change);
        if !rows.is_empty() {
            eprintln!("\n=== Sector vs {} ({:+.2}%) ===", ticker, change);
            for row in rows {
                eprintln!(
                    "  {:<12} {:<8} n={:<4} avg {:+.2}%  vs {} {:+.2}%",
                    row.sector.name(),
                    row.label.as_str(),
                    row.count,
                    row.avg_pct_change,
                    ticker,
                    row.vs_benchmark_diff
                );
            }
        }
    }
}

fn run_baseline(config_path: &Path, sector: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let sectors: BTreeSet<Sector> = match sector {
        Some(name) => match name.parse::<Sector>() {
            Ok(s) => BTreeSet::from([s]),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
        None => Sector::ALL.into_iter().collect(),
    };

    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_baselines(
        data_port.as_ref(),
        &sectors,
        engine_config.baseline_start,
        engine_config.baseline_end,
        engine_config.horizon_days,
    )
}

pub fn print_baselines(
    data_port: &dyn DataPort,
    sectors: &BTreeSet<Sector>,
    start: NaiveDate,
    end: NaiveDate,
    horizon_days: usize,
) -> ExitCode {
    eprintln!(
        "Baselines: {}-day changes, {} to {}",
        horizon_days, start, end
    );
    let table = engine::compute_baselines(data_port, sectors, start, end, horizon_days);

    println!("sector,ticker,mean_change,std_change,sample_size");
    for (sector, stats) in table.iter() {
        println!(
            "{},{},{:.4},{:.4},{}",
            sector, stats.ticker, stats.mean_change, stats.std_change, stats.sample_size
        );
    }
    for (sector, err) in table.failures() {
        eprintln!("{} ({}): {}", sector, sector.ticker(), err);
    }

    if table.is_empty() {
        ExitCode::from(5)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_sectors() -> ExitCode {
    for sector in Sector::ALL {
        println!("{:<12} {}", sector.name(), sector.ticker());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match validate_analysis_config(&adapter)
        .and_then(|()| build_engine_config(&adapter))
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "\nBaseline: {} to {}, {}-day horizon",
        config.baseline_start, config.baseline_end, config.horizon_days
    );
    match config.window.start {
        StartPoint::Before { window_days } => {
            eprintln!("Start price: last trading day within {window_days} days before the event")
        }
        StartPoint::OnDate { window_days } => {
            eprintln!("Start price: first trading day within {window_days} days from the event")
        }
    }
    eprintln!(
        "End price: first trading day within {} days of event + {} days",
        config.window.after_window_days, config.window.after_horizon_days
    );
    eprintln!("Grading threshold: {:.2}%", config.threshold);
    if let Some(path) = adapter.get_string("events", "path") {
        eprintln!("Events: {}", path);
    }
    if adapter.get_bool("report", "include_failures", false) {
        let output = adapter
            .get_string("report", "output")
            .unwrap_or_else(|| "anomaly_results.json".to_string());
        eprintln!("Skipped events: {}", skipped_path(Path::new(&output)).display());
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_import_prices(config_path: &Path, ticker: &str, csv_path: &Path) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_adapter::read_price_csv;
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let store = match SqliteAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let series = match read_price_csv(csv_path, ticker, None) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        match store.import_series(&series) {
            Ok(rows) => {
                eprintln!("Imported {} rows for {}", rows, series.ticker());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config_path, ticker, csv_path);
        eprintln!("error: sqlite feature is required for import-prices");
        ExitCode::from(1)
    }
}
