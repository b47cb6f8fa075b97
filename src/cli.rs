//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::typst_report::labels::{Language, ReportLabels};
use crate::adapters::typst_report::tables::{fmt_fraction, fmt_pct, fmt_ratio};
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult, SeriesKind};
use crate::domain::config_validation::{
    parse_date, validate_analysis_config, validate_backtest_config, validate_report_config,
};
use crate::domain::error::MeanrevError;
use crate::domain::metrics::{PerformanceReport, DEFAULT_RISK_FREE_RATE};
use crate::domain::nav::nav_from_prices;
use crate::domain::probability::{
    AnalysisConfig, AnalysisResult, HoldingOutcome, DEFAULT_HOLDING_PERIOD,
    DEFAULT_HORIZON_MONTHS, DEFAULT_TARGET_RETURN,
};
use crate::domain::signal::DEFAULT_MA_WINDOW;
use crate::domain::universe::{load_benchmark, load_universe, SkippedCode, Universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportInput, ReportPort};

pub const DEFAULT_CSV_DIR: &str = "data";
pub const DEFAULT_REPORT_PATH: &str = "report.typ";

#[derive(Parser, Debug)]
#[command(name = "meanrev", about = "Mean-reversion backtester for cap-weighted equity baskets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Backtest a single code instead of the configured universe
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for the configured code(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Target probability and win rate for one instrument's price history
    Probability {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        /// Target return as a fraction (0.2 = 20%)
        #[arg(long)]
        target: Option<f64>,
        /// Horizon in calendar months
        #[arg(long)]
        months: Option<u32>,
        /// Holding period in trading days
        #[arg(long)]
        holding: Option<usize>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            code,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_backtest_command(&config, output.as_deref(), code.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
        Command::Probability {
            config,
            code,
            target,
            months,
            holding,
        } => run_probability(&config, &code, target, months, holding),
    }
}

fn fail(err: &MeanrevError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MeanrevError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, MeanrevError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let ma_window = adapter.get_int("backtest", "ma_window", DEFAULT_MA_WINDOW as i64);
    if ma_window < 1 {
        return Err(MeanrevError::invalid(
            "backtest",
            "ma_window",
            "ma_window must be at least 1",
        ));
    }

    Ok(BacktestConfig {
        start_date,
        end_date,
        ma_window: ma_window as usize,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
    })
}

pub fn build_analysis_config(adapter: &dyn ConfigPort) -> Result<AnalysisConfig, MeanrevError> {
    let horizon_months =
        adapter.get_int("analysis", "horizon_months", DEFAULT_HORIZON_MONTHS as i64);
    let horizon_months = u32::try_from(horizon_months)
        .ok()
        .filter(|&m| m >= 1)
        .ok_or_else(|| {
            MeanrevError::invalid(
                "analysis",
                "horizon_months",
                format!("horizon_months out of range: {}", horizon_months),
            )
        })?;

    let holding_period =
        adapter.get_int("analysis", "holding_period", DEFAULT_HOLDING_PERIOD as i64);
    let holding_period = usize::try_from(holding_period)
        .ok()
        .filter(|&p| p >= 1)
        .ok_or_else(|| {
            MeanrevError::invalid(
                "analysis",
                "holding_period",
                format!("holding_period out of range: {}", holding_period),
            )
        })?;

    Ok(AnalysisConfig {
        target_return: adapter.get_double("analysis", "target_return", DEFAULT_TARGET_RETURN),
        horizon_months,
        holding_period,
    })
}

pub fn build_report_labels(adapter: &dyn ConfigPort) -> ReportLabels {
    ReportLabels::new(
        Language::parse(adapter.get_string("report", "language").as_deref()),
        adapter.get_section("labels"),
    )
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, MeanrevError> {
    let source = adapter
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let dir = adapter
                .get_string("data", "csv_dir")
                .unwrap_or_else(|| DEFAULT_CSV_DIR.to_string());
            info!(dir = %dir, "using CSV data source");
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        "tushare" => build_tushare_port(adapter),
        other => Err(MeanrevError::invalid(
            "data",
            "source",
            format!("unknown data source '{}'", other),
        )),
    }
}

#[cfg(feature = "tushare")]
fn build_tushare_port(adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, MeanrevError> {
    use crate::adapters::tushare_adapter::TushareAdapter;

    let token = adapter
        .get_string("data", "tushare_token")
        .ok_or_else(|| MeanrevError::missing("data", "tushare_token"))?;
    info!("using Tushare data source");
    Ok(Box::new(TushareAdapter::new(
        token,
        adapter.get_string("data", "tushare_url"),
    )?))
}

#[cfg(not(feature = "tushare"))]
fn build_tushare_port(_adapter: &dyn ConfigPort) -> Result<Box<dyn DataPort>, MeanrevError> {
    Err(MeanrevError::invalid(
        "data",
        "source",
        "tushare support requires the `tushare` feature",
    ))
}

pub fn resolve_codes(code_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(c) = code_override {
        return vec![c.trim().to_uppercase()];
    }

    if let Some(codes_str) = config.get_string("backtest", "codes") {
        return codes_str
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(code) = config.get_string("backtest", "code") {
        let code = code.trim().to_uppercase();
        if !code.is_empty() {
            return vec![code];
        }
    }

    vec![]
}

/// Benchmark `(code, exchange)` if one is configured.
pub fn resolve_benchmark(config: &dyn ConfigPort) -> Option<(String, String)> {
    let code = config
        .get_string("backtest", "benchmark")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())?;
    let exchange = config
        .get_string("backtest", "benchmark_exchange")
        .or_else(|| config.get_string("backtest", "exchange"))
        .unwrap_or_default();
    Some((code, exchange))
}

fn resolve_universe(code_override: Option<&str>, config: &dyn ConfigPort) -> Result<Universe, MeanrevError> {
    let codes = resolve_codes(code_override, config);
    if codes.is_empty() {
        return Err(MeanrevError::missing("backtest", "codes"));
    }
    let exchange = config
        .get_string("backtest", "exchange")
        .ok_or_else(|| MeanrevError::missing("backtest", "exchange"))?;
    Ok(Universe { codes, exchange })
}

/// Everything one backtest run produces.
pub struct PipelineOutput {
    pub result: BacktestResult,
    pub performance: PerformanceReport,
    pub analysis: AnalysisResult,
    pub skipped: Vec<SkippedCode>,
}

impl PipelineOutput {
    pub fn report_input(&self, ma_window: usize) -> ReportInput<'_> {
        ReportInput {
            result: &self.result,
            performance: &self.performance,
            analysis: &self.analysis,
            skipped: &self.skipped,
            ma_window,
        }
    }
}

/// Load data, run the backtest and evaluate every NAV series.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    analysis_config: &AnalysisConfig,
    universe: &Universe,
    benchmark: Option<(&str, &str)>,
) -> Result<PipelineOutput, MeanrevError> {
    let loaded = load_universe(data_port, universe, bt_config.start_date, bt_config.end_date)?;

    let benchmark_bars = benchmark.and_then(|(code, exchange)| {
        load_benchmark(data_port, code, exchange, bt_config.start_date, bt_config.end_date)
    });

    info!(
        instruments = loaded.series.len(),
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "running backtest"
    );

    let result = run_backtest(&loaded.series, benchmark_bars.as_deref(), bt_config);
    let performance = PerformanceReport::compute(&result, bt_config.risk_free_rate);
    let analysis = AnalysisResult::compute(&result, analysis_config);

    Ok(PipelineOutput {
        result,
        performance,
        analysis,
        skipped: loaded.skipped,
    })
}

pub fn print_summary(output: &PipelineOutput) {
    let header = SeriesKind::ALL
        .iter()
        .map(|k| format!("{:>14}", k.to_string()))
        .collect::<String>();

    eprintln!("\n=== Performance ===");
    eprintln!("{:<20}{}", "", header);

    let rows: [(&str, fn(&PerformanceReport, SeriesKind) -> String); 6] = [
        ("Total Return", |p, k| fmt_pct(p.get(k).total_return)),
        ("Annualized", |p, k| fmt_pct(p.get(k).annualized_return)),
        ("Max Drawdown", |p, k| fmt_pct(p.get(k).max_drawdown)),
        ("Sharpe Ratio", |p, k| fmt_ratio(p.get(k).sharpe_ratio)),
        ("Calmar Ratio", |p, k| fmt_ratio(p.get(k).calmar_ratio)),
        ("Trading Days", |p, k| p.get(k).trading_days.to_string()),
    ];
    for (label, cell) in rows {
        let cells = SeriesKind::ALL
            .iter()
            .map(|&k| format!("{:>14}", cell(&output.performance, k)))
            .collect::<String>();
        eprintln!("{:<20}{}", label, cells);
    }

    let config = &output.analysis.config;
    eprintln!("\n=== Holding Outcomes ===");
    eprintln!("{:<20}{}", "", header);
    let target_label = format!(
        "P(>= {}, {}m)",
        fmt_fraction(config.target_return),
        config.horizon_months
    );
    let win_label = format!("Win rate ({}d)", config.holding_period);
    let rows: [(String, fn(&HoldingOutcome) -> f64); 2] = [
        (target_label, |o| o.target_probability),
        (win_label, |o| o.win_rate),
    ];
    for (label, pick) in rows {
        let cells = SeriesKind::ALL
            .iter()
            .map(|&k| format!("{:>14}", fmt_fraction(pick(output.analysis.get(k)))))
            .collect::<String>();
        eprintln!("{:<20}{}", label, cells);
    }

    if !output.skipped.is_empty() {
        eprintln!("\n=== Skipped ===");
        for s in &output.skipped {
            eprintln!("  {}: {}", s.code, s.reason);
        }
    }
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), MeanrevError> {
    validate_backtest_config(adapter)?;
    validate_analysis_config(adapter)?;
    validate_report_config(adapter)
}

pub fn run_backtest_command(
    config_path: &Path,
    output_path: Option<&Path>,
    code_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(&e);
    }

    // Stage 2: Build run parameters
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let analysis_config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let universe = match resolve_universe(code_override, &adapter) {
        Ok(u) => u,
        Err(e) => return fail(&e),
    };
    let benchmark = resolve_benchmark(&adapter);

    // Stage 3: Data source
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Running backtest: {} codes on {}, {} to {}",
        universe.count(),
        universe.exchange,
        bt_config.start_date,
        bt_config.end_date
    );

    // Stage 4: Pipeline
    let output = match run_backtest_pipeline(
        data_port.as_ref(),
        &bt_config,
        &analysis_config,
        &universe,
        benchmark.as_ref().map(|(c, e)| (c.as_str(), e.as_str())),
    ) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    // Stage 5: Console summary
    print_summary(&output);

    // Stage 6: Report
    let report_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));
    let report = TypstReportAdapter::new(
        adapter.get_string("report", "template_path").map(PathBuf::from),
        build_report_labels(&adapter),
    );
    match report.write(&output.report_input(bt_config.ma_window), &report_path) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", report_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(&e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let analysis_config = match build_analysis_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let universe = match resolve_universe(code_override, &adapter) {
        Ok(u) => u,
        Err(e) => return fail(&e),
    };

    eprintln!("\nBacktest:");
    eprintln!("  period:    {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  ma_window: {}", bt_config.ma_window);
    eprintln!("  risk_free: {}", bt_config.risk_free_rate);

    eprintln!("\nUniverse:");
    eprintln!("  exchange: {}", universe.exchange);
    eprintln!("  codes:    {}", universe.codes.join(", "));
    match resolve_benchmark(&adapter) {
        Some((code, exchange)) => eprintln!("  benchmark: {}.{}", code, exchange),
        None => eprintln!("  benchmark: composite index"),
    }

    eprintln!("\nAnalysis:");
    eprintln!("  target_return:  {}", analysis_config.target_return);
    eprintln!("  horizon_months: {}", analysis_config.horizon_months);
    eprintln!("  holding_period: {}", analysis_config.holding_period);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return fail(&e);
    }

    eprintln!("  codes: {}", resolve_codes(None, &adapter).join(", "));

    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

pub fn run_info(config_path: &Path, code: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let universe = match resolve_universe(code, &config) {
        Ok(u) => u,
        Err(e) => return fail(&e),
    };
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    for c in &universe.codes {
        match data_port.get_data_range(c, &universe.exchange) {
            Ok(Some((min_date, max_date, count))) => {
                println!(
                    "{}.{}: {} bars, {} to {}",
                    c, universe.exchange, count, min_date, max_date
                );
            }
            Ok(None) => {
                eprintln!("{}.{}: no data found", c, universe.exchange);
            }
            Err(e) => {
                eprintln!("error querying {}.{}: {}", c, universe.exchange, e);
            }
        }
    }
    ExitCode::SUCCESS
}

pub fn run_probability(
    config_path: &Path,
    code: &str,
    target: Option<f64>,
    months: Option<u32>,
    holding: Option<usize>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        return fail(&e);
    }

    let bt_config = match build_backtest_config(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let defaults = match build_analysis_config(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let analysis_config = AnalysisConfig {
        target_return: target.unwrap_or(defaults.target_return),
        horizon_months: months.unwrap_or(defaults.horizon_months),
        holding_period: holding.unwrap_or(defaults.holding_period).max(1),
    };

    let exchange = config.get_string("backtest", "exchange").unwrap_or_default();
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let code = code.trim().to_uppercase();
    match probability_for_code(
        data_port.as_ref(),
        &code,
        &exchange,
        &bt_config,
        &analysis_config,
    ) {
        Ok(outcome) => {
            println!(
                "{}.{}: P(return >= {} within {} months) = {}",
                code,
                exchange,
                fmt_fraction(analysis_config.target_return),
                analysis_config.horizon_months,
                fmt_fraction(outcome.target_probability)
            );
            println!(
                "{}.{}: win rate over {} trading days = {}",
                code,
                exchange,
                analysis_config.holding_period,
                fmt_fraction(outcome.win_rate)
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Holding outcomes of a single instrument's close, normalized to start at 1.0.
pub fn probability_for_code(
    data_port: &dyn DataPort,
    code: &str,
    exchange: &str,
    bt_config: &BacktestConfig,
    analysis_config: &AnalysisConfig,
) -> Result<HoldingOutcome, MeanrevError> {
    let bars = data_port.fetch_instrument(code, exchange, bt_config.start_date, bt_config.end_date)?;
    let prices: Vec<_> = bars
        .iter()
        .filter(|b| b.close.is_finite() && b.close > 0.0)
        .map(|b| (b.date, b.close))
        .collect();
    if prices.is_empty() {
        return Err(MeanrevError::NoData {
            code: code.to_string(),
        });
    }

    let nav = nav_from_prices(&prices);
    Ok(HoldingOutcome::compute(&nav, analysis_config))
}
