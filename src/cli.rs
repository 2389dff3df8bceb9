//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::backtest::{run_strategy, BacktestConfig, BacktestResult, DEFAULT_INITIAL_CAPITAL};
use crate::domain::config_validation::{
    strategy_settings, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::QuantError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{StrategyKind, StrategySettings};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportContext, ReportPort};

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "quantbt", about = "Single-symbol strategy backtester")]
pub struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// First date, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        /// ma-crossover or rsi
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        /// Report path; .html for the full report, .csv for the trade log
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the bar count and date range for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub data_dir: Option<PathBuf>,
    pub symbol: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub strategy: Option<StrategyKind>,
    pub output: Option<PathBuf>,
}

/// Fully resolved parameters for one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_dir: PathBuf,
    pub output: Option<PathBuf>,
    pub backtest: BacktestConfig,
    pub strategy: StrategySettings,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub result: BacktestResult,
    pub metrics: Metrics,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
            start,
            end,
            strategy,
            output,
        } => {
            let overrides = RunOverrides {
                data_dir,
                symbol,
                start,
                end,
                strategy,
                output,
            };
            run_backtest(config.as_deref(), &overrides)
        }
        Command::Info {
            symbol,
            data_dir,
            config,
        } => run_info(&symbol, data_dir, config.as_deref()),
        Command::ListSymbols { data_dir, config } => run_list_symbols(data_dir, config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Stderr subscriber; `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "quantbt=debug" } else { "quantbt=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Without a path every lookup misses and defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, QuantError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn resolve_data_dir(data_dir_override: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    data_dir_override
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn missing(key: &str) -> QuantError {
    QuantError::ConfigMissing {
        section: "backtest".into(),
        key: key.into(),
    }
}

pub fn build_run_config(
    config: &dyn ConfigPort,
    overrides: &RunOverrides,
) -> Result<RunConfig, QuantError> {
    validate_backtest_config(config)?;

    let mut strategy = strategy_settings(config)?;
    if let Some(kind) = overrides.strategy {
        strategy.kind = kind;
    }
    strategy.validate()?;

    let symbol = overrides
        .symbol
        .clone()
        .or_else(|| config.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing("symbol"))?;

    let start_date = match overrides.start {
        Some(date) => date,
        None => config
            .get_date("backtest", "start_date")?
            .ok_or_else(|| missing("start_date"))?,
    };
    let end_date = match overrides.end {
        Some(date) => date,
        None => config
            .get_date("backtest", "end_date")?
            .ok_or_else(|| missing("end_date"))?,
    };
    if start_date > end_date {
        return Err(QuantError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: format!("start date {start_date} is after end date {end_date}"),
        });
    }

    let initial_capital = config
        .get_f64("backtest", "initial_capital")?
        .unwrap_or(DEFAULT_INITIAL_CAPITAL);

    let output = overrides
        .output
        .clone()
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    Ok(RunConfig {
        symbol,
        start_date,
        end_date,
        data_dir: resolve_data_dir(overrides.data_dir.clone(), config),
        output,
        backtest: BacktestConfig { initial_capital },
        strategy,
    })
}

/// Pick the report writer from the output file extension.
pub fn report_for_path(path: &Path) -> Result<Box<dyn ReportPort>, QuantError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => Ok(Box::new(HtmlReportAdapter::new())),
        Some("csv") => Ok(Box::new(CsvReportAdapter::new())),
        _ => Err(QuantError::ConfigInvalid {
            section: "report".into(),
            key: "output".into(),
            reason: format!(
                "unsupported report format for {} (expected .html or .csv)",
                path.display()
            ),
        }),
    }
}

fn run_backtest(config_path: Option<&Path>, overrides: &RunOverrides) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let run_config = build_run_config(&config, overrides)?;
    let data_port = CsvAdapter::new(run_config.data_dir.clone());
    run_backtest_pipeline(&data_port, &run_config).map(|_| ())
}

/// Fetch, simulate, summarize and (optionally) write the report.
///
/// The report writer is resolved before any data is read so that a bad
/// output path fails without side effects.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    run_config: &RunConfig,
) -> Result<PipelineOutput, QuantError> {
    let report = run_config
        .output
        .as_deref()
        .map(|path| report_for_path(path).map(|writer| (writer, path)))
        .transpose()?;

    info!(
        symbol = %run_config.symbol,
        start = %run_config.start_date,
        end = %run_config.end_date,
        "fetching price data"
    );
    let series =
        data_port.fetch_series(&run_config.symbol, run_config.start_date, run_config.end_date)?;
    if series.is_empty() {
        return Err(QuantError::NoData {
            symbol: run_config.symbol.clone(),
            start: run_config.start_date,
            end: run_config.end_date,
        });
    }

    let strategy = run_config.strategy.build();
    info!(strategy = strategy.name(), bars = series.len(), "running backtest");
    let result = run_strategy(&series, strategy.as_ref(), &run_config.backtest);
    let metrics = Metrics::compute(&result);

    print_summary(run_config, strategy.name(), series.len(), &result, &metrics);

    if let Some((writer, path)) = report {
        let indicators = strategy.indicator_labels();
        let context = ReportContext {
            symbol: &run_config.symbol,
            strategy_name: strategy.name(),
            indicators: &indicators,
            start_date: run_config.start_date,
            end_date: run_config.end_date,
        };
        let path_str = path.to_string_lossy();
        writer.write(&result, &metrics, &context, &path_str)?;
        eprintln!("\nReport written to: {}", path.display());
    }

    Ok(PipelineOutput { result, metrics })
}

fn print_summary(
    run_config: &RunConfig,
    strategy_name: &str,
    bars_loaded: usize,
    result: &BacktestResult,
    metrics: &Metrics,
) {
    eprintln!(
        "\n=== {} / {} ({} to {}) ===",
        run_config.symbol, strategy_name, run_config.start_date, run_config.end_date
    );
    if result.is_empty() {
        warn!(bars = bars_loaded, "no signal: history shorter than indicator warm-up");
        eprintln!(
            "No signal: {} bars loaded, not enough history for {}",
            bars_loaded, strategy_name
        );
        return;
    }

    eprintln!("Starting Capital: ${:.2}", result.initial_capital);
    eprintln!("Final Equity:     ${:.2}", metrics.final_equity);
    eprintln!("Net Profit:       ${:.2}", metrics.net_profit);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Round Trips:      {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);

    if !result.trades.is_empty() {
        eprintln!("\n=== Trade Log ===");
        for trade in &result.trades {
            eprintln!(
                "  {}  {:<8} {:>6} @ {:>10.2}  cash {:.2}",
                trade.date, trade.action, trade.quantity, trade.price, trade.cash_after
            );
        }
    }
}

fn run_info(
    symbol: &str,
    data_dir: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config));
    let symbol = symbol.trim().to_uppercase();

    match adapter.get_data_range(&symbol)? {
        Some((first, last, count)) => {
            println!("{}: {} bars, {} to {}", symbol, count, first, last);
        }
        None => eprintln!("{}: no data found", symbol),
    }
    Ok(())
}

fn run_list_symbols(data_dir: Option<PathBuf>, config_path: Option<&Path>) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    let adapter = CsvAdapter::new(resolve_data_dir(data_dir, &config));

    let symbols = adapter.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(Some(config_path))?;

    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;
    let settings = strategy_settings(&config)?;

    let show = |value: Option<String>| value.unwrap_or_else(|| "(not set)".to_string());
    eprintln!("\n[backtest]");
    eprintln!("  symbol:          {}", show(config.get_string("backtest", "symbol")));
    eprintln!("  start_date:      {}", show(config.get_string("backtest", "start_date")));
    eprintln!("  end_date:        {}", show(config.get_string("backtest", "end_date")));
    eprintln!(
        "  initial_capital: {:.2}",
        config
            .get_f64("backtest", "initial_capital")?
            .unwrap_or(DEFAULT_INITIAL_CAPITAL)
    );
    eprintln!("  strategy:        {}", settings.kind);
    eprintln!("\n[data]");
    eprintln!(
        "  dir:             {}",
        resolve_data_dir(None, &config).display()
    );
    eprintln!("\n[ma_crossover]");
    eprintln!("  fast: {}  slow: {}", settings.ma.fast, settings.ma.slow);
    eprintln!("\n[rsi]");
    eprintln!(
        "  period: {}  oversold: {}  overbought: {}",
        settings.rsi.period, settings.rsi.oversold, settings.rsi.overbought
    );
    if let Some(output) = config.get_string("report", "output") {
        report_for_path(Path::new(&output))?;
        eprintln!("\n[report]\n  output: {}", output);
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
