//! CLI definition and dispatch.
//!
//! Every subcommand reads one INI file; a few flags override individual keys.
//! Handlers return `Result` and [`run`] turns the error into an exit code.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::csv_report_adapter::CsvReportSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{compute_indicators, run_backtest, BacktestConfig};
use crate::domain::config_validation::{load_backtest_config, load_strategy_config};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::IndicatorFrame;
use crate::domain::indicator::summary::{summarize, IndicatorSummary};
use crate::domain::strategy::StrategyConfig;
use crate::domain::sweep::{sweep, DEFAULT_GRID_POINTS};
use crate::domain::universe::{load_universe, parse_symbols, Universe};
use crate::domain::validation::Validator;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSource;
use crate::ports::report_port::ReportSink;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "RSI/MACD signal backtester")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Comma-separated symbols, replacing [backtest] symbols
    #[arg(long)]
    pub symbols: Option<String>,
    /// Long-format price CSV, replacing [data] price_csv
    #[arg(long)]
    pub prices: Option<PathBuf>,
    /// Output directory, replacing [data] output_dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators and signals for every symbol
    Indicators {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the trading simulation and write the ledger reports
    Backtest {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long)]
        buy_pct: Option<f64>,
        #[arg(long)]
        sell_pct: Option<f64>,
    },
    /// Grid-search buy/sell sizing per symbol
    Optimize {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
        points: usize,
    },
    /// Check a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators { run } => run_indicators(&run),
        Command::Backtest {
            run,
            buy_pct,
            sell_pct,
        } => run_backtest_command(&run, buy_pct, sell_pct),
        Command::Optimize { run, points } => run_optimize(&run, points),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    FileConfigAdapter::from_file(path)
}

/// Everything a run needs, with command-line overrides applied.
pub struct Session {
    pub backtest: BacktestConfig,
    pub strategy: StrategyConfig,
    pub prices: PathBuf,
    pub output: PathBuf,
}

impl Session {
    pub fn load(run: &RunArgs) -> Result<Self, SigtraderError> {
        info!(config = %run.config.display(), "loading config");
        let adapter = load_config(&run.config)?;
        let mut backtest = load_backtest_config(&adapter)?;
        let strategy = load_strategy_config(&adapter)?;

        if let Some(list) = &run.symbols {
            backtest.symbols = parse_symbols(list)
                .map_err(|e| SigtraderError::invalid("backtest", "symbols", e.to_string()))?;
        }

        let prices = match &run.prices {
            Some(p) => p.clone(),
            None => adapter
                .get_string("data", "price_csv")
                .map(PathBuf::from)
                .ok_or_else(|| SigtraderError::ConfigMissing {
                    section: "data".into(),
                    key: "price_csv".into(),
                })?,
        };
        let output = run
            .output
            .clone()
            .or_else(|| adapter.get_string("data", "output_dir").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Session {
            backtest,
            strategy,
            prices,
            output,
        })
    }

    /// Loads the configured symbols, or every symbol in the file when none
    /// are configured.
    pub fn universe(&self) -> Result<Universe, SigtraderError> {
        let source = CsvPriceSource::new(&self.prices);
        let symbols = if self.backtest.symbols.is_empty() {
            source.list_symbols()?
        } else {
            self.backtest.symbols.clone()
        };
        info!(symbols = symbols.len(), prices = %self.prices.display(), "loading prices");

        let universe = load_universe(
            &source,
            &symbols,
            self.backtest.start_date,
            self.backtest.end_date,
            &Validator::new(self.backtest.max_price_deviation),
        )?;

        info!(
            loaded = universe.count(),
            skipped = universe.skipped.len(),
            "universe ready"
        );
        let warmup = self.strategy.indicator_params().warmup();
        for series in universe.series.values() {
            if let Err(e) = series.require_history(warmup) {
                warn!(error = %e, "some indicators will stay undefined");
            }
        }
        Ok(universe)
    }

    pub fn sink(&self) -> CsvReportSink {
        CsvReportSink::new(&self.output)
    }
}

fn run_indicators(run: &RunArgs) -> Result<(), SigtraderError> {
    let session = Session::load(run)?;
    let universe = session.universe()?;
    let frames = compute_indicators(&universe.series, &session.strategy.indicator_params());

    let summaries: Vec<IndicatorSummary> = frames
        .iter()
        .map(|(symbol, f)| summarize(symbol, f))
        .collect();
    let flat: Vec<IndicatorFrame> = frames.into_values().flatten().collect();
    session.sink().write_indicators(&flat, &summaries)?;

    eprintln!("\n=== Indicator Summary ===");
    for summary in &summaries {
        eprintln!("  {}: {} bars", summary.symbol, summary.total_points);
        for counts in &summary.signals {
            eprintln!(
                "    {:<16} buy {:>4}  sell {:>4}  hold {:>4}",
                counts.key, counts.buy, counts.sell, counts.hold
            );
        }
    }
    eprintln!("\nReports written to: {}", session.output.display());
    Ok(())
}

fn run_backtest_command(
    run: &RunArgs,
    buy_pct: Option<f64>,
    sell_pct: Option<f64>,
) -> Result<(), SigtraderError> {
    let mut session = Session::load(run)?;
    if buy_pct.is_some() || sell_pct.is_some() {
        let buy = buy_pct.unwrap_or(session.strategy.buy_pct);
        let sell = sell_pct.unwrap_or(session.strategy.sell_pct);
        session.strategy = session.strategy.with_sizing(buy, sell);
        session.strategy.validate()?;
    }

    let universe = session.universe()?;
    let report = run_backtest(&universe.series, &session.strategy, &session.backtest)?;
    session.sink().write_backtest(&report)?;

    eprintln!("\n=== {} ({}) ===", session.strategy.name, session.strategy.variant);
    eprintln!(
        "Sizing:           buy {:.2}%  sell {:.2}%",
        session.strategy.buy_pct * 100.0,
        session.strategy.sell_pct * 100.0
    );
    eprintln!("Trades:           {}", report.ledger.events().len());
    eprintln!("Total P&L:        {:.2}", report.total_pnl());
    if let Some(last) = report.daily.last() {
        eprintln!("Total Capital:    {:.2}", last.total_capital);
    }

    if !report.summaries.is_empty() {
        eprintln!("\n=== Per-Symbol Summary ===");
        for s in &report.summaries {
            let sign = if s.total_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} buys, {} sells, {}{:.2}",
                s.symbol, s.total_buys, s.total_sells, sign, s.total_pnl
            );
        }
    }
    eprintln!("\nReports written to: {}", session.output.display());
    Ok(())
}

fn run_optimize(run: &RunArgs, points: usize) -> Result<(), SigtraderError> {
    if points == 0 {
        return Err(SigtraderError::invalid(
            "optimize",
            "points",
            "grid needs at least one point",
        ));
    }

    let session = Session::load(run)?;
    let universe = session.universe()?;
    let frames = compute_indicators(&universe.series, &session.strategy.indicator_params());
    let best = sweep(&frames, &session.strategy, &session.backtest, points)?;
    session.sink().write_sweep(&best)?;

    eprintln!("\n=== Best Sizing ({0}x{0} grid) ===", points);
    for r in &best {
        eprintln!(
            "  {}:  buy {:.4}  sell {:.4}  equity {:.2}",
            r.symbol, r.buy_pct, r.sell_pct, r.ending_equity
        );
    }
    eprintln!("\nReport written to: {}", session.output.display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let backtest = load_backtest_config(&adapter)?;
    let strategy = load_strategy_config(&adapter)?;

    eprintln!("\nStrategy:");
    eprintln!("  name:       {}", strategy.name);
    eprintln!("  variant:    {}", strategy.variant);
    let indicators: Vec<String> = strategy
        .indicator_params()
        .indicators()
        .iter()
        .map(|i| i.to_string())
        .collect();
    eprintln!("  indicators: {}", indicators.join(", "));
    eprintln!(
        "  thresholds: oversold {} / overbought {}",
        strategy.thresholds.oversold, strategy.thresholds.overbought
    );
    eprintln!(
        "  sizing:     buy {} / sell {}",
        strategy.buy_pct, strategy.sell_pct
    );

    eprintln!("\nBacktest:");
    if backtest.symbols.is_empty() {
        eprintln!("  symbols:    (all in price file)");
    } else {
        eprintln!("  symbols:    {}", backtest.symbols.join(", "));
    }
    eprintln!("  capital:    {}", backtest.initial_capital);
    eprintln!("  commission: {}", backtest.commission_rate);

    eprintln!("\nConfiguration is valid");
    Ok(())
}
