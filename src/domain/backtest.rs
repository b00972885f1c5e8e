//! Backtest pipeline.
//!
//! prices -> indicator frames -> fills -> ledger -> daily and weekly series.
//! Everything here is synchronous and deterministic; symbol iteration follows
//! `BTreeMap` order.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::aggregate::{daily_capital, weekly_returns, CapitalSample, WeeklyReturn};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::{compute_frames, IndicatorFrame, IndicatorParams};
use crate::domain::ledger::{
    SymbolSummary, TradeEvent, TradeLog, DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::simulator::{simulate_all, Fill};
use crate::domain::strategy::StrategyConfig;
use crate::domain::validation::{ValidatedSeries, DEFAULT_MAX_PRICE_DEVIATION};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Starting cash of every symbol; symbols never share capital.
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub max_price_deviation: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbols: Vec::new(),
            start_date: None,
            end_date: None,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_rate: DEFAULT_COMMISSION_RATE,
            max_price_deviation: DEFAULT_MAX_PRICE_DEVIATION,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if !(self.initial_capital > 0.0) {
            return Err(SigtraderError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !(self.commission_rate >= 0.0) {
            return Err(SigtraderError::invalid(
                "backtest",
                "commission_rate",
                "commission_rate must be non-negative",
            ));
        }
        if !(self.max_price_deviation > 0.0) {
            return Err(SigtraderError::invalid(
                "backtest",
                "max_price_deviation",
                "max_price_deviation must be positive",
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(SigtraderError::invalid(
                    "backtest",
                    "start_date",
                    "start_date must not be after end_date",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub strategy: StrategyConfig,
    pub frames: BTreeMap<String, Vec<IndicatorFrame>>,
    pub fills: Vec<Fill>,
    pub ledger: TradeLog,
    pub summaries: Vec<SymbolSummary>,
    pub daily: Vec<CapitalSample>,
    pub weekly: Vec<WeeklyReturn>,
}

impl BacktestReport {
    pub fn last_trades(&self) -> Vec<&TradeEvent> {
        self.ledger.last_trades()
    }

    pub fn total_pnl(&self) -> f64 {
        self.summaries.iter().map(|s| s.total_pnl).sum()
    }
}

pub fn compute_indicators(
    series: &BTreeMap<String, ValidatedSeries>,
    params: &IndicatorParams,
) -> BTreeMap<String, Vec<IndicatorFrame>> {
    series
        .iter()
        .map(|(symbol, s)| (symbol.clone(), compute_frames(&s.bars, params)))
        .collect()
}

/// Simulation onwards, for callers that already hold the frames.
pub fn run_on_frames(
    frames: BTreeMap<String, Vec<IndicatorFrame>>,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> BacktestReport {
    let fills = simulate_all(&frames, strategy, config.initial_capital);
    let ledger = TradeLog::replay(&fills, config.initial_capital, config.commission_rate);
    let summaries = ledger.summaries();
    let daily = daily_capital(&ledger);
    let weekly = weekly_returns(&ledger);

    BacktestReport {
        strategy: strategy.clone(),
        frames,
        fills,
        ledger,
        summaries,
        daily,
        weekly,
    }
}

pub fn run_backtest(
    series: &BTreeMap<String, ValidatedSeries>,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> Result<BacktestReport, SigtraderError> {
    strategy.validate()?;
    config.validate()?;

    info!(
        strategy = %strategy.name,
        variant = %strategy.variant,
        symbols = series.len(),
        buy_pct = strategy.buy_pct,
        sell_pct = strategy.sell_pct,
        "running backtest"
    );

    let frames = compute_indicators(series, &strategy.indicator_params());
    let report = run_on_frames(frames, strategy, config);

    info!(
        events = report.ledger.events().len(),
        days = report.daily.len(),
        total_pnl = report.total_pnl(),
        "backtest complete"
    );
    Ok(report)
}
