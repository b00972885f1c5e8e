//! Position-sizing grid search.
//!
//! Runs the simulation and ledger for every (buy_pct, sell_pct) pair of a
//! grid and keeps, per symbol, the pair with the highest ending equity
//! (initial capital + total P&L). Ties keep the earlier grid point. Indicator
//! frames do not depend on sizing and are computed once by the caller.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::backtest::{run_on_frames, BacktestConfig};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::IndicatorFrame;
use crate::domain::strategy::StrategyConfig;

pub const DEFAULT_GRID_POINTS: usize = 5;
pub const BUY_PCT_RANGE: (f64, f64) = (0.05, 1.0);
pub const SELL_PCT_RANGE: (f64, f64) = (0.01, 1.0);

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepResult {
    pub symbol: String,
    pub buy_pct: f64,
    pub sell_pct: f64,
    pub ending_equity: f64,
}

/// `num` evenly spaced values from `start` to `stop` inclusive, rounded to
/// four decimals. A single point is just `start`.
pub fn gridspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| round4(start + i as f64 * step))
                .collect()
        }
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub fn sweep(
    frames: &BTreeMap<String, Vec<IndicatorFrame>>,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    points: usize,
) -> Result<Vec<SweepResult>, SigtraderError> {
    strategy.validate()?;
    config.validate()?;

    let buy_grid = gridspace(BUY_PCT_RANGE.0, BUY_PCT_RANGE.1, points);
    let sell_grid = gridspace(SELL_PCT_RANGE.0, SELL_PCT_RANGE.1, points);
    let total = buy_grid.len() * sell_grid.len();
    let mut best: BTreeMap<String, SweepResult> = BTreeMap::new();
    let mut run = 0;

    for &buy_pct in &buy_grid {
        for &sell_pct in &sell_grid {
            run += 1;
            debug!(run, total, buy_pct, sell_pct, "sweep point");

            let sized = strategy.clone().with_sizing(buy_pct, sell_pct);
            let report = run_on_frames(frames.clone(), &sized, config);

            for summary in &report.summaries {
                let ending_equity = config.initial_capital + summary.total_pnl;
                let improves = best
                    .get(&summary.symbol)
                    .is_none_or(|b| ending_equity > b.ending_equity);
                if improves {
                    best.insert(
                        summary.symbol.clone(),
                        SweepResult {
                            symbol: summary.symbol.clone(),
                            buy_pct,
                            sell_pct,
                            ending_equity,
                        },
                    );
                }
            }
        }
    }

    info!(runs = total, symbols = best.len(), "sizing sweep complete");
    Ok(best.into_values().collect())
}
