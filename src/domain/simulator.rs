//! Per-symbol trade simulation.
//!
//! A [`Simulator`] walks one symbol's indicator frames in date order and
//! turns the combined signal into commission-free [`Fill`]s:
//! - buy: invest `buy_pct` of current cash, skipped when that is zero
//! - sell: liquidate `sell_pct` of current shares, skipped when that is zero
//! - hold or undefined: nothing happens
//!
//! Seeded strategies emit an `init` fill on the first bar before anything else.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::domain::indicator::frame::IndicatorFrame;
use crate::domain::indicator::signal::Signal;
use crate::domain::position::Position;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Buy,
    Sell,
    Init,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Init => "init",
        }
    }

    /// Buys and seed trades both add to the position.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Action::Buy | Action::Init)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "init" => Ok(Action::Init),
            other => Err(format!("unknown trade action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: Action,
    pub price: f64,
    pub shares: f64,
    pub notional: f64,
    pub position_shares_after: f64,
    pub position_value_after: f64,
    pub cash_after: f64,
    pub equity_after: f64,
    /// Combined signal that triggered the fill; `None` for seed trades.
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone)]
pub struct Simulator<'a> {
    symbol: String,
    config: &'a StrategyConfig,
    initial_capital: f64,
    position: Position,
    started: bool,
}

impl<'a> Simulator<'a> {
    pub fn new(symbol: impl Into<String>, config: &'a StrategyConfig, initial_capital: f64) -> Self {
        Simulator {
            symbol: symbol.into(),
            config,
            initial_capital,
            position: Position::new(initial_capital),
            started: false,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Processes one bar, returning the fills it produced (zero, one, or two
    /// on a seeded first bar).
    pub fn step(&mut self, frame: &IndicatorFrame) -> Vec<Fill> {
        let mut fills = Vec::new();

        if !self.started {
            self.started = true;
            if self.config.is_seeded() {
                if let Some(fill) = self.seed(frame) {
                    fills.push(fill);
                }
            }
        }

        let decision = frame.combined_signal(self.config.use_macd);
        let fill = match decision {
            Some(Signal::Buy) => self.buy(frame),
            Some(Signal::Sell) => self.sell(frame),
            Some(Signal::Hold) | None => None,
        };
        fills.extend(fill);
        fills
    }

    pub fn run(mut self, frames: &[IndicatorFrame]) -> Vec<Fill> {
        let fills: Vec<Fill> = frames.iter().flat_map(|f| self.step(f)).collect();
        debug!(
            symbol = %self.symbol,
            fills = fills.len(),
            cash = self.position.cash,
            shares = self.position.shares,
            "simulation finished"
        );
        fills
    }

    fn seed(&mut self, frame: &IndicatorFrame) -> Option<Fill> {
        let notional = self.config.seed_fraction * self.initial_capital;
        if notional <= 0.0 || frame.close <= 0.0 {
            return None;
        }
        let shares = notional / frame.close;
        self.position.add_shares(shares, notional);
        Some(self.fill(frame, Action::Init, shares, notional, None))
    }

    fn buy(&mut self, frame: &IndicatorFrame) -> Option<Fill> {
        let cash = self.position.cash;
        let notional = (self.config.buy_pct * cash).min(cash);
        if notional <= 0.0 {
            return None;
        }
        let shares = notional / frame.close;
        self.position.add_shares(shares, notional);
        Some(self.fill(frame, Action::Buy, shares, notional, Some(Signal::Buy)))
    }

    fn sell(&mut self, frame: &IndicatorFrame) -> Option<Fill> {
        let requested = self.config.sell_pct * self.position.shares;
        if requested <= 0.0 {
            return None;
        }
        let sale = self.position.remove_shares(requested, frame.close, 0.0);
        Some(self.fill(
            frame,
            Action::Sell,
            sale.shares_sold,
            sale.gross_proceeds,
            Some(Signal::Sell),
        ))
    }

    fn fill(
        &self,
        frame: &IndicatorFrame,
        action: Action,
        shares: f64,
        notional: f64,
        signal: Option<Signal>,
    ) -> Fill {
        let position_value_after = self.position.market_value(frame.close);
        Fill {
            date: frame.date,
            symbol: self.symbol.clone(),
            action,
            price: frame.close,
            shares,
            notional,
            position_shares_after: self.position.shares,
            position_value_after,
            cash_after: self.position.cash,
            equity_after: self.position.cash + position_value_after,
            signal,
        }
    }
}

/// Simulates every symbol independently and merges the fills by
/// (date, symbol). A symbol's seed trade stays ahead of its same-day fills.
pub fn simulate_all(
    frames: &BTreeMap<String, Vec<IndicatorFrame>>,
    config: &StrategyConfig,
    initial_capital: f64,
) -> Vec<Fill> {
    let mut fills: Vec<Fill> = frames
        .iter()
        .flat_map(|(symbol, series)| {
            Simulator::new(symbol.as_str(), config, initial_capital).run(series)
        })
        .collect();

    fills.sort_by(|a, b| (a.date, &a.symbol).cmp(&(b.date, &b.symbol)));

    info!(
        strategy = %config.name,
        variant = %config.variant,
        symbols = frames.len(),
        fills = fills.len(),
        "simulation complete"
    );
    fills
}
