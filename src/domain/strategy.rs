//! Strategy configuration.
//!
//! Two variants share the same signal and sizing rules and differ only in how
//! a symbol is bootstrapped:
//! - `single-period`: starts all cash, trades on one RSI period.
//! - `any-period`: seeds a position on the first bar, then trades on the
//!   combined signal of several RSI periods.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::IndicatorParams;
use crate::domain::indicator::macd::MacdParams;
use crate::domain::indicator::signal::RsiThresholds;

pub const DEFAULT_BUY_PCT: f64 = 0.2;
pub const DEFAULT_SELL_PCT: f64 = 0.01;
pub const DEFAULT_SEED_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyVariant {
    SinglePeriod,
    AnyPeriod,
}

impl StrategyVariant {
    pub fn default_periods(&self) -> Vec<usize> {
        match self {
            StrategyVariant::SinglePeriod => vec![6],
            StrategyVariant::AnyPeriod => vec![6, 12, 24],
        }
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyVariant::SinglePeriod => f.write_str("single-period"),
            StrategyVariant::AnyPeriod => f.write_str("any-period"),
        }
    }
}

impl FromStr for StrategyVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-period" | "single" => Ok(StrategyVariant::SinglePeriod),
            "any-period" | "any" | "seeded" => Ok(StrategyVariant::AnyPeriod),
            other => Err(format!(
                "unknown strategy variant '{}', expected single-period or any-period",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyConfig {
    pub name: String,
    pub variant: StrategyVariant,
    pub rsi_periods: Vec<usize>,
    pub thresholds: RsiThresholds,
    pub buy_pct: f64,
    pub sell_pct: f64,
    /// Fraction of starting capital invested on the first bar. Only used by
    /// the any-period variant.
    pub seed_fraction: f64,
    pub use_macd: bool,
    pub macd: MacdParams,
}

impl StrategyConfig {
    pub fn single_period(period: usize) -> Self {
        StrategyConfig {
            name: "RSI single period".to_string(),
            variant: StrategyVariant::SinglePeriod,
            rsi_periods: vec![period],
            thresholds: RsiThresholds::default(),
            buy_pct: DEFAULT_BUY_PCT,
            sell_pct: DEFAULT_SELL_PCT,
            seed_fraction: DEFAULT_SEED_FRACTION,
            use_macd: false,
            macd: MacdParams::default(),
        }
    }

    pub fn any_period() -> Self {
        StrategyConfig {
            name: "RSI any period".to_string(),
            variant: StrategyVariant::AnyPeriod,
            rsi_periods: StrategyVariant::AnyPeriod.default_periods(),
            ..StrategyConfig::single_period(6)
        }
    }

    /// Clamps finite sizing fractions to [0, 1].
    pub fn with_sizing(mut self, buy_pct: f64, sell_pct: f64) -> Self {
        self.buy_pct = clamp_fraction(buy_pct);
        self.sell_pct = clamp_fraction(sell_pct);
        self
    }

    pub fn is_seeded(&self) -> bool {
        self.variant == StrategyVariant::AnyPeriod
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_periods: self.rsi_periods.clone(),
            thresholds: self.thresholds,
            macd: self.macd,
        }
    }

    pub fn validate(&self) -> Result<(), SigtraderError> {
        if self.rsi_periods.is_empty() {
            return Err(SigtraderError::invalid(
                "strategy",
                "rsi_periods",
                "at least one RSI period is required",
            ));
        }
        if self.rsi_periods.contains(&0) {
            return Err(SigtraderError::invalid(
                "strategy",
                "rsi_periods",
                "RSI periods must be positive",
            ));
        }
        if self.thresholds.oversold >= self.thresholds.overbought {
            return Err(SigtraderError::invalid(
                "strategy",
                "oversold",
                format!(
                    "oversold ({}) must be below overbought ({})",
                    self.thresholds.oversold, self.thresholds.overbought
                ),
            ));
        }
        let MacdParams { fast, slow, signal } = self.macd;
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(SigtraderError::invalid(
                "strategy",
                "macd_fast",
                "MACD periods must be positive",
            ));
        }
        if fast >= slow {
            return Err(SigtraderError::invalid(
                "strategy",
                "macd_fast",
                format!("macd_fast ({}) must be below macd_slow ({})", fast, slow),
            ));
        }
        for (key, fraction) in [("buy_pct", self.buy_pct), ("sell_pct", self.sell_pct)] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(SigtraderError::invalid(
                    "strategy",
                    key,
                    format!("{} must be a fraction within [0, 1], got {}", key, fraction),
                ));
            }
        }
        if self.is_seeded() && !(self.seed_fraction > 0.0 && self.seed_fraction <= 1.0) {
            return Err(SigtraderError::invalid(
                "strategy",
                "seed_fraction",
                "seed_fraction must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Clamps a finite fraction into [0, 1]. NaN and infinities pass through so
/// that `validate` can reject them.
fn clamp_fraction(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { x }
}
