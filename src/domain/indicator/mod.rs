//! Technical indicator implementations.
//!
//! Indicators operate on plain close-price slices and return one value per
//! input point, `None` where the value is undefined because there is not yet
//! enough history:
//! - [`rsi::calculate_rsi`]: RSI with EMA-smoothed gains and losses
//! - [`macd::calculate_macd`]: MACD line, signal line and histogram
//! - [`signal`]: discrete buy/sell/hold derivation and the combiner
//! - [`frame`]: per-bar [`frame::IndicatorFrame`] assembly
//! - [`summary`]: per-symbol statistics over a frame stream

pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod signal;
pub mod summary;

pub use frame::{compute_frames, IndicatorFrame, IndicatorParams};
pub use macd::{calculate_macd, MacdParams, MacdSeries};
pub use rsi::calculate_rsi;
pub use signal::{combine, Signal};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Column key used in exported frames: `rsi_6`, `macd`.
    pub fn key(&self) -> String {
        match self {
            IndicatorType::Rsi(period) => format!("rsi_{}", period),
            IndicatorType::Macd { .. } => "macd".to_string(),
        }
    }

    /// Minimum number of points before any value can be defined.
    pub fn min_points(&self) -> usize {
        match self {
            IndicatorType::Rsi(period) => period + 1,
            IndicatorType::Macd { slow, signal, .. } => slow + signal,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
