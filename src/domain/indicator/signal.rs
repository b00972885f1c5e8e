//! Discrete trading signals derived from indicator values.
//!
//! A `None` signal means the underlying indicator is undefined at that bar.
//! It is never folded into `Hold`.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::macd::MacdSeries;

pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Signal::Buy),
            "sell" => Ok(Signal::Sell),
            "hold" => Ok(Signal::Hold),
            other => Err(format!("unknown signal '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RsiThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        RsiThresholds {
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
        }
    }
}

impl RsiThresholds {
    /// value <= oversold is a buy, value >= overbought is a sell.
    pub fn classify(&self, value: Option<f64>) -> Option<Signal> {
        let value = value?;
        if value <= self.oversold {
            Some(Signal::Buy)
        } else if value >= self.overbought {
            Some(Signal::Sell)
        } else {
            Some(Signal::Hold)
        }
    }
}

pub fn rsi_signal(value: Option<f64>, oversold: f64, overbought: f64) -> Option<Signal> {
    RsiThresholds {
        oversold,
        overbought,
    }
    .classify(value)
}

pub fn rsi_signals(values: &[Option<f64>], thresholds: RsiThresholds) -> Vec<Option<Signal>> {
    values.iter().map(|&v| thresholds.classify(v)).collect()
}

/// Crossovers of the MACD line over its signal line.
///
/// `None` whenever the current bar's line, signal or histogram is undefined.
/// The first defined bar, or any bar whose predecessor is undefined, is a hold.
pub fn macd_signals(series: &MacdSeries) -> Vec<Option<Signal>> {
    let mut out = Vec::with_capacity(series.len());

    for i in 0..series.len() {
        let (Some(macd), Some(signal), Some(_)) =
            (series.line[i], series.signal[i], series.histogram[i])
        else {
            out.push(None);
            continue;
        };

        let prev = if i == 0 {
            None
        } else {
            series.line[i - 1].zip(series.signal[i - 1])
        };

        let decision = match prev {
            Some((prev_macd, prev_signal)) if prev_macd <= prev_signal && macd > signal => {
                Signal::Buy
            }
            Some((prev_macd, prev_signal)) if prev_macd >= prev_signal && macd < signal => {
                Signal::Sell
            }
            _ => Signal::Hold,
        };
        out.push(Some(decision));
    }

    out
}

/// Sell beats buy, buy beats hold. `None` only when every input is `None`.
pub fn combine<I>(signals: I) -> Option<Signal>
where
    I: IntoIterator<Item = Option<Signal>>,
{
    let mut defined = false;
    let mut buy = false;

    for signal in signals.into_iter().flatten() {
        defined = true;
        match signal {
            Signal::Sell => return Some(Signal::Sell),
            Signal::Buy => buy = true,
            Signal::Hold => {}
        }
    }

    match (defined, buy) {
        (false, _) => None,
        (true, true) => Some(Signal::Buy),
        (true, false) => Some(Signal::Hold),
    }
}
