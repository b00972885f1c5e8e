//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of the raw MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Both EMAs are seeded with the first price and the signal EMA runs over the
//! full raw line, including the bars later reported as undefined. Warmup:
//! the line is `None` for the first slow-1 bars, signal and histogram for the
//! first slow+signal-2 bars. Fewer than slow+signal prices yield all `None`.

use tracing::debug;

use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::ema::ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    fn undefined(len: usize) -> Self {
        MacdSeries {
            line: vec![None; len],
            signal: vec![None; len],
            histogram: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

pub fn calculate_macd(prices: &[f64], params: MacdParams) -> MacdSeries {
    let MacdParams { fast, slow, signal } = params;

    if fast == 0 || slow == 0 || signal == 0 || prices.len() < slow + signal {
        debug!(
            indicator = %params.indicator_type(),
            points = prices.len(),
            "insufficient data points for MACD"
        );
        return MacdSeries::undefined(prices.len());
    }

    let ema_fast = ema(prices, fast);
    let ema_slow = ema(prices, slow);
    let raw_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let raw_signal = ema(&raw_line, signal);

    let line_warmup = slow - 1;
    let signal_warmup = slow + signal - 2;

    let mut series = MacdSeries::undefined(prices.len());
    for i in 0..prices.len() {
        if i >= line_warmup {
            series.line[i] = Some(raw_line[i]);
        }
        if i >= signal_warmup {
            series.signal[i] = Some(raw_signal[i]);
            series.histogram[i] = Some(raw_line[i] - raw_signal[i]);
        }
    }

    series
}
