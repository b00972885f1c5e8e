//! Per-bar assembly of indicator values and their signals.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::indicator::macd::{calculate_macd, MacdParams};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::signal::{combine, macd_signals, rsi_signals, RsiThresholds, Signal};
use crate::domain::indicator::IndicatorType;
use crate::domain::price_bar::PriceBar;

pub const MACD_KEY: &str = "macd";
pub const MACD_SIGNAL_LINE_KEY: &str = "macd_signal_line";
pub const MACD_HISTOGRAM_KEY: &str = "macd_histogram";
pub const MACD_SIGNAL_KEY: &str = "macd_signal";

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_periods: Vec<usize>,
    pub thresholds: RsiThresholds,
    pub macd: MacdParams,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_periods: vec![6, 12, 24],
            thresholds: RsiThresholds::default(),
            macd: MacdParams::default(),
        }
    }
}

impl IndicatorParams {
    /// Every indicator these parameters produce, RSI first.
    pub fn indicators(&self) -> Vec<IndicatorType> {
        let mut types: Vec<IndicatorType> = self
            .rsi_periods
            .iter()
            .map(|&p| IndicatorType::Rsi(p))
            .collect();
        types.push(self.macd.indicator_type());
        types
    }

    /// Bars needed before every indicator has a defined value.
    pub fn warmup(&self) -> usize {
        self.indicators()
            .iter()
            .map(IndicatorType::min_points)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RsiReading {
    pub period: usize,
    pub value: Option<f64>,
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacdReading {
    pub line: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
    pub signal: Option<Signal>,
}

/// One exported column: a numeric indicator value or a discrete signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column {
    Value(Option<f64>),
    Signal(Option<Signal>),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorFrame {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Vec<RsiReading>,
    pub macd: MacdReading,
}

impl IndicatorFrame {
    pub fn rsi(&self, period: usize) -> Option<&RsiReading> {
        self.rsi.iter().find(|r| r.period == period)
    }

    /// Combined decision over every RSI period, plus MACD when requested.
    pub fn combined_signal(&self, include_macd: bool) -> Option<Signal> {
        let rsi = self.rsi.iter().map(|r| r.signal);
        if include_macd {
            combine(rsi.chain(std::iter::once(self.macd.signal)))
        } else {
            combine(rsi)
        }
    }

    /// Keyed view for export: `rsi_6`, `rsi_6_signal`, ..., `macd`,
    /// `macd_signal_line`, `macd_histogram`, `macd_signal`.
    pub fn columns(&self) -> Vec<(String, Column)> {
        let mut cols = Vec::with_capacity(self.rsi.len() * 2 + 4);
        for reading in &self.rsi {
            let key = IndicatorType::Rsi(reading.period).key();
            let signal_key = format!("{}_signal", key);
            cols.push((key, Column::Value(reading.value)));
            cols.push((signal_key, Column::Signal(reading.signal)));
        }
        cols.push((MACD_KEY.to_string(), Column::Value(self.macd.line)));
        cols.push((
            MACD_SIGNAL_LINE_KEY.to_string(),
            Column::Value(self.macd.signal_line),
        ));
        cols.push((
            MACD_HISTOGRAM_KEY.to_string(),
            Column::Value(self.macd.histogram),
        ));
        cols.push((MACD_SIGNAL_KEY.to_string(), Column::Signal(self.macd.signal)));
        cols
    }
}

/// One frame per bar, in the order given. Bars are expected to be sanitized.
pub fn compute_frames(bars: &[PriceBar], params: &IndicatorParams) -> Vec<IndicatorFrame> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi_columns: Vec<(usize, Vec<Option<f64>>, Vec<Option<Signal>>)> = params
        .rsi_periods
        .iter()
        .map(|&period| {
            let values = calculate_rsi(&closes, period);
            let signals = rsi_signals(&values, params.thresholds);
            (period, values, signals)
        })
        .collect();

    let macd = calculate_macd(&closes, params.macd);
    let macd_sig = macd_signals(&macd);

    if let Some(first) = bars.first() {
        debug!(
            symbol = %first.symbol,
            bars = bars.len(),
            periods = ?params.rsi_periods,
            "computed indicator frames"
        );
    }

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorFrame {
            symbol: bar.symbol.clone(),
            date: bar.date,
            close: bar.close,
            rsi: rsi_columns
                .iter()
                .map(|(period, values, signals)| RsiReading {
                    period: *period,
                    value: values[i],
                    signal: signals[i],
                })
                .collect(),
            macd: MacdReading {
                line: macd.line[i],
                signal_line: macd.signal[i],
                histogram: macd.histogram[i],
                signal: macd_sig[i],
            },
        })
        .collect()
}
