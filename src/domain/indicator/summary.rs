//! Per-symbol statistics over a stream of indicator frames.

use crate::domain::indicator::frame::{Column, IndicatorFrame};
use crate::domain::indicator::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesStats {
    pub key: String,
    pub data_points: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub current: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalCounts {
    pub key: String,
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorSummary {
    pub symbol: String,
    pub total_points: usize,
    pub values: Vec<SeriesStats>,
    pub signals: Vec<SignalCounts>,
}

impl IndicatorSummary {
    pub fn stats(&self, key: &str) -> Option<&SeriesStats> {
        self.values.iter().find(|s| s.key == key)
    }

    pub fn counts(&self, key: &str) -> Option<&SignalCounts> {
        self.signals.iter().find(|s| s.key == key)
    }
}

/// Frames are assumed to belong to one symbol and share one column layout.
pub fn summarize(symbol: &str, frames: &[IndicatorFrame]) -> IndicatorSummary {
    let mut values: Vec<SeriesStats> = Vec::new();
    let mut signals: Vec<SignalCounts> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();

    for frame in frames {
        let mut v = 0;
        let mut s = 0;
        for (key, column) in frame.columns() {
            match column {
                Column::Value(value) => {
                    if values.len() == v {
                        values.push(SeriesStats {
                            key,
                            data_points: 0,
                            min: None,
                            max: None,
                            mean: None,
                            current: None,
                        });
                        sums.push(0.0);
                    }
                    if let Some(x) = value {
                        let stats = &mut values[v];
                        stats.data_points += 1;
                        stats.min = Some(stats.min.map_or(x, |m| m.min(x)));
                        stats.max = Some(stats.max.map_or(x, |m| m.max(x)));
                        stats.current = Some(x);
                        sums[v] += x;
                    }
                    v += 1;
                }
                Column::Signal(signal) => {
                    if signals.len() == s {
                        signals.push(SignalCounts {
                            key,
                            buy: 0,
                            sell: 0,
                            hold: 0,
                        });
                    }
                    let counts = &mut signals[s];
                    match signal {
                        Some(Signal::Buy) => counts.buy += 1,
                        Some(Signal::Sell) => counts.sell += 1,
                        Some(Signal::Hold) => counts.hold += 1,
                        None => {}
                    }
                    s += 1;
                }
            }
        }
    }

    for (stats, sum) in values.iter_mut().zip(&sums) {
        if stats.data_points > 0 {
            stats.mean = Some(sum / stats.data_points as f64);
        }
    }

    IndicatorSummary {
        symbol: symbol.to_string(),
        total_points: frames.len(),
        values,
        signals,
    }
}
