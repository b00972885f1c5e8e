//! Daily price bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
}

impl PriceBar {
    /// A close-only bar, the shape most price feeds hand us.
    pub fn new(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        PriceBar {
            symbol: symbol.into(),
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }

    /// Finite and strictly positive.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// high >= max(open, close), low <= min(open, close), high >= low.
    ///
    /// Bars without a full open/high/low triple are considered consistent.
    pub fn has_consistent_ohlc(&self) -> bool {
        match (self.open, self.high, self.low) {
            (Some(open), Some(high), Some(low)) => {
                high >= open.max(self.close) && low <= open.min(self.close) && high >= low
            }
            _ => true,
        }
    }
}
