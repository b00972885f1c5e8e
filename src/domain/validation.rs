//! Price series sanitation.
//!
//! Bars with a missing or non-positive close are excluded from indicator and
//! simulation input, duplicate dates keep the last bar seen, and the result is
//! sorted by date. Nothing here fails: every problem is recorded on the
//! returned [`ValidatedSeries`] and processing continues with what is left.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::error::SigtraderError;
use crate::domain::price_bar::PriceBar;

pub const DEFAULT_MAX_PRICE_DEVIATION: f64 = 0.5;
const MAX_SYMBOL_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    InvalidClose(f64),
    /// An earlier bar for the same date, replaced by a later one.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub date: NaiveDate,
    pub reason: RejectReason,
}

/// Problems that are logged but do not remove the bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    InconsistentOhlc { date: NaiveDate },
    LargeMove { date: NaiveDate, pct_change: f64 },
}

#[derive(Debug, Clone)]
pub struct ValidatedSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub rejections: Vec<Rejection>,
    pub flags: Vec<Flag>,
}

impl ValidatedSeries {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Fails with `InsufficientData` when fewer than `minimum` bars survived.
    pub fn require_history(&self, minimum: usize) -> Result<(), SigtraderError> {
        if self.bars.len() < minimum {
            return Err(SigtraderError::InsufficientData {
                symbol: self.symbol.clone(),
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    pub max_price_deviation: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Validator {
            max_price_deviation: DEFAULT_MAX_PRICE_DEVIATION,
        }
    }
}

impl Validator {
    pub fn new(max_price_deviation: f64) -> Self {
        Validator {
            max_price_deviation,
        }
    }

    pub fn sanitize(&self, symbol: &str, bars: Vec<PriceBar>) -> ValidatedSeries {
        let mut rejections = Vec::new();
        let mut flags = Vec::new();
        let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();

        for bar in bars {
            if !bar.has_valid_close() {
                warn!(symbol, date = %bar.date, close = bar.close, "dropping bar with invalid close");
                rejections.push(Rejection {
                    date: bar.date,
                    reason: RejectReason::InvalidClose(bar.close),
                });
                continue;
            }
            if !bar.has_consistent_ohlc() {
                warn!(symbol, date = %bar.date, "inconsistent OHLC relationship");
                flags.push(Flag::InconsistentOhlc { date: bar.date });
            }
            let date = bar.date;
            if by_date.insert(date, bar).is_some() {
                warn!(symbol, date = %date, "duplicate date, keeping the later bar");
                rejections.push(Rejection {
                    date,
                    reason: RejectReason::Superseded,
                });
            }
        }

        let bars: Vec<PriceBar> = by_date.into_values().collect();

        for pair in bars.windows(2) {
            let (prev, curr) = (pair[0].close, pair[1].close);
            let pct_change = (curr - prev).abs() / prev;
            if pct_change > self.max_price_deviation {
                warn!(
                    symbol,
                    date = %pair[1].date,
                    "large price movement: {:.2}% from {} to {}",
                    pct_change * 100.0,
                    prev,
                    curr
                );
                flags.push(Flag::LargeMove {
                    date: pair[1].date,
                    pct_change,
                });
            }
        }

        ValidatedSeries {
            symbol: symbol.to_string(),
            bars,
            rejections,
            flags,
        }
    }
}

/// 1-20 characters drawn from `A-Z`, `0-9`, `-`, `.`, `_` and `^`.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.chars().count() <= MAX_SYMBOL_LEN
        && symbol
            .to_uppercase()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || "-._^".contains(c))
}
