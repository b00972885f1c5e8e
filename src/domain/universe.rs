//! Symbol universe for multi-symbol runs.
//!
//! Parses symbol lists from configuration, loads each symbol through a
//! [`PriceSource`] and sanitizes it. Symbols without usable data are skipped
//! with a warning; the run fails only when none remain.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::domain::error::SigtraderError;
use crate::domain::validation::{is_valid_symbol, ValidatedSeries, Validator};
use crate::ports::data_port::PriceSource;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Comma-separated, upper-cased, no duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !is_valid_symbol(&symbol) {
            return Err(UniverseError::InvalidSymbol(symbol));
        }
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    SourceError(String),
    NoValidBars { rejected: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub series: BTreeMap<String, ValidatedSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.series.len()
    }
}

pub fn load_universe(
    source: &dyn PriceSource,
    symbols: &[String],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    validator: &Validator,
) -> Result<Universe, SigtraderError> {
    let mut series = BTreeMap::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match source.fetch_bars(symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::SourceError(e.to_string()),
                });
                continue;
            }
        };

        let validated = validator.sanitize(symbol, bars);
        if validated.is_empty() {
            warn!(symbol = %symbol, "skipping symbol: no valid bars");
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::NoValidBars {
                    rejected: validated.rejections.len(),
                },
            });
            continue;
        }

        info!(symbol = %symbol, bars = validated.bars.len(), "loaded");
        series.insert(symbol.clone(), validated);
    }

    if series.is_empty() {
        return Err(SigtraderError::NoData {
            symbol: symbols.join(","),
        });
    }

    if !skipped.is_empty() {
        warn!(
            loaded = series.len(),
            requested = symbols.len(),
            "some symbols were skipped"
        );
    }

    Ok(Universe { series, skipped })
}
