//! Long-format CSV price source.
//!
//! One file holds every symbol, one row per (symbol, date). Columns are found
//! by header name: `symbol`, `date`, `close_price` (or `close`) are required,
//! `open_price`, `high_price`, `low_price` and `volume` are optional.

use crate::domain::error::SigtraderError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::warn;

pub struct CsvPriceSource {
    path: PathBuf,
}

struct Columns {
    symbol: usize,
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, SigtraderError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| SigtraderError::DataSource {
                reason: format!("missing {} column", names[0]),
            })
        };

        Ok(Columns {
            symbol: require(&["symbol"])?,
            date: require(&["date"])?,
            close: require(&["close_price", "close"])?,
            open: find(&["open_price", "open"]),
            high: find(&["high_price", "high"]),
            low: find(&["low_price", "low"]),
            volume: find(&["volume"]),
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn optional_f64(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| record.get(i))
        .and_then(|v| v.trim().parse().ok())
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_bars<F>(&self, mut keep: F) -> Result<Vec<PriceBar>, SigtraderError>
    where
        F: FnMut(&str, NaiveDate) -> bool,
    {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| SigtraderError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let headers = rdr.headers().map_err(|e| SigtraderError::DataSource {
            reason: format!("CSV header error: {}", e),
        })?;
        let cols = Columns::locate(headers)?;

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SigtraderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let symbol = record.get(cols.symbol).unwrap_or("").trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            let raw_date = record.get(cols.date).unwrap_or("");
            let Some(date) = parse_date(raw_date) else {
                warn!(symbol = %symbol, row = line + 1, date = raw_date, "skipping row with unparseable date");
                continue;
            };
            if !keep(&symbol, date) {
                continue;
            }

            // a missing close becomes NaN and is rejected by the validator
            let close = optional_f64(&record, Some(cols.close)).unwrap_or(f64::NAN);
            bars.push(PriceBar {
                symbol,
                date,
                close,
                open: optional_f64(&record, cols.open),
                high: optional_f64(&record, cols.high),
                low: optional_f64(&record, cols.low),
                volume: optional_f64(&record, cols.volume).map(|v| v as i64),
            });
        }

        Ok(bars)
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError> {
        let wanted = symbol.to_uppercase();
        let mut bars = self.read_bars(|s, date| {
            s == wanted
                && start_date.is_none_or(|start| date >= start)
                && end_date.is_none_or(|end| date <= end)
        })?;
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let symbols: BTreeSet<String> = self
            .read_bars(|_, _| true)?
            .into_iter()
            .map(|b| b.symbol)
            .collect();
        Ok(symbols.into_iter().collect())
    }
}
