#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::price_bar::PriceBar;
use sigtrader::ports::data_port::PriceSource;
use std::collections::BTreeMap;

pub struct MockPriceSource {
    pub data: BTreeMap<String, Vec<PriceBar>>,
    pub errors: BTreeMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        Ok(self.data.keys().cloned().collect())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(symbol: &str, day: &str, close: f64) -> PriceBar {
    PriceBar::new(symbol, date(day), close)
}

/// One bar per calendar day starting at `start`.
pub fn daily_bars(symbol: &str, start: &str, closes: &[f64]) -> Vec<PriceBar> {
    let first = date(start);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::new(symbol, first + chrono::Duration::days(i as i64), c))
        .collect()
}

/// Oscillating closes that cross both RSI thresholds repeatedly.
pub fn zigzag(n: usize, base: f64, amplitude: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + ((i as f64) * 0.9).sin() * amplitude)
        .collect()
}

pub fn descending(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start - step * i as f64).collect()
}

/// Writes rows of `symbol,date,close_price` with a header.
pub fn price_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("symbol,date,close_price\n");
    for b in bars {
        out.push_str(&format!("{},{},{}\n", b.symbol, b.date, b.close));
    }
    out
}
