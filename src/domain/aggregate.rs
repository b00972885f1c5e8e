//! Time-aggregated capital series built from the ledger.
//!
//! Daily capital runs over one continuous calendar spanning the first to the
//! last trade date of any symbol. Each symbol starts with the ledger's initial
//! capital and is valued at its last traded price, carried forward across
//! days without trades. Before a symbol's first trade its capital is its cash.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::ledger::TradeLog;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapitalSample {
    pub date: NaiveDate,
    pub per_symbol: BTreeMap<String, f64>,
    /// Equal-weight mean across symbols, shifted so the first day is 0.
    pub avg_symbol_capital: f64,
    pub total_capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeeklyReturn {
    pub week: NaiveDate,
    pub symbol: String,
    pub return_pct: f64,
}

/// Every calendar day from `start` to `end`, inclusive.
pub fn calendar(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let days = (end - start).num_days();
    if days < 0 {
        return Vec::new();
    }
    (0..=days).map(|d| start + Duration::days(d)).collect()
}

/// Weeks end on Monday: a Monday anchors to itself, any other day to the
/// following Monday.
pub fn week_anchor(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Duration::days(offset as i64)
}

fn date_span(log: &TradeLog) -> Option<(NaiveDate, NaiveDate)> {
    let start = log.events().iter().map(|e| e.date).min()?;
    let end = log.events().iter().map(|e| e.date).max()?;
    Some((start, end))
}

/// Capital per symbol for every day of `days`, taking post-trade cash and
/// shares from the ledger events of that day.
fn symbol_capital(log: &TradeLog, symbol: &str, days: &[NaiveDate]) -> Vec<f64> {
    let mut events = log.events_for(symbol).peekable();
    let mut cash = log.initial_capital();
    let mut shares = 0.0;
    let mut price: Option<f64> = None;

    days.iter()
        .map(|&day| {
            while let Some(event) = events.next_if(|e| e.date <= day) {
                cash = event.cash_after;
                shares = event.position_shares_after;
                price = Some(event.price);
            }
            match price {
                Some(p) => cash + shares * p,
                None => cash,
            }
        })
        .collect()
}

pub fn daily_capital(log: &TradeLog) -> Vec<CapitalSample> {
    let Some((start, end)) = date_span(log) else {
        return Vec::new();
    };
    let days = calendar(start, end);

    let columns: Vec<(&str, Vec<f64>)> = log
        .symbols()
        .map(|symbol| (symbol, symbol_capital(log, symbol, &days)))
        .collect();

    let n = columns.len() as f64;
    let mut samples: Vec<CapitalSample> = days
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let per_symbol: BTreeMap<String, f64> = columns
                .iter()
                .map(|(symbol, values)| (symbol.to_string(), values[i]))
                .collect();
            let total_capital: f64 = per_symbol.values().sum();
            CapitalSample {
                date,
                per_symbol,
                avg_symbol_capital: total_capital / n,
                total_capital,
            }
        })
        .collect();

    if let Some(base) = samples.first().map(|s| s.avg_symbol_capital) {
        for sample in &mut samples {
            sample.avg_symbol_capital -= base;
        }
    }

    debug!(
        days = samples.len(),
        symbols = columns.len(),
        "daily capital series built"
    );
    samples
}

/// Week-over-week percent change of each symbol's forward-filled trade
/// price, one row per (week, symbol). The first week of a symbol is 0.
pub fn weekly_returns(log: &TradeLog) -> Vec<WeeklyReturn> {
    let mut rows = Vec::new();

    for symbol in log.symbols() {
        let mut last_per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for event in log.events_for(symbol) {
            last_per_day.insert(event.date, event.price);
        }
        let (Some((&first, _)), Some((&last, _))) =
            (last_per_day.first_key_value(), last_per_day.last_key_value())
        else {
            continue;
        };

        let mut weekly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut price = None;
        for day in calendar(first, last) {
            if let Some(&p) = last_per_day.get(&day) {
                price = Some(p);
            }
            if let Some(p) = price {
                weekly.insert(week_anchor(day), p);
            }
        }

        let mut prev: Option<f64> = None;
        for (week, p) in weekly {
            let return_pct = match prev {
                Some(q) => (p / q - 1.0) * 100.0,
                None => 0.0,
            };
            rows.push(WeeklyReturn {
                week,
                symbol: symbol.to_string(),
                return_pct,
            });
            prev = Some(p);
        }
    }

    rows.sort_by(|a, b| (a.week, &a.symbol).cmp(&(b.week, &b.symbol)));
    rows
}
