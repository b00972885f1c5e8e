//! Commission-adjusted trade ledger.
//!
//! [`TradeLog`] replays simulator fills against a per-symbol book, charging a
//! single commission rate on both sides. Events live in one append-only arena;
//! a per-symbol index gives each symbol's events in chronological order.
//! Seed trades are treated exactly like buys.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::position::Position;
use crate::domain::simulator::{Action, Fill};

pub const DEFAULT_COMMISSION_RATE: f64 = 0.0001;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: Action,
    pub price: f64,
    pub shares: f64,
    pub notional: f64,
    pub realized_pnl: f64,
    pub cumulative_realized_pnl: f64,
    pub avg_cost_per_share: f64,
    pub position_shares_after: f64,
    pub position_value_after: f64,
    pub cash_after: f64,
    pub equity_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolSummary {
    pub symbol: String,
    pub total_buys: usize,
    pub total_sells: usize,
    pub total_buy_notional: f64,
    pub total_sell_proceeds: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub ending_shares: f64,
    pub ending_avg_cost: f64,
    pub last_price: f64,
    pub ending_cash_plus_position_value: f64,
}

#[derive(Debug, Clone)]
struct Book {
    position: Position,
    cumulative_realized: f64,
    total_buys: usize,
    total_sells: usize,
    total_buy_notional: f64,
    total_sell_proceeds: f64,
    last_price: f64,
}

impl Book {
    fn new(initial_capital: f64) -> Self {
        Book {
            position: Position::new(initial_capital),
            cumulative_realized: 0.0,
            total_buys: 0,
            total_sells: 0,
            total_buy_notional: 0.0,
            total_sell_proceeds: 0.0,
            last_price: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeLog {
    initial_capital: f64,
    commission_rate: f64,
    events: Vec<TradeEvent>,
    index: BTreeMap<String, Vec<usize>>,
    books: BTreeMap<String, Book>,
}

impl TradeLog {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        TradeLog {
            initial_capital,
            commission_rate,
            events: Vec::new(),
            index: BTreeMap::new(),
            books: BTreeMap::new(),
        }
    }

    /// Replays `fills` in the order given. Fills for one symbol must already
    /// be chronological.
    pub fn replay(fills: &[Fill], initial_capital: f64, commission_rate: f64) -> Self {
        let mut log = TradeLog::new(initial_capital, commission_rate);
        for fill in fills {
            log.record(fill);
        }
        info!(
            events = log.events.len(),
            symbols = log.index.len(),
            commission_rate,
            "ledger built"
        );
        log
    }

    /// Applies one fill and returns the event it produced. A sell that finds
    /// nothing to sell changes no state and records nothing.
    pub fn record(&mut self, fill: &Fill) -> Option<&TradeEvent> {
        if !fill.action.is_acquisition() {
            let nothing_held = self
                .books
                .get(&fill.symbol)
                .is_none_or(|book| book.position.is_flat());
            if nothing_held || fill.shares <= 0.0 {
                debug!(symbol = %fill.symbol, date = %fill.date, "sell without shares ignored");
                return None;
            }
        }

        let c = self.commission_rate;
        let initial_capital = self.initial_capital;
        let book = self
            .books
            .entry(fill.symbol.clone())
            .or_insert_with(|| Book::new(initial_capital));

        let mut realized_pnl = 0.0;
        let (shares, notional) = if fill.action.is_acquisition() {
            let trade_cost = fill.shares * fill.price;
            book.position.add_shares(fill.shares, trade_cost * (1.0 + c));
            book.total_buys += 1;
            book.total_buy_notional += trade_cost;
            (fill.shares, fill.notional)
        } else {
            let sale = book.position.remove_shares(fill.shares, fill.price, c);
            realized_pnl = sale.realized_pnl;
            book.cumulative_realized += realized_pnl;
            book.total_sells += 1;
            book.total_sell_proceeds += sale.gross_proceeds;
            (sale.shares_sold, sale.gross_proceeds)
        };
        book.last_price = fill.price;

        let position = book.position;
        let position_value_after = position.market_value(fill.price);
        let event = TradeEvent {
            date: fill.date,
            symbol: fill.symbol.clone(),
            action: fill.action,
            price: fill.price,
            shares,
            notional,
            realized_pnl,
            cumulative_realized_pnl: book.cumulative_realized,
            avg_cost_per_share: position.avg_cost,
            position_shares_after: position.shares,
            position_value_after,
            cash_after: position.cash,
            equity_after: position.cash + position_value_after,
        };

        let id = self.events.len();
        self.events.push(event);
        self.index.entry(fill.symbol.clone()).or_default().push(id);
        Some(&self.events[id])
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in recording order.
    pub fn events(&self) -> &[TradeEvent] {
        &self.events
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn events_for<'a>(
        &'a self,
        symbol: &str,
    ) -> impl Iterator<Item = &'a TradeEvent> + use<'a> {
        self.index
            .get(symbol)
            .into_iter()
            .flatten()
            .map(move |&id| &self.events[id])
    }

    pub fn summary(&self, symbol: &str) -> Option<SymbolSummary> {
        let book = self.books.get(symbol)?;
        let position = &book.position;
        let unrealized_pnl = position.unrealized_pnl(book.last_price);
        Some(SymbolSummary {
            symbol: symbol.to_string(),
            total_buys: book.total_buys,
            total_sells: book.total_sells,
            total_buy_notional: book.total_buy_notional,
            total_sell_proceeds: book.total_sell_proceeds,
            realized_pnl: book.cumulative_realized,
            unrealized_pnl,
            total_pnl: book.cumulative_realized + unrealized_pnl,
            ending_shares: position.shares,
            ending_avg_cost: position.avg_cost,
            last_price: book.last_price,
            ending_cash_plus_position_value: position.equity(book.last_price),
        })
    }

    /// One summary per symbol, in symbol order.
    pub fn summaries(&self) -> Vec<SymbolSummary> {
        self.books
            .keys()
            .filter_map(|symbol| self.summary(symbol))
            .collect()
    }

    /// The chronologically last event of every symbol, in symbol order.
    pub fn last_trades(&self) -> Vec<&TradeEvent> {
        self.index
            .values()
            .filter_map(|ids| ids.last().map(|&id| &self.events[id]))
            .collect()
    }
}
