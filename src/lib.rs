//! sigtrader: RSI/MACD signal engine and trade-simulation backtester.
//!
//! Hexagonal layout: indicator, simulation and ledger logic in [`domain`],
//! port traits in [`ports`], CSV and INI implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
