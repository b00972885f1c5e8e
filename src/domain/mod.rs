//! Core domain types and logic.

pub mod aggregate;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod ledger;
pub mod position;
pub mod price_bar;
pub mod simulator;
pub mod strategy;
pub mod sweep;
pub mod universe;
pub mod validation;
