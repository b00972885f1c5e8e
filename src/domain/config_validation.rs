//! Configuration loading and validation.
//!
//! Reads the `[backtest]` and `[strategy]` sections through a [`ConfigPort`]
//! into typed configs. Unparseable values are errors rather than silent
//! defaults; absent keys fall back to the documented defaults.

use chrono::NaiveDate;
use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::macd::MacdParams;
use crate::domain::indicator::signal::RsiThresholds;
use crate::domain::strategy::{StrategyConfig, StrategyVariant};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let defaults = BacktestConfig::default();

    let symbols = match non_empty(config, "backtest", "symbols") {
        Some(list) => parse_symbols(&list)
            .map_err(|e| SigtraderError::invalid("backtest", "symbols", e.to_string()))?,
        None => Vec::new(),
    };

    let backtest = BacktestConfig {
        symbols,
        start_date: read_date(config, "backtest", "start_date")?,
        end_date: read_date(config, "backtest", "end_date")?,
        initial_capital: read_value(
            config,
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        commission_rate: read_value(
            config,
            "backtest",
            "commission_rate",
            defaults.commission_rate,
        )?,
        max_price_deviation: read_value(
            config,
            "backtest",
            "max_price_deviation",
            defaults.max_price_deviation,
        )?,
    };
    backtest.validate()?;
    Ok(backtest)
}

pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, SigtraderError> {
    let variant = match non_empty(config, "strategy", "variant") {
        Some(v) => StrategyVariant::from_str(&v)
            .map_err(|reason| SigtraderError::invalid("strategy", "variant", reason))?,
        None => StrategyVariant::AnyPeriod,
    };

    let base = match variant {
        StrategyVariant::SinglePeriod => StrategyConfig::single_period(6),
        StrategyVariant::AnyPeriod => StrategyConfig::any_period(),
    };

    let rsi_periods = match non_empty(config, "strategy", "rsi_periods") {
        Some(list) => parse_periods(&list)?,
        None => base.rsi_periods.clone(),
    };

    let thresholds = RsiThresholds {
        oversold: read_value(config, "strategy", "oversold", base.thresholds.oversold)?,
        overbought: read_value(config, "strategy", "overbought", base.thresholds.overbought)?,
    };

    let macd = MacdParams {
        fast: read_value(config, "strategy", "macd_fast", base.macd.fast)?,
        slow: read_value(config, "strategy", "macd_slow", base.macd.slow)?,
        signal: read_value(config, "strategy", "macd_signal", base.macd.signal)?,
    };

    let buy_pct = read_value(config, "strategy", "buy_pct", base.buy_pct)?;
    let sell_pct = read_value(config, "strategy", "sell_pct", base.sell_pct)?;

    let strategy = StrategyConfig {
        name: non_empty(config, "strategy", "name").unwrap_or(base.name.clone()),
        variant,
        rsi_periods,
        thresholds,
        seed_fraction: read_value(config, "strategy", "seed_fraction", base.seed_fraction)?,
        use_macd: config.get_bool("strategy", "use_macd", base.use_macd),
        macd,
        ..base
    }
    .with_sizing(buy_pct, sell_pct);

    strategy.validate()?;
    Ok(strategy)
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SigtraderError> {
    match non_empty(config, section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| SigtraderError::invalid(section, key, format!("cannot parse '{}'", raw))),
    }
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SigtraderError> {
    non_empty(config, section, key)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                SigtraderError::invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            })
        })
        .transpose()
}

fn parse_periods(list: &str) -> Result<Vec<usize>, SigtraderError> {
    let mut periods = Vec::new();
    for token in list.split(',') {
        let period: usize = token.trim().parse().map_err(|_| {
            SigtraderError::invalid(
                "strategy",
                "rsi_periods",
                format!("'{}' is not a period", token.trim()),
            )
        })?;
        if !periods.contains(&period) {
            periods.push(period);
        }
    }
    Ok(periods)
}
