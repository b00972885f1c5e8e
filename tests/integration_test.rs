//! End-to-end tests of the indicator, simulation and ledger pipeline.
//!
//! Price data comes from `MockPriceSource`; every stage after loading runs
//! exactly as the CLI runs it.

mod common;

use approx::assert_relative_eq;
use common::*;
use sigtrader::domain::backtest::{compute_indicators, run_backtest, BacktestConfig};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::indicator::frame::IndicatorParams;
use sigtrader::domain::ledger::TradeLog;
use sigtrader::domain::simulator::{Action, Fill};
use sigtrader::domain::strategy::StrategyConfig;
use sigtrader::domain::sweep::sweep;
use sigtrader::domain::universe::{load_universe, SkipReason};
use sigtrader::domain::validation::Validator;
use sigtrader::ports::data_port::PriceSource;

mod single_period_pipeline {
    use super::*;

    fn report_for(closes: &[f64]) -> sigtrader::domain::backtest::BacktestReport {
        let source =
            MockPriceSource::new().with_bars("SBER", daily_bars("SBER", "2024-01-01", closes));
        let universe = load_universe(
            &source,
            &["SBER".to_string()],
            None,
            None,
            &Validator::default(),
        )
        .unwrap();
        run_backtest(
            &universe.series,
            &StrategyConfig::single_period(6),
            &BacktestConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn falling_prices_buy_from_first_defined_rsi() {
        let report = report_for(&descending(10, 100.0, 1.0));

        let actions: Vec<Action> = report.fills.iter().map(|f| f.action).collect();
        assert_eq!(actions, vec![Action::Buy; 4]);
        assert_eq!(report.fills[0].date, date("2024-01-07"));
        assert_eq!(report.fills[0].price, 94.0);

        // simulator spends 20% of remaining cash each time
        let notionals: Vec<f64> = report.fills.iter().map(|f| f.notional).collect();
        for (got, want) in notionals.iter().zip([200_000.0, 160_000.0, 128_000.0, 102_400.0]) {
            assert_relative_eq!(*got, want, max_relative = 1e-12);
        }
        assert_relative_eq!(report.fills[3].cash_after, 409_600.0, max_relative = 1e-12);

        // the ledger charges commission on top
        let last = report.ledger.events().last().unwrap();
        assert_relative_eq!(last.cash_after, 1_000_000.0 - 590_400.0 * 1.0001, max_relative = 1e-12);

        let summary = &report.summaries[0];
        assert_eq!(summary.total_buys, 4);
        assert_eq!(summary.total_sells, 0);
        assert_eq!(summary.realized_pnl, 0.0);
        assert_eq!(summary.last_price, 91.0);
        assert!(summary.unrealized_pnl < 0.0);
    }

    #[test]
    fn flat_prices_never_trade() {
        let report = report_for(&[250.0; 40]);
        assert!(report.fills.is_empty());
        assert!(report.ledger.is_empty());
        assert!(report.summaries.is_empty());
        assert!(report.daily.is_empty());
        assert!(report.weekly.is_empty());
    }
}

mod seeded_pipeline {
    use super::*;

    #[test]
    fn every_symbol_starts_with_init_on_first_bar() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(60, 250.0, 20.0)))
            .with_bars("GAZP", daily_bars("GAZP", "2024-01-03", &zigzag(50, 160.0, 12.0)));
        let symbols = source.list_symbols().unwrap();
        let universe = load_universe(&source, &symbols, None, None, &Validator::default()).unwrap();

        let report = run_backtest(
            &universe.series,
            &StrategyConfig::any_period(),
            &BacktestConfig::default(),
        )
        .unwrap();

        for symbol in ["GAZP", "SBER"] {
            let first = report.ledger.events_for(symbol).next().unwrap();
            assert_eq!(first.action, Action::Init);
            assert_relative_eq!(first.notional, 500_000.0, max_relative = 1e-12);
        }
        assert_eq!(report.ledger.events_for("SBER").next().unwrap().date, date("2024-01-01"));
        assert_eq!(report.ledger.events_for("GAZP").next().unwrap().date, date("2024-01-03"));

        // merged stream is ordered by (date, symbol)
        for pair in report.fills.windows(2) {
            assert!((pair[0].date, &pair[0].symbol) <= (pair[1].date, &pair[1].symbol));
        }
    }

    #[test]
    fn ledger_equity_decomposes_into_pnl() {
        let series = daily_bars("SBER", "2024-01-01", &zigzag(120, 250.0, 30.0));
        let source = MockPriceSource::new().with_bars("SBER", series);
        let universe =
            load_universe(&source, &["SBER".into()], None, None, &Validator::default()).unwrap();
        let config = BacktestConfig::default();
        let report = run_backtest(&universe.series, &StrategyConfig::any_period(), &config).unwrap();

        let mut cumulative = 0.0;
        for e in report.ledger.events() {
            cumulative += e.realized_pnl;
            assert_relative_eq!(e.cumulative_realized_pnl, cumulative, epsilon = 1e-6);
            assert!(e.position_shares_after >= 0.0);
            assert_relative_eq!(
                e.equity_after,
                e.cash_after + e.position_shares_after * e.price,
                max_relative = 1e-9
            );
            let unrealized = e.position_shares_after * (e.price - e.avg_cost_per_share);
            assert_relative_eq!(
                e.equity_after,
                config.initial_capital + e.cumulative_realized_pnl + unrealized,
                max_relative = 1e-9
            );
        }

        let summary = &report.summaries[0];
        assert_relative_eq!(
            summary.total_pnl,
            summary.realized_pnl + summary.unrealized_pnl,
            epsilon = 1e-9
        );
        assert!(summary.total_sells > 0);
    }
}

mod capital_aggregation {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn daily_series_covers_every_calendar_day() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(40, 250.0, 20.0)))
            .with_bars("GAZP", daily_bars("GAZP", "2024-01-10", &zigzag(40, 160.0, 12.0)));
        let universe = load_universe(
            &source,
            &["SBER".into(), "GAZP".into()],
            None,
            None,
            &Validator::default(),
        )
        .unwrap();
        let report = run_backtest(
            &universe.series,
            &StrategyConfig::any_period(),
            &BacktestConfig::default(),
        )
        .unwrap();

        let first = report.ledger.events().first().unwrap().date;
        let last = report.ledger.events().iter().map(|e| e.date).max().unwrap();
        assert_eq!(report.daily.first().unwrap().date, first);
        assert_eq!(report.daily.last().unwrap().date, last);
        assert_eq!(report.daily.len() as i64, (last - first).num_days() + 1);

        for pair in report.daily.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, chrono::Duration::days(1));
        }
        for sample in &report.daily {
            let sum: f64 = sample.per_symbol.values().sum();
            assert_relative_eq!(sample.total_capital, sum, max_relative = 1e-12);
            assert_eq!(sample.per_symbol.len(), 2);
        }
        assert_eq!(report.daily[0].avg_symbol_capital, 0.0);
    }

    #[test]
    fn weekly_returns_start_at_zero_per_symbol() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(60, 250.0, 20.0)));
        let universe =
            load_universe(&source, &["SBER".into()], None, None, &Validator::default()).unwrap();
        let report = run_backtest(
            &universe.series,
            &StrategyConfig::any_period(),
            &BacktestConfig::default(),
        )
        .unwrap();

        assert!(!report.weekly.is_empty());
        assert_eq!(report.weekly[0].return_pct, 0.0);
        for w in &report.weekly {
            assert_eq!(w.week.weekday(), chrono::Weekday::Mon);
        }
        for pair in report.weekly.windows(2) {
            assert!(pair[0].week < pair[1].week);
        }
    }

}

mod universe_loading {
    use super::*;

    #[test]
    fn bad_symbols_are_skipped_not_fatal() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(30, 250.0, 20.0)))
            .with_bars("DEAD", vec![make_bar("DEAD", "2024-01-01", 0.0)])
            .with_error("LKOH", "connection refused");
        let symbols = vec!["SBER".to_string(), "DEAD".into(), "LKOH".into()];
        let universe = load_universe(&source, &symbols, None, None, &Validator::default()).unwrap();

        assert_eq!(universe.count(), 1);
        assert_eq!(universe.skipped.len(), 2);
        assert!(universe
            .skipped
            .iter()
            .any(|s| s.symbol == "LKOH" && matches!(s.reason, SkipReason::SourceError(_))));
    }

    #[test]
    fn date_window_is_applied() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(30, 250.0, 20.0)));
        let universe = load_universe(
            &source,
            &["SBER".into()],
            Some(date("2024-01-05")),
            Some(date("2024-01-14")),
            &Validator::default(),
        )
        .unwrap();
        assert_eq!(universe.series["SBER"].bars.len(), 10);
    }

    #[test]
    fn nothing_usable_is_no_data() {
        let source = MockPriceSource::new().with_error("SBER", "gone");
        let err = load_universe(&source, &["SBER".into()], None, None, &Validator::default())
            .unwrap_err();
        assert!(matches!(err, SigtraderError::NoData { .. }));
    }
}

mod sizing_sweep {
    use super::*;

    #[test]
    fn best_point_is_at_least_as_good_as_defaults() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(90, 250.0, 25.0)));
        let universe =
            load_universe(&source, &["SBER".into()], None, None, &Validator::default()).unwrap();
        let strategy = StrategyConfig::any_period().with_sizing(0.05, 0.01);
        let config = BacktestConfig::default();

        let frames = compute_indicators(&universe.series, &strategy.indicator_params());
        let best = sweep(&frames, &strategy, &config, 3).unwrap();
        assert_eq!(best.len(), 1);

        // (0.05, 0.01) is the first grid point, so the winner can't be worse
        let baseline = run_backtest(&universe.series, &strategy, &config).unwrap();
        assert!(best[0].ending_equity >= config.initial_capital + baseline.total_pnl());
    }

    #[test]
    fn frames_do_not_depend_on_sizing() {
        let source = MockPriceSource::new()
            .with_bars("SBER", daily_bars("SBER", "2024-01-01", &zigzag(50, 250.0, 25.0)));
        let universe =
            load_universe(&source, &["SBER".into()], None, None, &Validator::default()).unwrap();
        let params = IndicatorParams::default();
        let a = compute_indicators(&universe.series, &params);
        let b = compute_indicators(
            &universe.series,
            &StrategyConfig::any_period().with_sizing(1.0, 1.0).indicator_params(),
        );
        assert_eq!(a, b);
    }
}

mod ledger_properties {
    use super::*;
    use proptest::prelude::*;

    fn fill(day: i64, action: Action, price: f64, shares: f64) -> Fill {
        Fill {
            date: date("2024-01-01") + chrono::Duration::days(day),
            symbol: "SBER".into(),
            action,
            price,
            shares,
            notional: shares * price,
            position_shares_after: 0.0,
            position_value_after: 0.0,
            cash_after: 0.0,
            equity_after: 0.0,
            signal: None,
        }
    }

    proptest! {
        #[test]
        fn prop_equity_is_capital_plus_pnl(
            trades in prop::collection::vec((any::<bool>(), 10.0f64..500.0, 0.0f64..2_000.0), 1..60),
            commission in 0.0f64..0.01,
        ) {
            let initial = 1_000_000.0;
            let fills: Vec<Fill> = trades
                .iter()
                .enumerate()
                .map(|(i, &(is_buy, price, shares))| {
                    let action = if is_buy { Action::Buy } else { Action::Sell };
                    fill(i as i64, action, price, shares)
                })
                .collect();
            let log = TradeLog::replay(&fills, initial, commission);

            let mut realized_sum = 0.0;
            for e in log.events() {
                realized_sum += e.realized_pnl;
                prop_assert!(e.position_shares_after >= 0.0);
                let unrealized = e.position_shares_after * (e.price - e.avg_cost_per_share);
                let expected = initial + e.cumulative_realized_pnl + unrealized;
                prop_assert!((e.equity_after - expected).abs() <= 1e-6 * initial);
            }
            prop_assert!((realized_sum - log.events().last().unwrap().cumulative_realized_pnl).abs() < 1e-6);

            let summary = log.summary("SBER").unwrap();
            prop_assert!(summary.total_buys + summary.total_sells <= trades.len());
        }
    }
}
