//! CSV report sink.
//!
//! Writes one file per table into an output directory. Rounding happens only
//! here: money to two decimals, shares of non-init trades to the nearest
//! whole number.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::{Column, IndicatorFrame};
use crate::domain::indicator::summary::IndicatorSummary;
use crate::domain::ledger::TradeEvent;
use crate::domain::simulator::Action;
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::ReportSink;

pub const INDICATORS_FILE: &str = "indicators.csv";
pub const INDICATOR_SUMMARY_FILE: &str = "indicator_summary.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const DAILY_CAPITAL_FILE: &str = "daily_capital.csv";
pub const WEEKLY_RETURNS_FILE: &str = "weekly_returns.csv";
pub const LAST_TRADES_FILE: &str = "last_trades.csv";
pub const OPTIMIZATION_FILE: &str = "optimization.csv";

pub struct CsvReportSink {
    dir: PathBuf,
}

fn money(x: f64) -> String {
    format!("{:.2}", x)
}

fn value(x: Option<f64>) -> String {
    x.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

fn shares(action: Action, n: f64) -> String {
    match action {
        Action::Init => format!("{:.4}", n),
        _ => format!("{:.0}", n.round()),
    }
}

fn trade_row(e: &TradeEvent) -> Vec<String> {
    vec![
        e.date.to_string(),
        e.symbol.clone(),
        e.action.to_string(),
        money(e.price),
        shares(e.action, e.shares),
        money(e.notional),
        money(e.realized_pnl),
        money(e.cumulative_realized_pnl),
        money(e.avg_cost_per_share),
        format!("{:.4}", e.position_shares_after),
        money(e.position_value_after),
        money(e.cash_after),
        money(e.equity_after),
    ]
}

impl CsvReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_table<R>(&self, name: &str, header: &[&str], rows: R) -> Result<(), SigtraderError>
    where
        R: IntoIterator<Item = Vec<String>>,
    {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let report_err = |e: csv::Error| SigtraderError::Report {
            reason: format!("{}: {}", path.display(), e),
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(report_err)?;
        wtr.write_record(header).map_err(report_err)?;
        let mut count = 0;
        for row in rows {
            wtr.write_record(&row).map_err(report_err)?;
            count += 1;
        }
        wtr.flush()?;

        info!(file = %path.display(), rows = count, "wrote report");
        Ok(())
    }
}

impl ReportSink for CsvReportSink {
    fn write_indicators(
        &self,
        frames: &[IndicatorFrame],
        summaries: &[IndicatorSummary],
    ) -> Result<(), SigtraderError> {
        let mut header = vec!["symbol".to_string(), "date".into(), "close".into()];
        if let Some(first) = frames.first() {
            header.extend(first.columns().into_iter().map(|(key, _)| key));
        }

        let rows = frames.iter().map(|f| {
            let mut row = vec![f.symbol.clone(), f.date.to_string(), money(f.close)];
            row.extend(f.columns().into_iter().map(|(_, col)| match col {
                Column::Value(v) => value(v),
                Column::Signal(s) => s.map(|s| s.to_string()).unwrap_or_default(),
            }));
            row
        });
        let header: Vec<&str> = header.iter().map(String::as_str).collect();
        self.write_table(INDICATORS_FILE, &header, rows)?;

        let mut stats_rows = Vec::new();
        for summary in summaries {
            for stats in &summary.values {
                let counts = summary.counts(&format!("{}_signal", stats.key));
                stats_rows.push(vec![
                    summary.symbol.clone(),
                    stats.key.clone(),
                    stats.data_points.to_string(),
                    value(stats.min),
                    value(stats.max),
                    value(stats.mean),
                    value(stats.current),
                    counts.map(|c| c.buy.to_string()).unwrap_or_default(),
                    counts.map(|c| c.sell.to_string()).unwrap_or_default(),
                    counts.map(|c| c.hold.to_string()).unwrap_or_default(),
                ]);
            }
        }
        self.write_table(
            INDICATOR_SUMMARY_FILE,
            &[
                "symbol", "indicator", "data_points", "min", "max", "mean", "current", "buy",
                "sell", "hold",
            ],
            stats_rows,
        )
    }

    fn write_backtest(&self, report: &BacktestReport) -> Result<(), SigtraderError> {
        const TRADE_HEADER: [&str; 13] = [
            "date",
            "symbol",
            "action",
            "price",
            "shares",
            "notional",
            "realized_pnl",
            "cumulative_realized_pnl",
            "avg_cost_per_share",
            "position_shares_after",
            "position_value_after",
            "cash_after",
            "equity_after",
        ];

        self.write_table(
            TRADES_FILE,
            &TRADE_HEADER,
            report.ledger.events().iter().map(trade_row),
        )?;

        self.write_table(
            SUMMARY_FILE,
            &[
                "symbol",
                "total_buys",
                "total_sells",
                "total_buy_notional",
                "total_sell_proceeds",
                "realized_pnl",
                "unrealized_pnl",
                "total_pnl",
                "ending_shares",
                "ending_avg_cost",
                "last_price",
                "ending_cash_plus_position_value",
            ],
            report.summaries.iter().map(|s| {
                vec![
                    s.symbol.clone(),
                    s.total_buys.to_string(),
                    s.total_sells.to_string(),
                    money(s.total_buy_notional),
                    money(s.total_sell_proceeds),
                    money(s.realized_pnl),
                    money(s.unrealized_pnl),
                    money(s.total_pnl),
                    format!("{:.4}", s.ending_shares),
                    money(s.ending_avg_cost),
                    money(s.last_price),
                    money(s.ending_cash_plus_position_value),
                ]
            }),
        )?;

        let symbols: Vec<&str> = report.ledger.symbols().collect();
        let mut daily_header = vec!["date"];
        daily_header.extend(symbols.iter().copied());
        daily_header.extend(["avg_symbol_capital", "total_capital"]);
        self.write_table(
            DAILY_CAPITAL_FILE,
            &daily_header,
            report.daily.iter().map(|d| {
                let mut row = vec![d.date.to_string()];
                row.extend(
                    symbols
                        .iter()
                        .map(|s| d.per_symbol.get(*s).map(|&c| money(c)).unwrap_or_default()),
                );
                row.push(money(d.avg_symbol_capital));
                row.push(money(d.total_capital));
                row
            }),
        )?;

        self.write_table(
            WEEKLY_RETURNS_FILE,
            &["week", "symbol", "return_pct"],
            report
                .weekly
                .iter()
                .map(|w| vec![w.week.to_string(), w.symbol.clone(), money(w.return_pct)]),
        )?;

        self.write_table(
            LAST_TRADES_FILE,
            &[
                "date",
                "symbol",
                "action",
                "price",
                "shares",
                "notional",
                "realized_pnl",
            ],
            report.last_trades().into_iter().map(|e| {
                vec![
                    e.date.to_string(),
                    e.symbol.clone(),
                    e.action.to_string(),
                    money(e.price),
                    shares(e.action, e.shares),
                    money(e.notional),
                    money(e.realized_pnl),
                ]
            }),
        )
    }

    fn write_sweep(&self, best: &[SweepResult]) -> Result<(), SigtraderError> {
        self.write_table(
            OPTIMIZATION_FILE,
            &["symbol", "best_buy_pct", "best_sell_pct", "ending_equity"],
            best.iter().map(|r| {
                vec![
                    r.symbol.clone(),
                    format!("{:.4}", r.buy_pct),
                    format!("{:.4}", r.sell_pct),
                    money(r.ending_equity),
                ]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig};
    use crate::domain::indicator::frame::{compute_frames, IndicatorParams};
    use crate::domain::indicator::summary::summarize;
    use crate::domain::price_bar::PriceBar;
    use crate::domain::strategy::StrategyConfig;
    use crate::domain::validation::Validator;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    fn bars(symbol: &str, n: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + ((i as f64) * 0.7).sin() * 10.0;
                PriceBar::new(symbol, start + chrono::Duration::days(i as i64), close)
            })
            .collect()
    }

    fn read_lines(dir: &Path, name: &str) -> Vec<String> {
        fs::read_to_string(dir.join(name))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn shares_format_by_action() {
        assert_eq!(shares(Action::Buy, 2000.9), "2001");
        assert_eq!(shares(Action::Sell, 19.2), "19");
        assert_eq!(shares(Action::Init, 5000.125), "5000.1250");
        assert_eq!(money(1234.5678), "1234.57");
    }

    #[test]
    fn share_counts_round_away_float_drift() {
        assert_eq!(shares(Action::Buy, 1999.9999999), "2000");
        assert_eq!(shares(Action::Sell, 299.9999999990001), "300");
        assert_eq!(shares(Action::Buy, 0.2), "0");
    }

    #[test]
    fn writes_indicator_tables() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let sink = CsvReportSink::new(&out);
        let frames = compute_frames(&bars("SBER", 40), &IndicatorParams::default());
        let summary = summarize("SBER", &frames);

        sink.write_indicators(&frames, &[summary]).unwrap();

        let lines = read_lines(&out, INDICATORS_FILE);
        assert_eq!(lines.len(), 41);
        assert!(lines[0].starts_with("symbol,date,close,rsi_6,rsi_6_signal"));
        assert!(lines[0].ends_with("macd_signal"));
        // RSI(6) undefined on the first bar
        assert!(lines[1].starts_with("SBER,2024-01-01,100.00,,"));

        let summary_lines = read_lines(&out, INDICATOR_SUMMARY_FILE);
        assert!(summary_lines[1].starts_with("SBER,rsi_6,34,"));
    }

    #[test]
    fn writes_backtest_tables() {
        let dir = TempDir::new().unwrap();
        let sink = CsvReportSink::new(dir.path());
        let mut series = BTreeMap::new();
        series.insert(
            "SBER".to_string(),
            Validator::default().sanitize("SBER", bars("SBER", 50)),
        );
        let report = run_backtest(
            &series,
            &StrategyConfig::any_period(),
            &BacktestConfig::default(),
        )
        .unwrap();

        sink.write_backtest(&report).unwrap();

        let trades = read_lines(dir.path(), TRADES_FILE);
        assert_eq!(trades.len(), report.ledger.events().len() + 1);
        assert!(trades[1].starts_with("2024-01-01,SBER,init,100.00,"));

        let summary = read_lines(dir.path(), SUMMARY_FILE);
        assert_eq!(summary.len(), 2);

        let daily = read_lines(dir.path(), DAILY_CAPITAL_FILE);
        assert_eq!(daily[0], "date,SBER,avg_symbol_capital,total_capital");
        assert_eq!(daily.len(), report.daily.len() + 1);

        let last = read_lines(dir.path(), LAST_TRADES_FILE);
        assert_eq!(last.len(), 2);
        assert!(dir.path().join(WEEKLY_RETURNS_FILE).exists());
    }

    #[test]
    fn writes_sweep_table() {
        let dir = TempDir::new().unwrap();
        let sink = CsvReportSink::new(dir.path());
        sink.write_sweep(&[SweepResult {
            symbol: "SBER".into(),
            buy_pct: 0.2875,
            sell_pct: 0.01,
            ending_equity: 1_050_000.456,
        }])
        .unwrap();

        let lines = read_lines(dir.path(), OPTIMIZATION_FILE);
        assert_eq!(lines[0], "symbol,best_buy_pct,best_sell_pct,ending_equity");
        assert_eq!(lines[1], "SBER,0.2875,0.0100,1050000.46");
    }
}
