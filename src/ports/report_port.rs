//! Report output port.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::frame::IndicatorFrame;
use crate::domain::indicator::summary::IndicatorSummary;
use crate::domain::sweep::SweepResult;

pub trait ReportSink {
    fn write_indicators(
        &self,
        frames: &[IndicatorFrame],
        summaries: &[IndicatorSummary],
    ) -> Result<(), SigtraderError>;

    fn write_backtest(&self, report: &BacktestReport) -> Result<(), SigtraderError>;

    fn write_sweep(&self, best: &[SweepResult]) -> Result<(), SigtraderError>;
}
