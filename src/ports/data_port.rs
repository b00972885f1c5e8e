//! Price data access port.

use crate::domain::error::SigtraderError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Bars for `symbol` between the optional inclusive bounds. Bars are
    /// returned as stored; sanitizing is the caller's concern.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError>;

    /// Sorted, distinct symbols available from this source.
    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}
