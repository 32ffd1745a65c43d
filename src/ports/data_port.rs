//! Price data access port.

use chrono::NaiveDateTime;

use crate::domain::error::TradebenchError;
use crate::domain::ohlcv::PricePoint;

pub trait DataPort {
    /// Bars within the inclusive `[start, end]` range, ascending by
    /// timestamp. A `None` bound is open.
    fn fetch_bars(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<PricePoint>, TradebenchError>;

    /// Human-readable origin of the bars, used in error messages.
    fn source_name(&self) -> String;
}
