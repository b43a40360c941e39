//! # Domain Models
//!
//! Strongly-typed values that tool arguments are coerced into, and the
//! normalized price records produced from upstream payloads.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated, upper-cased ticker symbol |
//! | [`CalendarDate`] | ISO `YYYY-MM-DD` date |
//! | [`Period`] | Statement period (annual, quarterly, ttm) |
//! | [`PriceInterval`] | Price bucket (minute, day, week, month, year) |
//! | [`PriceBar`] | OHLCV record |
//! | [`PriceSeries`] | Date-ordered OHLCV records for one ticker |
//! | [`PriceSnapshot`] | Latest price with timestamp |

mod date;
mod interval;
mod models;
mod ticker;

pub use date::CalendarDate;
pub use interval::{Period, PriceInterval};
pub use models::{PriceBar, PriceSeries, PriceSnapshot};
pub use ticker::Ticker;
