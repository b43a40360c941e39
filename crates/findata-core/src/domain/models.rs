use serde::{Deserialize, Serialize};

use crate::{CalendarDate, Ticker, ValidationError};

/// One OHLCV record of a historical price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: CalendarDate,
    /// Upstream timestamp, kept for intraday series where several bars share a date.
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        date: CalendarDate,
        time: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;

        Ok(Self {
            date,
            time: time.into(),
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Historical price series returned by `get_prices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: Ticker,
    pub prices: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series ordered by date ascending, then by upstream timestamp.
    pub fn sorted(ticker: Ticker, mut prices: Vec<PriceBar>) -> Self {
        prices.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        Self { ticker, prices }
    }
}

/// Latest price snapshot returned by `get_current_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub ticker: Ticker,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_change_percent: Option<f64>,
    pub time: String,
}

impl PriceSnapshot {
    pub fn new(
        ticker: Ticker,
        price: f64,
        day_change: Option<f64>,
        day_change_percent: Option<f64>,
        time: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_price("price", price)?;
        Ok(Self {
            ticker,
            price,
            day_change,
            day_change_percent,
            time: time.into(),
        })
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
