//! Market data primitives: bars, series, intervals, quotes and order books.

use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLCV sample for a fixed time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Creates a bar where every price equals `price`.
    #[must_use]
    pub const fn flat(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// Typical price `(high + low + close) / 3`.
    #[must_use]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Ordered (oldest to newest) sequence of bars. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series, returning `None` if `bars` is empty. Bars are sorted by timestamp.
    #[must_use]
    pub fn new(mut bars: Vec<Bar>) -> Option<Self> {
        if bars.is_empty() {
            return None;
        }
        bars.sort_by_key(|b| b.timestamp);
        Some(Self { bars })
    }

    /// Synthesizes `count` flat zero-volume bars at `price`, one `step` apart, ending at `end`.
    #[must_use]
    pub fn flat(price: f64, count: usize, end: DateTime<Utc>, step: Duration) -> Self {
        let count = count.max(1);
        let bars = (0..count)
            .map(|i| {
                let back = i32::try_from(count - 1 - i).unwrap_or(i32::MAX);
                Bar::flat(end - step * back, price, 0.0)
            })
            .collect();
        Self { bars }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    /// Number of bars (always at least 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    #[must_use]
    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    #[must_use]
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    #[must_use]
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    #[must_use]
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = String;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars).ok_or_else(|| "bar series must not be empty".to_string())
    }
}

impl From<BarSeries> for Vec<Bar> {
    fn from(series: BarSeries) -> Self {
        series.bars
    }
}

/// Candle resolution requested from a market data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Resolution {
    /// The fixed set fetched for cross-timeframe context.
    pub const CONTEXT: [Self; 5] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
    ];

    /// Bucket width in minutes.
    #[must_use]
    pub const fn minutes(self) -> i64 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
        }
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::minutes(self.minutes())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction horizon requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Interval {
    pub const ALL: [Self; 6] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
    ];

    /// Candle resolution used for the primary history. 10m has no native candle and uses 5m.
    #[must_use]
    pub const fn resolution(self) -> Resolution {
        match self {
            Self::OneMinute => Resolution::OneMinute,
            Self::FiveMinutes | Self::TenMinutes => Resolution::FiveMinutes,
            Self::FifteenMinutes => Resolution::FifteenMinutes,
            Self::ThirtyMinutes => Resolution::ThirtyMinutes,
            Self::OneHour => Resolution::OneHour,
        }
    }

    /// How far back the primary history reaches.
    #[must_use]
    pub fn lookback(self) -> Duration {
        match self {
            Self::OneMinute => Duration::hours(1),
            Self::FiveMinutes => Duration::hours(5),
            Self::TenMinutes => Duration::hours(10),
            Self::FifteenMinutes => Duration::hours(15),
            Self::ThirtyMinutes => Duration::hours(24),
            Self::OneHour => Duration::hours(48),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidInterval(s.to_string()))
    }
}

/// Current price reported by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    /// A usable price is finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// One side entry of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

/// Top-of-book depth. Bids are best-first (descending), asks best-first (ascending).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    #[must_use]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Best ask minus best bid, 0 if either side is empty.
    #[must_use]
    pub fn spread(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask - bid,
            _ => 0.0,
        }
    }

    /// `(bid_size - ask_size) / (bid_size + ask_size)` over all levels, 0 with no depth.
    #[must_use]
    pub fn imbalance(&self) -> f64 {
        let bid_volume: f64 = self.bids.iter().map(|l| l.size).sum();
        let ask_volume: f64 = self.asks.iter().map(|l| l.size).sum();
        let total = bid_volume + ask_volume;
        if total > 0.0 {
            (bid_volume - ask_volume) / total
        } else {
            0.0
        }
    }
}
