//! Technical feature record and the aggregated per-request snapshot.

use crate::bar::{BarSeries, Interval, OrderBookSnapshot, Resolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat record of indicators derived from a bar series and the current price.
///
/// Every field is finite. Order book fields are 0 when no book was available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalFeatures {
    // Moving averages
    pub sma_5: f64,
    pub sma_10: f64,
    pub sma_20: f64,
    pub ema_5: f64,
    pub ema_10: f64,
    pub ema_20: f64,

    // Momentum
    pub rsi_14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,

    // Volatility
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub bollinger_bandwidth: f64,
    pub atr_14: f64,

    // Volume
    pub volume: f64,
    pub volume_sma_20: f64,
    pub volume_ratio: f64,
    pub vwap: f64,

    // Order book
    pub bid_ask_spread: f64,
    pub order_book_imbalance: f64,

    // Price action. The three short-horizon changes are absolute; `price_change_pct`
    // is the percentage move from the first close of the window to the current price.
    pub price_change_1m: f64,
    pub price_change_5m: f64,
    pub price_change_15m: f64,
    pub price_change_pct: f64,
    pub high_low_range: f64,
}

impl TechnicalFeatures {
    /// Replaces any non-finite field with 0.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        for value in self.fields_mut() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        self
    }

    /// Returns true if every field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|v| v.is_finite())
    }

    /// Relative deviation of `price` from SMA(20), 0 when the average is 0.
    #[must_use]
    pub fn sma20_deviation(&self, price: f64) -> f64 {
        if self.sma_20 == 0.0 {
            0.0
        } else {
            (price - self.sma_20) / self.sma_20
        }
    }

    /// Position of `price` inside the Bollinger band: 0 at the lower band, 1 at the upper.
    /// Returns 0.5 when the band has no width.
    #[must_use]
    pub fn bollinger_position(&self, price: f64) -> f64 {
        let width = self.bollinger_upper - self.bollinger_lower;
        if width > 0.0 {
            (price - self.bollinger_lower) / width
        } else {
            0.5
        }
    }

    fn fields(&self) -> [f64; 26] {
        [
            self.sma_5,
            self.sma_10,
            self.sma_20,
            self.ema_5,
            self.ema_10,
            self.ema_20,
            self.rsi_14,
            self.macd,
            self.macd_signal,
            self.macd_histogram,
            self.bollinger_upper,
            self.bollinger_middle,
            self.bollinger_lower,
            self.bollinger_bandwidth,
            self.atr_14,
            self.volume,
            self.volume_sma_20,
            self.volume_ratio,
            self.vwap,
            self.bid_ask_spread,
            self.order_book_imbalance,
            self.price_change_1m,
            self.price_change_5m,
            self.price_change_15m,
            self.price_change_pct,
            self.high_low_range,
        ]
    }

    fn fields_mut(&mut self) -> [&mut f64; 26] {
        [
            &mut self.sma_5,
            &mut self.sma_10,
            &mut self.sma_20,
            &mut self.ema_5,
            &mut self.ema_10,
            &mut self.ema_20,
            &mut self.rsi_14,
            &mut self.macd,
            &mut self.macd_signal,
            &mut self.macd_histogram,
            &mut self.bollinger_upper,
            &mut self.bollinger_middle,
            &mut self.bollinger_lower,
            &mut self.bollinger_bandwidth,
            &mut self.atr_14,
            &mut self.volume,
            &mut self.volume_sma_20,
            &mut self.volume_ratio,
            &mut self.vwap,
            &mut self.bid_ask_spread,
            &mut self.order_book_imbalance,
            &mut self.price_change_1m,
            &mut self.price_change_5m,
            &mut self.price_change_15m,
            &mut self.price_change_pct,
            &mut self.high_low_range,
        ]
    }
}

/// Feature-enriched state of one instrument at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub interval: Interval,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    pub technical: TechnicalFeatures,

    /// Close prices per context resolution. Resolutions that could not be fetched are absent.
    pub multi_interval_context: BTreeMap<Resolution, Vec<f64>>,

    /// Primary history the features were computed from.
    pub history: BarSeries,
    pub order_book: Option<OrderBookSnapshot>,

    /// Source that supplied the current price.
    pub quote_source: String,
    /// Source that supplied the history, `None` when the series was synthesized.
    pub history_source: Option<String>,
}

impl AggregatedSnapshot {
    /// Number of closes available for a context resolution (0 when absent).
    #[must_use]
    pub fn context_len(&self, resolution: Resolution) -> usize {
        self.multi_interval_context
            .get(&resolution)
            .map_or(0, Vec::len)
    }

    /// True when the history was synthesized from the current price.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.history_source.is_none()
    }
}
