//! Technical indicator math over close/high/low/volume series.
//!
//! Every function degrades gracefully on short input instead of failing, so a
//! freshly listed symbol or a synthesized flat series still yields a full
//! [`TechnicalFeatures`] record.

use market_pulse_core::{BarSeries, OrderBookSnapshot, TechnicalFeatures};

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Bollinger band levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// `(upper - lower) / middle * 100`.
    pub bandwidth: f64,
}

impl Bands {
    /// Zero-width bands at `middle`.
    const fn collapsed(middle: f64) -> Self {
        Self {
            upper: middle,
            middle,
            lower: middle,
            bandwidth: 0.0,
        }
    }
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// Simple moving average of the last `period` values.
///
/// With fewer than `period` values the last value is returned.
#[must_use]
pub fn sma(values: &[f64], period: usize) -> f64 {
    match values.last() {
        None => 0.0,
        Some(last) if values.len() < period => *last,
        Some(_) => mean(tail(values, period)),
    }
}

/// Exponential moving average seeded with the SMA of the first `period` values.
///
/// With fewer than `period` values the plain mean is returned.
#[must_use]
pub fn ema(values: &[f64], period: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if values.len() < period {
        return mean(values);
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    values[period..]
        .iter()
        .fold(mean(&values[..period]), |ema, v| (v - ema) * multiplier + ema)
}

/// Relative strength index over simple average gains and losses.
///
/// Returns 50 with fewer than `period + 1` closes or when price did not move at all,
/// and 100 when there were gains but no losses.
#[must_use]
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let (gains, losses) = tail(closes, period + 1)
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), change| {
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

/// MACD(12, 26) with a 9-period signal line computed over every MACD prefix value.
#[must_use]
pub fn macd(closes: &[f64]) -> Macd {
    let line = ema(closes, MACD_FAST) - ema(closes, MACD_SLOW);

    let history: Vec<f64> = (MACD_SLOW..=closes.len())
        .map(|end| {
            let prefix = &closes[..end];
            ema(prefix, MACD_FAST) - ema(prefix, MACD_SLOW)
        })
        .collect();

    let signal = ema(&history, MACD_SIGNAL);
    Macd {
        macd: line,
        signal,
        histogram: line - signal,
    }
}

/// Bollinger bands with population standard deviation.
///
/// With fewer than `period` closes every band equals the mean and bandwidth is 0.
/// The bands also collapse to the mean when the deviation is not representable.
#[must_use]
pub fn bollinger(closes: &[f64], period: usize, width: f64) -> Bands {
    if closes.len() < period {
        return Bands::collapsed(mean(closes));
    }

    let window = tail(closes, period);
    let middle = mean(window);
    let deviation = std_dev(window) * width;
    let upper = middle + deviation;
    let lower = middle - deviation;
    if !(upper.is_finite() && lower.is_finite()) {
        return Bands::collapsed(middle);
    }

    let bandwidth = if middle == 0.0 {
        0.0
    } else {
        (upper - lower) / middle * 100.0
    };
    let bandwidth = if bandwidth.is_finite() { bandwidth } else { 0.0 };

    Bands {
        upper,
        middle,
        lower,
        bandwidth,
    }
}

/// Mean of the last `period` true ranges. Returns 0 with fewer than `period + 1` bars.
#[must_use]
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let len = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || len < period + 1 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = (1..len)
        .map(|i| {
            let prev_close = closes[i - 1];
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect();

    mean(tail(&true_ranges, period))
}

/// Volume-weighted average of the typical price. Returns 0 when there is no volume.
#[must_use]
pub fn vwap(bars: &BarSeries) -> f64 {
    let (pv, v) = bars
        .as_slice()
        .iter()
        .fold((0.0, 0.0), |(pv, v), bar| {
            (pv + bar.typical_price() * bar.volume, v + bar.volume)
        });
    if v > 0.0 {
        pv / v
    } else {
        0.0
    }
}

/// Absolute change from the close `bars_back` bars ago to `price`, 0 if the series is too short.
fn change_over(closes: &[f64], price: f64, bars_back: usize) -> f64 {
    if closes.len() > bars_back {
        price - closes[closes.len() - 1 - bars_back]
    } else {
        0.0
    }
}

/// Computes the full feature record for `history` as seen at `price`.
///
/// Non-finite intermediate results are replaced with 0.
#[must_use]
pub fn compute_features(
    history: &BarSeries,
    price: f64,
    order_book: Option<&OrderBookSnapshot>,
) -> TechnicalFeatures {
    let closes = history.closes();
    let highs = history.highs();
    let lows = history.lows();
    let volumes = history.volumes();

    let macd = macd(&closes);
    let bands = bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_STD_DEV);

    let volume = history.last().volume;
    let volume_sma_20 = sma(&volumes, 20);
    let volume_ratio = if volume_sma_20 > 0.0 {
        volume / volume_sma_20
    } else {
        1.0
    };

    let first_close = history.first().close;
    let price_change_pct = if first_close > 0.0 {
        (price - first_close) / first_close * 100.0
    } else {
        0.0
    };

    let max_high = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_low = lows.iter().copied().fold(f64::INFINITY, f64::min);

    TechnicalFeatures {
        sma_5: sma(&closes, 5),
        sma_10: sma(&closes, 10),
        sma_20: sma(&closes, 20),
        ema_5: ema(&closes, 5),
        ema_10: ema(&closes, 10),
        ema_20: ema(&closes, 20),
        rsi_14: rsi(&closes, RSI_PERIOD),
        macd: macd.macd,
        macd_signal: macd.signal,
        macd_histogram: macd.histogram,
        bollinger_upper: bands.upper,
        bollinger_middle: bands.middle,
        bollinger_lower: bands.lower,
        bollinger_bandwidth: bands.bandwidth,
        atr_14: atr(&highs, &lows, &closes, ATR_PERIOD),
        volume,
        volume_sma_20,
        volume_ratio,
        vwap: vwap(history),
        bid_ask_spread: order_book.map_or(0.0, OrderBookSnapshot::spread),
        order_book_imbalance: order_book.map_or(0.0, OrderBookSnapshot::imbalance),
        price_change_1m: change_over(&closes, price, 1),
        price_change_5m: change_over(&closes, price, 5),
        price_change_15m: change_over(&closes, price, 15),
        price_change_pct,
        high_low_range: max_high - min_low,
    }
    .sanitized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use market_pulse_core::{Bar, PriceLevel};

    const EPS: f64 = 1e-9;

    fn series(closes: &[f64]) -> BarSeries {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                timestamp: start + Duration::minutes(i as i64),
                open: *c,
                high: c + 0.5,
                low: c - 0.5,
                close: *c,
                volume: 100.0,
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    // ==================== Moving Average Tests ====================

    #[test]
    fn test_sma_short_series_returns_last() {
        assert!((sma(&[1.0, 2.0, 3.0], 5) - 3.0).abs() < EPS);
        assert!((sma(&[1.0, 2.0, 3.0, 4.0], 2) - 3.5).abs() < EPS);
        assert_eq!(sma(&[], 5), 0.0);
    }

    #[test]
    fn test_ema_short_series_returns_mean() {
        assert!((ema(&[1.0, 2.0, 3.0], 5) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_ema_seeds_with_sma() {
        // seed = mean(1,2,3) = 2, multiplier = 0.5, next = (4 - 2) * 0.5 + 2 = 3
        assert!((ema(&[1.0, 2.0, 3.0, 4.0], 3) - 3.0).abs() < EPS);
    }

    // ==================== RSI Tests ====================

    #[test]
    fn test_rsi_insufficient_data_is_neutral() {
        assert!((rsi(&ramp(14), 14) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        assert!((rsi(&[100.0; 30], 14) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_rsi_only_gains_is_100() {
        assert!((rsi(&ramp(30), 14) - 100.0).abs() < EPS);
    }

    #[test]
    fn test_rsi_only_losses_is_0() {
        let falling: Vec<f64> = ramp(30).into_iter().rev().collect();
        assert!(rsi(&falling, 14).abs() < EPS);
    }

    #[test]
    fn test_rsi_balanced() {
        // Alternating +1 / -1 changes: equal average gain and loss
        let closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        assert!((rsi(&closes, 14) - 50.0).abs() < EPS);
    }

    // ==================== MACD Tests ====================

    #[test]
    fn test_macd_flat_is_zero() {
        let m = macd(&[50.0; 40]);
        assert!(m.macd.abs() < EPS);
        assert!(m.signal.abs() < EPS);
        assert!(m.histogram.abs() < EPS);
    }

    #[test]
    fn test_macd_rising_is_positive() {
        let m = macd(&ramp(60));
        assert!(m.macd > 0.0);
        assert!((m.histogram - (m.macd - m.signal)).abs() < EPS);
    }

    #[test]
    fn test_macd_short_series_has_zero_signal() {
        // Fewer than 26 closes: no MACD history, signal degrades to 0
        let m = macd(&ramp(10));
        assert_eq!(m.signal, 0.0);
        assert!((m.histogram - m.macd).abs() < EPS);
    }

    // ==================== Bollinger Tests ====================

    #[test]
    fn test_bollinger_short_series_collapses_to_mean() {
        let b = bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!((b.middle - 2.0).abs() < EPS);
        assert!((b.upper - 2.0).abs() < EPS);
        assert!((b.lower - 2.0).abs() < EPS);
        assert_eq!(b.bandwidth, 0.0);
    }

    #[test]
    fn test_bollinger_ordering() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let b = bollinger(&closes, 20, 2.0);
        assert!(b.lower <= b.middle && b.middle <= b.upper);
        assert!(b.bandwidth > 0.0);
    }

    #[test]
    fn test_bollinger_zero_mean_has_zero_bandwidth() {
        let b = bollinger(&[0.0; 25], 20, 2.0);
        assert_eq!(b.bandwidth, 0.0);
    }

    #[test]
    fn test_bollinger_overflowing_deviation_collapses_to_mean() {
        let closes: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1e200 } else { 3e200 }).collect();
        let b = bollinger(&closes, 20, 2.0);

        assert!(((b.middle - 2e200) / 2e200).abs() < 1e-12);
        assert_eq!(b.upper, b.middle);
        assert_eq!(b.lower, b.middle);
        assert_eq!(b.bandwidth, 0.0);
    }

    #[test]
    fn test_compute_features_keeps_band_ordering_on_huge_prices() {
        let closes: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1e200 } else { 3e200 }).collect();
        let f = compute_features(&series(&closes), 2e200, None);

        assert!(f.is_finite());
        assert!(f.bollinger_lower <= f.bollinger_middle);
        assert!(f.bollinger_middle <= f.bollinger_upper);
        assert!(f.bollinger_middle > 0.0);
    }

    // ==================== ATR / VWAP Tests ====================

    #[test]
    fn test_atr_needs_period_plus_one() {
        let closes = ramp(14);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        assert_eq!(atr(&highs, &lows, &closes, 14), 0.0);
    }

    #[test]
    fn test_atr_constant_range() {
        let closes = [100.0; 20];
        let highs = [101.0; 20];
        let lows = [99.0; 20];
        assert!((atr(&highs, &lows, &closes, 14) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_vwap_without_volume_is_zero() {
        let flat = BarSeries::flat(10.0, 5, Utc::now(), Duration::minutes(1));
        assert_eq!(vwap(&flat), 0.0);
    }

    #[test]
    fn test_vwap_uses_typical_price() {
        let s = series(&[100.0, 102.0]);
        // typical price equals close because high/low are symmetric around it
        assert!((vwap(&s) - 101.0).abs() < EPS);
    }

    // ==================== Feature Record Tests ====================

    #[test]
    fn test_compute_features_flat_series() {
        let flat = BarSeries::flat(50.0, 20, Utc::now(), Duration::minutes(1));
        let f = compute_features(&flat, 50.0, None);

        assert!((f.sma_20 - 50.0).abs() < EPS);
        assert!((f.rsi_14 - 50.0).abs() < EPS);
        assert_eq!(f.macd_histogram, 0.0);
        assert_eq!(f.bollinger_bandwidth, 0.0);
        assert_eq!(f.atr_14, 0.0);
        assert!((f.volume_ratio - 1.0).abs() < EPS);
        assert_eq!(f.vwap, 0.0);
        assert_eq!(f.price_change_pct, 0.0);
        assert_eq!(f.high_low_range, 0.0);
        assert!(f.is_finite());
    }

    #[test]
    fn test_compute_features_price_changes() {
        let s = series(&ramp(20));
        let f = compute_features(&s, 120.0, None);

        // closes 100..=119: one bar back is 118, five back 114, fifteen back 104
        assert!((f.price_change_1m - 2.0).abs() < EPS);
        assert!((f.price_change_5m - 6.0).abs() < EPS);
        assert!((f.price_change_15m - 16.0).abs() < EPS);
        assert!((f.price_change_pct - 20.0).abs() < EPS);
    }

    #[test]
    fn test_compute_features_order_book() {
        let book = OrderBookSnapshot {
            bids: vec![PriceLevel { price: 99.9, size: 300.0 }],
            asks: vec![PriceLevel { price: 100.1, size: 100.0 }],
        };
        let f = compute_features(&series(&[100.0; 5]), 100.0, Some(&book));
        assert!((f.bid_ask_spread - 0.2).abs() < 1e-6);
        assert!((f.order_book_imbalance - 0.5).abs() < EPS);
    }
}
