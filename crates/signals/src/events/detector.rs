//! Threshold-based event detection over a feature snapshot.

use super::news::categorize_news;
use market_pulse_core::{
    AggregatedSnapshot, Event, EventAnalysis, EventType, NewsFeed, Severity, UpstreamError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum |price_change_pct| (percent) for a spike event.
pub const PRICE_SPIKE_THRESHOLD: f64 = 0.5;
/// Minimum |5-minute change| (percent) for a second spike event.
pub const FIVE_MINUTE_SPIKE_THRESHOLD: f64 = PRICE_SPIKE_THRESHOLD * 1.5;
/// Volume multiple of its 20-bar average that counts as a surge.
pub const VOLUME_SURGE_THRESHOLD: f64 = 2.0;
/// Volume multiple below which liquidity is flagged as thin.
pub const VOLUME_DROP_THRESHOLD: f64 = 0.3;
pub const ORDER_BOOK_IMBALANCE_THRESHOLD: f64 = 0.3;
/// Bollinger bandwidth (percent) above which volatility is flagged.
pub const VOLATILITY_THRESHOLD: f64 = 5.0;
pub const HIGH_VOLATILITY_THRESHOLD: f64 = 10.0;
/// Volume ratio above which event confidence gets a boost.
pub const VOLUME_CONFIRMATION_RATIO: f64 = 1.5;

const DEFAULT_NEWS_TIMEOUT: Duration = Duration::from_secs(10);
const VOLUME_CONFIRMATION_BOOST: f64 = 0.1;
const VOLUME_DROP_CONFIDENCE: f64 = 0.7;
const VOLATILITY_CONFIDENCE: f64 = 0.8;

#[must_use]
pub fn price_spike_severity(pct_change: f64) -> Severity {
    if pct_change >= 2.0 {
        Severity::Critical
    } else if pct_change >= 1.5 {
        Severity::High
    } else if pct_change >= 1.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[must_use]
pub fn volume_surge_severity(ratio: f64) -> Severity {
    if ratio >= 5.0 {
        Severity::Critical
    } else if ratio >= 4.0 {
        Severity::High
    } else if ratio >= 3.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[must_use]
pub fn imbalance_severity(imbalance: f64) -> Severity {
    if imbalance >= 0.6 {
        Severity::Critical
    } else if imbalance >= 0.5 {
        Severity::High
    } else if imbalance >= 0.4 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Severity base confidence, plus 0.1 (capped at 1) when volume confirms the move.
#[must_use]
pub fn event_confidence(severity: Severity, volume_ratio: f64) -> f64 {
    let base = severity.base_confidence();
    if volume_ratio > VOLUME_CONFIRMATION_RATIO {
        (base + VOLUME_CONFIRMATION_BOOST).min(1.0)
    } else {
        base
    }
}

fn price_spikes(snapshot: &AggregatedSnapshot) -> Vec<Event> {
    let t = &snapshot.technical;
    let mut events = Vec::new();

    let pct = t.price_change_pct;
    if pct.abs() >= PRICE_SPIKE_THRESHOLD {
        let up = pct > 0.0;
        let severity = price_spike_severity(pct.abs());
        events.push(
            Event::new(
                if up {
                    EventType::PriceSpikeUp
                } else {
                    EventType::PriceSpikeDown
                },
                severity,
                snapshot.timestamp,
                format!(
                    "{} price spike of {:.2}%",
                    if up { "Upward" } else { "Downward" },
                    pct.abs()
                ),
            )
            .with_value(pct)
            .with_price_impact(pct * 0.5)
            .with_confidence(event_confidence(severity, t.volume_ratio)),
        );
    }

    if snapshot.close > 0.0 {
        let pct_5m = t.price_change_5m / snapshot.close * 100.0;
        if pct_5m.abs() >= FIVE_MINUTE_SPIKE_THRESHOLD {
            let up = pct_5m > 0.0;
            let severity = price_spike_severity(pct_5m.abs());
            events.push(
                Event::new(
                    if up {
                        EventType::PriceSpikeUp
                    } else {
                        EventType::PriceSpikeDown
                    },
                    severity,
                    snapshot.timestamp,
                    format!(
                        "5-minute {} of {:.2}%",
                        if up { "rally" } else { "drop" },
                        pct_5m.abs()
                    ),
                )
                .with_value(pct_5m)
                .with_price_impact(pct_5m * 0.3)
                .with_confidence(event_confidence(severity, t.volume_ratio)),
            );
        }
    }

    events
}

fn volume_anomalies(snapshot: &AggregatedSnapshot) -> Vec<Event> {
    let t = &snapshot.technical;
    let ratio = t.volume_ratio;
    let mut events = Vec::new();

    if ratio >= VOLUME_SURGE_THRESHOLD {
        let severity = volume_surge_severity(ratio);
        events.push(
            Event::new(
                EventType::VolumeSurge,
                severity,
                snapshot.timestamp,
                format!("Volume surge: {ratio:.1}x average"),
            )
            .with_value(ratio)
            .with_price_impact(((ratio - 1.0) * 0.5).min(2.0))
            .with_confidence(event_confidence(severity, ratio)),
        );
    }

    if ratio < VOLUME_DROP_THRESHOLD && t.volume_sma_20 > 0.0 {
        events.push(
            Event::new(
                EventType::VolumeDrop,
                Severity::Medium,
                snapshot.timestamp,
                format!("Low liquidity: {:.0}% of average volume", ratio * 100.0),
            )
            .with_value(ratio)
            .with_confidence(VOLUME_DROP_CONFIDENCE),
        );
    }

    events
}

fn order_book_imbalance(snapshot: &AggregatedSnapshot) -> Option<Event> {
    let imbalance = snapshot.technical.order_book_imbalance;
    if imbalance.abs() < ORDER_BOOK_IMBALANCE_THRESHOLD {
        return None;
    }

    let buy = imbalance > 0.0;
    let severity = imbalance_severity(imbalance.abs());
    Some(
        Event::new(
            if buy {
                EventType::OrderBookImbalanceBuy
            } else {
                EventType::OrderBookImbalanceSell
            },
            severity,
            snapshot.timestamp,
            format!(
                "Strong {} pressure: {:.0}% imbalance",
                if buy { "buy" } else { "sell" },
                imbalance.abs() * 100.0
            ),
        )
        .with_value(imbalance)
        .with_price_impact(imbalance * 1.5),
    )
}

fn volatility_surge(snapshot: &AggregatedSnapshot) -> Option<Event> {
    let bandwidth = snapshot.technical.bollinger_bandwidth;
    if bandwidth <= VOLATILITY_THRESHOLD {
        return None;
    }

    let severity = if bandwidth > HIGH_VOLATILITY_THRESHOLD {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(
        Event::new(
            EventType::VolatilitySurge,
            severity,
            snapshot.timestamp,
            format!("High volatility detected: {bandwidth:.1}% bandwidth"),
        )
        .with_value(bandwidth)
        .with_confidence(VOLATILITY_CONFIDENCE),
    )
}

/// Market-data events for a snapshot, in detection order: price, volume, book, volatility.
#[must_use]
pub fn detect_market_events(snapshot: &AggregatedSnapshot) -> Vec<Event> {
    let mut events = price_spikes(snapshot);
    events.extend(volume_anomalies(snapshot));
    events.extend(order_book_imbalance(snapshot));
    events.extend(volatility_surge(snapshot));
    events
}

/// Classifies a snapshot into discrete events, optionally enriched by a news feed.
pub struct EventDetector {
    news: Option<Arc<dyn NewsFeed>>,
    news_timeout: Duration,
}

impl Default for EventDetector {
    fn default() -> Self {
        Self {
            news: None,
            news_timeout: DEFAULT_NEWS_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for EventDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDetector")
            .field("news", &self.news.is_some())
            .field("news_timeout", &self.news_timeout)
            .finish()
    }
}

impl EventDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_news_feed(mut self, feed: Arc<dyn NewsFeed>) -> Self {
        self.news = Some(feed);
        self
    }

    /// Upper bound on the news feed call; a slower feed contributes no events.
    #[must_use]
    pub fn with_news_timeout(mut self, timeout: Duration) -> Self {
        self.news_timeout = timeout;
        self
    }

    /// Detects events for `snapshot`. Never fails: a news feed error only drops news events.
    pub async fn detect(&self, snapshot: &AggregatedSnapshot) -> EventAnalysis {
        let symbol = &snapshot.symbol;
        debug!("Detecting events for {}", symbol);

        let mut events = detect_market_events(snapshot);

        if let Some(feed) = &self.news {
            let limit = self.news_timeout;
            let news = tokio::time::timeout(limit, feed.recent_news(symbol))
                .await
                .unwrap_or_else(|_| Err(UpstreamError::Timeout(format!("no news within {limit:?}"))));
            match news {
                Ok(articles) => events.extend(articles.iter().filter_map(categorize_news)),
                Err(e) => warn!("News feed failed for {}: {}", symbol, e),
            }
        }

        let analysis = EventAnalysis::from_events(symbol.clone(), snapshot.timestamp, events);
        info!(
            "Detected {} events for {} ({} critical)",
            analysis.total_events, symbol, analysis.critical_events
        );
        analysis
    }
}
