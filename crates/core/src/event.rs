//! Discrete market events and their aggregated directional bias.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of detectable event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PriceSpikeUp,
    PriceSpikeDown,
    VolumeSurge,
    VolumeDrop,
    OrderBookImbalanceBuy,
    OrderBookImbalanceSell,
    NewsPositive,
    NewsNegative,
    NewsNeutral,
    VolatilitySurge,
}

/// Which bias bucket an event feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Bullish,
    Bearish,
    Neutral,
}

impl EventType {
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::PriceSpikeUp | Self::OrderBookImbalanceBuy | Self::NewsPositive => {
                Polarity::Bullish
            }
            Self::PriceSpikeDown | Self::OrderBookImbalanceSell | Self::NewsNegative => {
                Polarity::Bearish
            }
            Self::VolumeSurge | Self::VolumeDrop | Self::NewsNeutral | Self::VolatilitySurge => {
                Polarity::Neutral
            }
        }
    }

    #[must_use]
    pub const fn is_news(self) -> bool {
        matches!(
            self,
            Self::NewsPositive | Self::NewsNegative | Self::NewsNeutral
        )
    }

    #[must_use]
    pub const fn is_flow(self) -> bool {
        matches!(
            self,
            Self::VolumeSurge
                | Self::VolumeDrop
                | Self::OrderBookImbalanceBuy
                | Self::OrderBookImbalanceSell
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceSpikeUp => "PRICE_SPIKE_UP",
            Self::PriceSpikeDown => "PRICE_SPIKE_DOWN",
            Self::VolumeSurge => "VOLUME_SURGE",
            Self::VolumeDrop => "VOLUME_DROP",
            Self::OrderBookImbalanceBuy => "ORDER_BOOK_IMBALANCE_BUY",
            Self::OrderBookImbalanceSell => "ORDER_BOOK_IMBALANCE_SELL",
            Self::NewsPositive => "NEWS_POSITIVE",
            Self::NewsNegative => "NEWS_NEGATIVE",
            Self::NewsNeutral => "NEWS_NEUTRAL",
            Self::VolatilitySurge => "VOLATILITY_SURGE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal rank used to weight event influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric weight 1..=4.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
            Self::Critical => 4.0,
        }
    }

    /// Confidence before any volume boost.
    #[must_use]
    pub const fn base_confidence(self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 0.7,
            Self::High => 0.85,
            Self::Critical => 0.95,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified anomaly found in market data or news.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Magnitude of the triggering measurement.
    pub value: f64,
    /// Expected price impact in percent.
    pub price_impact: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(
        event_type: EventType,
        severity: Severity,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            severity,
            timestamp,
            description: description.into(),
            value: 0.0,
            price_impact: 0.0,
            confidence: severity.base_confidence(),
            headline: None,
            source: None,
            url: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_price_impact(mut self, price_impact: f64) -> Self {
        self.price_impact = price_impact;
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Attaches article provenance for news events.
    #[must_use]
    pub fn with_article(
        mut self,
        headline: impl Into<String>,
        source: Option<String>,
        url: Option<String>,
    ) -> Self {
        self.headline = Some(headline.into());
        self.source = source;
        self.url = url;
        self
    }
}

/// A news item returned by a news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    pub source: Option<String>,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Events found for one snapshot plus their summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub events: Vec<Event>,
    pub total_events: usize,
    pub critical_events: usize,
    /// Mean severity weight (1..=4), 0 with no events.
    pub average_severity: f64,
    /// The three bias scores sum to 100 when any events exist, else all 0.
    pub bullish_score: f64,
    pub bearish_score: f64,
    pub neutral_score: f64,
}

impl EventAnalysis {
    /// Summarises `events`, weighting each by `severity.weight() * confidence`.
    #[must_use]
    pub fn from_events(symbol: impl Into<String>, timestamp: DateTime<Utc>, events: Vec<Event>) -> Self {
        let total_events = events.len();
        let critical_events = events
            .iter()
            .filter(|e| e.severity == Severity::Critical)
            .count();
        let average_severity = if events.is_empty() {
            0.0
        } else {
            events.iter().map(|e| e.severity.weight()).sum::<f64>() / total_events as f64
        };

        let (mut bullish, mut bearish, mut neutral) = (0.0, 0.0, 0.0);
        for event in &events {
            let weight = event.severity.weight() * event.confidence;
            match event.event_type.polarity() {
                Polarity::Bullish => bullish += weight,
                Polarity::Bearish => bearish += weight,
                Polarity::Neutral => neutral += weight,
            }
        }

        let total = bullish + bearish + neutral;
        if total > 0.0 {
            bullish = bullish / total * 100.0;
            bearish = bearish / total * 100.0;
            neutral = neutral / total * 100.0;
        }

        Self {
            symbol: symbol.into(),
            timestamp,
            events,
            total_events,
            critical_events,
            average_severity,
            bullish_score: bullish,
            bearish_score: bearish,
            neutral_score: neutral,
        }
    }

    /// An analysis with no events.
    #[must_use]
    pub fn empty(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::from_events(symbol, timestamp, Vec::new())
    }

    /// Net directional bias in [-1, 1].
    #[must_use]
    pub fn bias(&self) -> f64 {
        (self.bullish_score - self.bearish_score) / 100.0
    }

    /// Mean confidence across events, 0 with no events.
    #[must_use]
    pub fn mean_confidence(&self) -> f64 {
        if self.events.is_empty() {
            0.0
        } else {
            self.events.iter().map(|e| e.confidence).sum::<f64>() / self.events.len() as f64
        }
    }
}
