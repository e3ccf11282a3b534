//! Sentiment and price-context insight produced per request.

use crate::bar::Resolution;
use crate::event::{EventType, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative bucket for a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    VeryBearish,
    Bearish,
    Neutral,
    Bullish,
    VeryBullish,
}

impl SentimentLabel {
    /// Buckets a score in [-1, 1]: beyond ±0.5 is "very", beyond ±0.15 is directional.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            Self::VeryBullish
        } else if score > 0.15 {
            Self::Bullish
        } else if score < -0.5 {
            Self::VeryBearish
        } else if score < -0.15 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryBearish => "VERY_BEARISH",
            Self::Bearish => "BEARISH",
            Self::Neutral => "NEUTRAL",
            Self::Bullish => "BULLISH",
            Self::VeryBullish => "VERY_BULLISH",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Directional bias in [-1, 1].
    pub score: f64,
    /// Strength in [0, 1].
    pub magnitude: f64,
    pub label: SentimentLabel,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    StrongUp,
    Up,
    Sideways,
    Down,
    StrongDown,
}

impl Trend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongUp => "STRONG_UP",
            Self::Up => "UP",
            Self::Sideways => "SIDEWAYS",
            Self::Down => "DOWN",
            Self::StrongDown => "STRONG_DOWN",
        }
    }

    /// Lower-case words, e.g. "strong up".
    #[must_use]
    pub fn describe(self) -> String {
        self.as_str().replace('_', " ").to_lowercase()
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRisk {
    Low,
    Medium,
    High,
}

impl VolatilityRisk {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for VolatilityRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unusual pattern worth flagging to the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// Severity in [0, 1].
    pub severity: f64,
}

/// Expected impact window of one detected event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOutlook {
    pub event_type: EventType,
    pub severity: Severity,
    pub price_impact: f64,
    pub time_horizon: Resolution,
    pub confidence: f64,
    pub explanation: String,
}

/// Which path produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightSource {
    LanguageModel,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub sentiment: Sentiment,
    pub trend: Trend,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub volatility_risk: VolatilityRisk,
    pub key_factors: Vec<String>,
    pub anomalies: Vec<Anomaly>,
    pub summary: String,
    pub event_outlook: Vec<EventOutlook>,
    pub source: InsightSource,
}
