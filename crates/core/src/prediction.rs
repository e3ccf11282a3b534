//! Prediction output types.
//!
//! A [`Prediction`] is the terminal product of one pipeline run. It is computed once,
//! returned inside a [`PredictionReport`] and never persisted.

use crate::bar::Interval;
use crate::event::EventAnalysis;
use crate::features::AggregatedSnapshot;
use crate::insight::Insight;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forecast direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Price expected to rise
    Up,
    /// Price expected to fall
    Down,
    /// No directional bias
    Sideways,
}

impl Direction {
    /// Classifies a direction score against a symmetric threshold.
    #[must_use]
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Self::Up
        } else if score < -threshold {
            Self::Down
        } else {
            Self::Sideways
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Sideways => Self::Sideways,
        }
    }

    /// Returns true if this direction has a directional bias.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::Sideways)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Sideways => "SIDEWAYS",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional forecast with price levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: Direction,
    /// Confidence in percent, always within the policy floor and ceiling.
    pub confidence: f64,
    /// Expected change in percent.
    pub expected_change: f64,
    pub current_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Weighted factor sum before thresholding.
    pub direction_score: f64,
    pub factors: FactorScores,
}

impl Prediction {
    /// `|take_profit - price| / |price - stop_loss|`, 0 when the stop distance is 0.
    #[must_use]
    pub fn risk_reward_ratio(&self) -> f64 {
        let risk = (self.current_price - self.stop_loss).abs();
        if risk > 0.0 {
            (self.take_profit - self.current_price).abs() / risk
        } else {
            0.0
        }
    }
}

/// The four factor scores the direction score is built from, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub sentiment: f64,
    pub event_bias: f64,
    pub technical: f64,
    pub momentum: f64,
}

/// Human-readable account of how a prediction was reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub reasoning: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
}

/// Coverage and trust of the inputs behind a prediction, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub completeness: f64,
    pub reliability: f64,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub symbol: String,
    pub interval: Interval,
    pub generated_at: DateTime<Utc>,
    pub snapshot: AggregatedSnapshot,
    pub events: EventAnalysis,
    pub insight: Insight,
    pub prediction: Prediction,
    pub explanation: Explanation,
    pub data_quality: DataQuality,
    pub policy_version: String,
    pub processing_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(price: f64, stop: f64, take: f64) -> Prediction {
        Prediction {
            direction: Direction::Up,
            confidence: 60.0,
            expected_change: 1.0,
            current_price: price,
            target_price: price * 1.01,
            stop_loss: stop,
            take_profit: take,
            direction_score: 0.3,
            factors: FactorScores::default(),
        }
    }

    #[test]
    fn test_direction_from_score() {
        assert_eq!(Direction::from_score(0.21, 0.2), Direction::Up);
        assert_eq!(Direction::from_score(0.2, 0.2), Direction::Sideways);
        assert_eq!(Direction::from_score(-0.2, 0.2), Direction::Sideways);
        assert_eq!(Direction::from_score(-0.21, 0.2), Direction::Down);
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Sideways.opposite(), Direction::Sideways);
        assert!(!Direction::Sideways.is_directional());
    }

    #[test]
    fn test_risk_reward_ratio() {
        let p = prediction(100.0, 98.0, 106.0);
        assert!((p.risk_reward_ratio() - 3.0).abs() < 1e-12);

        let short = prediction(100.0, 102.0, 97.0);
        assert!((short.risk_reward_ratio() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_risk_reward_ratio_zero_risk() {
        let p = prediction(100.0, 100.0, 105.0);
        assert_eq!(p.risk_reward_ratio(), 0.0);
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&Direction::Sideways).unwrap(), "\"SIDEWAYS\"");
    }
}
