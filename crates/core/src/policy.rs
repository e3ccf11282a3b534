//! Versioned scoring policy.
//!
//! Every weight and threshold the prediction engine uses to turn factor scores into a
//! direction, confidence and price levels lives here, so a policy can be swapped or tuned
//! without touching orchestration code.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Identifier of the built-in policy.
pub const DEFAULT_POLICY_VERSION: &str = "multi-modal-v1";

/// Hard confidence bounds. A policy may narrow them but never widen them.
pub const MIN_CONFIDENCE: f64 = 40.0;
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Weight of each factor in the direction score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub sentiment: f64,
    pub events: f64,
    pub technical: f64,
    pub momentum: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            sentiment: 0.30,
            events: 0.25,
            technical: 0.25,
            momentum: 0.20,
        }
    }
}

impl FactorWeights {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.sentiment + self.events + self.technical + self.momentum
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub version: String,
    pub weights: FactorWeights,

    /// `|score|` above this is UP or DOWN.
    pub direction_threshold: f64,

    pub confidence_floor: f64,
    pub confidence_ceiling: f64,

    /// Reliability assumed for the technical factor (sentiment and events carry their own).
    pub technical_reliability: f64,
    pub momentum_reliability: f64,

    /// Technical vs. sentiment/event gap beyond which signals count as mixed.
    pub mixed_signal_gap: f64,
    pub mixed_signal_multiplier: f64,
    pub high_volatility_multiplier: f64,
    /// `|score|` above which an aligned, trending setup earns the boost.
    pub strong_score_threshold: f64,
    pub aligned_multiplier: f64,

    /// Percent change per unit of direction score before volatility scaling.
    pub base_change_scale: f64,
    /// Multiplier on `ATR / close` when scaling expected change.
    pub atr_volatility_multiplier: f64,
    /// Cap on `|expected_change|` in percent.
    pub max_expected_change: f64,

    pub stop_atr_multiple: f64,
    /// Minimum stop distance in percent of price.
    pub min_stop_pct: f64,
    pub take_profit_atr_multiple: f64,
    pub take_profit_change_multiple: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            weights: FactorWeights::default(),
            direction_threshold: 0.2,
            confidence_floor: MIN_CONFIDENCE,
            confidence_ceiling: MAX_CONFIDENCE,
            technical_reliability: 0.8,
            momentum_reliability: 0.7,
            mixed_signal_gap: 0.5,
            mixed_signal_multiplier: 0.8,
            high_volatility_multiplier: 0.85,
            strong_score_threshold: 0.5,
            aligned_multiplier: 1.1,
            base_change_scale: 2.0,
            atr_volatility_multiplier: 10.0,
            max_expected_change: 5.0,
            stop_atr_multiple: 2.0,
            min_stop_pct: 1.0,
            take_profit_atr_multiple: 3.0,
            take_profit_change_multiple: 2.0,
        }
    }
}

impl ScoringPolicy {
    /// Sets the factor weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: FactorWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the confidence bounds.
    #[must_use]
    pub const fn with_confidence_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.confidence_floor = floor;
        self.confidence_ceiling = ceiling;
        self
    }

    /// Clamps a raw confidence into the policy bounds, themselves held inside
    /// [`MIN_CONFIDENCE`, `MAX_CONFIDENCE`] even when the policy was never validated.
    #[must_use]
    pub fn clamp_confidence(&self, raw: f64) -> f64 {
        let floor = self.confidence_floor.max(MIN_CONFIDENCE).min(MAX_CONFIDENCE);
        let ceiling = self.confidence_ceiling.min(MAX_CONFIDENCE).max(floor);
        if raw.is_nan() {
            return floor;
        }
        raw.clamp(floor, ceiling)
    }

    /// Checks that every parameter is finite and non-negative and the bounds are ordered.
    ///
    /// # Errors
    /// Returns error describing the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            anyhow::bail!("policy version must not be empty");
        }

        let params = [
            ("weights.sentiment", self.weights.sentiment),
            ("weights.events", self.weights.events),
            ("weights.technical", self.weights.technical),
            ("weights.momentum", self.weights.momentum),
            ("direction_threshold", self.direction_threshold),
            ("confidence_floor", self.confidence_floor),
            ("confidence_ceiling", self.confidence_ceiling),
            ("technical_reliability", self.technical_reliability),
            ("momentum_reliability", self.momentum_reliability),
            ("mixed_signal_gap", self.mixed_signal_gap),
            ("mixed_signal_multiplier", self.mixed_signal_multiplier),
            ("high_volatility_multiplier", self.high_volatility_multiplier),
            ("strong_score_threshold", self.strong_score_threshold),
            ("aligned_multiplier", self.aligned_multiplier),
            ("base_change_scale", self.base_change_scale),
            ("atr_volatility_multiplier", self.atr_volatility_multiplier),
            ("max_expected_change", self.max_expected_change),
            ("stop_atr_multiple", self.stop_atr_multiple),
            ("min_stop_pct", self.min_stop_pct),
            ("take_profit_atr_multiple", self.take_profit_atr_multiple),
            ("take_profit_change_multiple", self.take_profit_change_multiple),
        ];
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{name} must be finite and non-negative, got {value}");
            }
        }

        if self.weights.total() <= 0.0 {
            anyhow::bail!("factor weights must not all be zero");
        }
        if self.confidence_floor > self.confidence_ceiling {
            anyhow::bail!(
                "confidence_floor {} exceeds confidence_ceiling {}",
                self.confidence_floor,
                self.confidence_ceiling
            );
        }
        if self.confidence_floor < MIN_CONFIDENCE {
            anyhow::bail!(
                "confidence_floor must be at least {MIN_CONFIDENCE}, got {}",
                self.confidence_floor
            );
        }
        if self.confidence_ceiling > MAX_CONFIDENCE {
            anyhow::bail!(
                "confidence_ceiling must be at most {MAX_CONFIDENCE}, got {}",
                self.confidence_ceiling
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = ScoringPolicy::default();
        assert!(policy.validate().is_ok());
        assert!((policy.weights.total() - 1.0).abs() < 1e-12);
        assert_eq!(policy.version, DEFAULT_POLICY_VERSION);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let policy = ScoringPolicy::default().with_weights(FactorWeights {
            sentiment: -0.1,
            ..FactorWeights::default()
        });
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("weights.sentiment"));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut policy = ScoringPolicy::default();
        policy.max_expected_change = f64::NAN;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let policy = ScoringPolicy::default().with_confidence_bounds(90.0, 50.0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rejects_bounds_outside_hard_limits() {
        let err = ScoringPolicy::default()
            .with_confidence_bounds(30.0, 95.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("confidence_floor"));

        let err = ScoringPolicy::default()
            .with_confidence_bounds(40.0, 99.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("confidence_ceiling"));

        assert!(ScoringPolicy::default()
            .with_confidence_bounds(50.0, 90.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_unvalidated_wide_bounds_still_clamp_to_hard_limits() {
        let policy = ScoringPolicy::default().with_confidence_bounds(0.0, 100.0);
        assert!((policy.clamp_confidence(10.0) - 40.0).abs() < f64::EPSILON);
        assert!((policy.clamp_confidence(99.0) - 95.0).abs() < f64::EPSILON);

        let narrow = ScoringPolicy::default().with_confidence_bounds(50.0, 90.0);
        assert!((narrow.clamp_confidence(45.0) - 50.0).abs() < f64::EPSILON);
        assert!((narrow.clamp_confidence(92.0) - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_confidence() {
        let policy = ScoringPolicy::default();
        assert!((policy.clamp_confidence(10.0) - 40.0).abs() < f64::EPSILON);
        assert!((policy.clamp_confidence(120.0) - 95.0).abs() < f64::EPSILON);
        assert!((policy.clamp_confidence(61.5) - 61.5).abs() < f64::EPSILON);
        assert!((policy.clamp_confidence(f64::NAN) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let policy: ScoringPolicy =
            serde_json::from_str(r#"{"version":"tuned","weights":{"momentum":0.1}}"#).unwrap();
        assert_eq!(policy.version, "tuned");
        assert!((policy.weights.momentum - 0.1).abs() < f64::EPSILON);
        assert!((policy.weights.sentiment - 0.30).abs() < f64::EPSILON);
        assert!((policy.confidence_ceiling - 95.0).abs() < f64::EPSILON);
    }
}
