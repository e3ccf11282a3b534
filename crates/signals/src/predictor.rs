//! Prediction engine.
//!
//! Combines the four factor scores (sentiment, event bias, technical, momentum) into a
//! direction score under a [`ScoringPolicy`], then derives confidence, expected change
//! and price levels. Pure and deterministic: identical inputs give identical output.

use market_pulse_core::{
    AggregatedSnapshot, Direction, EventAnalysis, FactorScores, Insight, Prediction,
    ScoringPolicy, TechnicalFeatures, Trend, VolatilityRisk,
};
use tracing::debug;

/// Factor scores below this magnitude count as having no sign.
const SIGN_EPSILON: f64 = 1e-9;

/// Technical factor in [-1, 1] from RSI, MACD histogram, SMA(20) deviation and
/// Bollinger band position.
#[must_use]
pub fn technical_score(snapshot: &AggregatedSnapshot) -> f64 {
    let t = &snapshot.technical;
    let mut score = 0.0;

    score += if t.rsi_14 > 70.0 {
        -0.3
    } else if t.rsi_14 < 30.0 {
        0.3
    } else {
        (t.rsi_14 - 50.0) / 100.0
    };

    score += (t.macd_histogram * 100.0).clamp(-0.3, 0.3);
    score += (t.sma20_deviation(snapshot.close) * 5.0).clamp(-0.3, 0.3);

    // mean reversion near the bands
    let position = t.bollinger_position(snapshot.close);
    if position > 0.8 {
        score -= 0.2;
    } else if position < 0.2 {
        score += 0.2;
    }

    score.clamp(-1.0, 1.0)
}

/// Momentum factor in [-1, 1] from short-term price change, volume confirmation and
/// order-book pressure.
#[must_use]
pub fn momentum_score(t: &TechnicalFeatures) -> f64 {
    let mut score = (t.price_change_pct / 5.0).clamp(-0.4, 0.4);

    if t.volume_ratio > 1.5 {
        score *= 1.2;
    } else if t.volume_ratio < 0.5 {
        score *= 0.8;
    }

    score += t.order_book_imbalance * 0.3;
    score.clamp(-1.0, 1.0)
}

fn agrees(factor: f64, score: f64) -> bool {
    factor.abs() > SIGN_EPSILON && score.abs() > SIGN_EPSILON && factor.signum() == score.signum()
}

/// Scores a snapshot into a [`Prediction`].
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    policy: ScoringPolicy,
}

impl PredictionEngine {
    #[must_use]
    pub const fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Produces the directional forecast for one snapshot.
    #[must_use]
    pub fn predict(
        &self,
        snapshot: &AggregatedSnapshot,
        events: &EventAnalysis,
        insight: &Insight,
    ) -> Prediction {
        let policy = &self.policy;
        let w = &policy.weights;

        let factors = FactorScores {
            sentiment: insight.sentiment.score.clamp(-1.0, 1.0),
            event_bias: events.bias(),
            technical: technical_score(snapshot),
            momentum: momentum_score(&snapshot.technical),
        };

        let score = w.sentiment * factors.sentiment
            + w.events * factors.event_bias
            + w.technical * factors.technical
            + w.momentum * factors.momentum;
        let direction = Direction::from_score(score, policy.direction_threshold);

        let confidence = self.confidence(score, &factors, events, insight);
        let (expected_change, target_price) = self.expected_move(snapshot, score);
        let (stop_loss, take_profit) =
            self.price_levels(snapshot, direction, score, expected_change);

        debug!(
            "{} factors: sentiment={:.3} events={:.3} technical={:.3} momentum={:.3} -> score={:.3}",
            snapshot.symbol,
            factors.sentiment,
            factors.event_bias,
            factors.technical,
            factors.momentum,
            score
        );

        Prediction {
            direction,
            confidence,
            expected_change,
            current_price: snapshot.close,
            target_price,
            stop_loss,
            take_profit,
            direction_score: score,
            factors,
        }
    }

    /// Confidence within the policy bounds. The clamp is always the last step.
    fn confidence(
        &self,
        score: f64,
        factors: &FactorScores,
        events: &EventAnalysis,
        insight: &Insight,
    ) -> f64 {
        self.policy
            .clamp_confidence(self.raw_confidence(score, factors, events, insight))
    }

    /// Each factor adds `weight * reliability` when it points the same way as the
    /// direction score; adjustments then multiply the base.
    fn raw_confidence(
        &self,
        score: f64,
        factors: &FactorScores,
        events: &EventAnalysis,
        insight: &Insight,
    ) -> f64 {
        let policy = &self.policy;
        let w = &policy.weights;

        let contributions = [
            (factors.sentiment, w.sentiment, insight.sentiment.confidence.clamp(0.0, 1.0)),
            (factors.event_bias, w.events, events.mean_confidence()),
            (factors.technical, w.technical, policy.technical_reliability),
            (factors.momentum, w.momentum, policy.momentum_reliability),
        ];
        let base: f64 = contributions
            .iter()
            .filter(|(factor, _, _)| agrees(*factor, score))
            .map(|(_, weight, reliability)| weight * reliability)
            .sum::<f64>()
            * 100.0;

        let mut adjustment = 1.0;

        let narrative = (factors.sentiment + factors.event_bias) / 2.0;
        if (factors.technical - narrative).abs() > policy.mixed_signal_gap {
            adjustment *= policy.mixed_signal_multiplier;
        }

        if insight.volatility_risk == VolatilityRisk::High {
            adjustment *= policy.high_volatility_multiplier;
        }

        if score.abs() > policy.strong_score_threshold && insight.trend != Trend::Sideways {
            adjustment *= policy.aligned_multiplier;
        }

        base * adjustment
    }

    /// Expected change in percent, scaled up by relative ATR, and the implied target.
    fn expected_move(&self, snapshot: &AggregatedSnapshot, score: f64) -> (f64, f64) {
        let policy = &self.policy;
        let relative_atr = if snapshot.close > 0.0 {
            snapshot.technical.atr_14 / snapshot.close
        } else {
            0.0
        };

        let raw = score
            * policy.base_change_scale
            * (1.0 + policy.atr_volatility_multiplier * relative_atr);
        let expected_change = raw.clamp(-policy.max_expected_change, policy.max_expected_change);
        let target_price = snapshot.close * (1.0 + expected_change / 100.0);

        (expected_change, target_price)
    }

    /// Stop behind and take-profit ahead of the trade. SIDEWAYS follows the sign of the score.
    fn price_levels(
        &self,
        snapshot: &AggregatedSnapshot,
        direction: Direction,
        score: f64,
        expected_change: f64,
    ) -> (f64, f64) {
        let policy = &self.policy;
        let close = snapshot.close;
        let atr = snapshot.technical.atr_14;

        let stop_distance =
            (policy.stop_atr_multiple * atr).max(policy.min_stop_pct / 100.0 * close);
        let take_profit_distance = (policy.take_profit_change_multiple
            * (expected_change / 100.0 * close).abs())
        .max(policy.take_profit_atr_multiple * atr);

        let long = match direction {
            Direction::Up => true,
            Direction::Down => false,
            Direction::Sideways => score >= 0.0,
        };

        if long {
            (close - stop_distance, close + take_profit_distance)
        } else {
            (close + stop_distance, close - take_profit_distance)
        }
    }
}
