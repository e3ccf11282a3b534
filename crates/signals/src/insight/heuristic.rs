//! Deterministic insight computed from indicators and events alone.
//!
//! Used whenever no language model is configured or its answer cannot be used.

use market_pulse_core::{
    AggregatedSnapshot, Anomaly, Event, EventAnalysis, EventOutlook, Insight, InsightSource,
    Resolution, Sentiment, SentimentLabel, Severity, TechnicalFeatures, Trend, VolatilityRisk,
};

pub const OVERBOUGHT_RSI: f64 = 70.0;
pub const OVERSOLD_RSI: f64 = 30.0;
const STRONG_UP_RSI: f64 = 55.0;
const STRONG_DOWN_RSI: f64 = 45.0;

const RSI_CONTRIBUTION: f64 = 0.3;
const MACD_CONTRIBUTION: f64 = 0.2;
const SMA_DEVIATION_SCALE: f64 = 2.0;
const SMA_DEVIATION_CAP: f64 = 0.3;
const EVENT_BIAS_SCALE: f64 = 0.3;

/// Bandwidth (percent) above which volatility risk is HIGH.
pub const HIGH_VOLATILITY_BANDWIDTH: f64 = 8.0;
/// Bandwidth (percent) above which volatility risk is MEDIUM.
pub const MEDIUM_VOLATILITY_BANDWIDTH: f64 = 4.0;

const HEURISTIC_CONFIDENCE: f64 = 0.7;
const HEURISTIC_REASONING: &str = "Based on technical indicators and detected events";
const MAX_KEY_FACTORS: usize = 5;

/// Sentiment score in [-1, 1] from RSI extremes, MACD histogram sign, SMA20 deviation and event bias.
#[must_use]
pub fn sentiment_score(snapshot: &AggregatedSnapshot, events: &EventAnalysis) -> f64 {
    let t = &snapshot.technical;
    let mut score = 0.0;

    if t.rsi_14 > OVERBOUGHT_RSI {
        score -= RSI_CONTRIBUTION;
    } else if t.rsi_14 < OVERSOLD_RSI {
        score += RSI_CONTRIBUTION;
    }

    if t.macd_histogram > 0.0 {
        score += MACD_CONTRIBUTION;
    } else if t.macd_histogram < 0.0 {
        score -= MACD_CONTRIBUTION;
    }

    score += (t.sma20_deviation(snapshot.close) * SMA_DEVIATION_SCALE)
        .clamp(-SMA_DEVIATION_CAP, SMA_DEVIATION_CAP);
    score += events.bias() * EVENT_BIAS_SCALE;

    score.clamp(-1.0, 1.0)
}

#[must_use]
pub fn trend(t: &TechnicalFeatures) -> Trend {
    if t.macd_histogram > 0.0 && t.rsi_14 > STRONG_UP_RSI {
        Trend::StrongUp
    } else if t.macd_histogram > 0.0 {
        Trend::Up
    } else if t.macd_histogram < 0.0 && t.rsi_14 < STRONG_DOWN_RSI {
        Trend::StrongDown
    } else if t.macd_histogram < 0.0 {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

#[must_use]
pub fn volatility_risk(bandwidth: f64) -> VolatilityRisk {
    if bandwidth > HIGH_VOLATILITY_BANDWIDTH {
        VolatilityRisk::High
    } else if bandwidth > MEDIUM_VOLATILITY_BANDWIDTH {
        VolatilityRisk::Medium
    } else {
        VolatilityRisk::Low
    }
}

/// `(support, resistance)` from the Bollinger bands widened to at least ±2% around SMA20.
#[must_use]
pub fn support_resistance(t: &TechnicalFeatures) -> (f64, f64) {
    (
        t.bollinger_lower.min(t.sma_20 * 0.98),
        t.bollinger_upper.max(t.sma_20 * 1.02),
    )
}

/// Up to five human-readable drivers.
#[must_use]
pub fn key_factors(t: &TechnicalFeatures, events: &EventAnalysis) -> Vec<String> {
    let mut factors = Vec::new();

    if t.rsi_14 > OVERBOUGHT_RSI {
        factors.push("Overbought conditions (RSI > 70)".to_string());
    }
    if t.rsi_14 < OVERSOLD_RSI {
        factors.push("Oversold conditions (RSI < 30)".to_string());
    }
    if t.volume_ratio > 2.0 {
        factors.push(format!("High volume ({:.1}x average)", t.volume_ratio));
    }
    if events.critical_events > 0 {
        factors.push(format!("{} critical event(s) detected", events.critical_events));
    }
    if t.bollinger_bandwidth > HIGH_VOLATILITY_BANDWIDTH {
        factors.push("High volatility environment".to_string());
    }
    if events.bullish_score > 70.0 {
        factors.push("Strong bullish bias from events".to_string());
    }
    if events.bearish_score > 70.0 {
        factors.push("Strong bearish bias from events".to_string());
    }

    factors.truncate(MAX_KEY_FACTORS);
    factors
}

fn anomaly(kind: &str, description: &str, severity: f64) -> Anomaly {
    Anomaly {
        kind: kind.to_string(),
        description: description.to_string(),
        severity,
    }
}

#[must_use]
pub fn detect_anomalies(t: &TechnicalFeatures) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let big_move = t.price_change_pct.abs() > 1.0;

    if big_move && t.volume_ratio < 0.5 {
        anomalies.push(anomaly(
            "Price-Volume Divergence",
            "Large price movement with low volume - unusual pattern",
            0.7,
        ));
    }
    if t.rsi_14 > OVERBOUGHT_RSI && t.macd_histogram > 0.0 {
        anomalies.push(anomaly(
            "Overbought Momentum",
            "Overbought RSI with positive MACD - potential reversal risk",
            0.6,
        ));
    }
    if t.rsi_14 < OVERSOLD_RSI && t.macd_histogram < 0.0 {
        anomalies.push(anomaly(
            "Oversold Momentum",
            "Oversold RSI with negative MACD - potential bounce opportunity",
            0.6,
        ));
    }
    if t.bollinger_bandwidth < 2.0 && big_move {
        anomalies.push(anomaly(
            "Volatility Breakout",
            "Price breaking out after low volatility period",
            0.8,
        ));
    }

    anomalies
}

/// Window over which an event is expected to play out.
#[must_use]
pub fn time_horizon(event: &Event) -> Resolution {
    if event.severity >= Severity::High {
        Resolution::OneMinute
    } else if event.event_type.is_news() {
        Resolution::FifteenMinutes
    } else if event.event_type.is_flow() {
        Resolution::FiveMinutes
    } else {
        Resolution::ThirtyMinutes
    }
}

#[must_use]
pub fn event_outlook(events: &EventAnalysis) -> Vec<EventOutlook> {
    events
        .events
        .iter()
        .map(|e| EventOutlook {
            event_type: e.event_type,
            severity: e.severity,
            price_impact: e.price_impact,
            time_horizon: time_horizon(e),
            confidence: e.confidence,
            explanation: e.description.clone(),
        })
        .collect()
}

/// Builds the full fallback insight.
#[must_use]
pub fn heuristic_insight(snapshot: &AggregatedSnapshot, events: &EventAnalysis) -> Insight {
    let t = &snapshot.technical;
    let score = sentiment_score(snapshot, events);
    let label = SentimentLabel::from_score(score);
    let trend = trend(t);
    let volatility = volatility_risk(t.bollinger_bandwidth);
    let (support, resistance) = support_resistance(t);

    let summary = format!(
        "{} is showing {} sentiment with {} volatility. Current trend: {}. {} events detected.",
        snapshot.symbol,
        label.as_str().to_lowercase(),
        volatility.as_str().to_lowercase(),
        trend.describe(),
        events.total_events
    );

    Insight {
        sentiment: Sentiment {
            score,
            magnitude: score.abs(),
            label,
            confidence: HEURISTIC_CONFIDENCE,
            reasoning: HEURISTIC_REASONING.to_string(),
        },
        trend,
        support: Some(support),
        resistance: Some(resistance),
        volatility_risk: volatility,
        key_factors: key_factors(t, events),
        anomalies: detect_anomalies(t),
        summary,
        event_outlook: event_outlook(events),
        source: InsightSource::Heuristic,
    }
}
