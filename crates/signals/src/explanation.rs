//! Human-readable explanation of a prediction.
//!
//! Formatting only: every line is built from fields the earlier stages already computed.

use market_pulse_core::{
    AggregatedSnapshot, EventAnalysis, Explanation, Insight, Prediction, VolatilityRisk,
};

const LOW_CONFIDENCE: f64 = 60.0;
const HIGH_CONFIDENCE: f64 = 75.0;
const HIGH_VOLUME_RATIO: f64 = 2.0;
const STRONG_SENTIMENT: f64 = 0.6;

#[must_use]
pub fn build_explanation(
    snapshot: &AggregatedSnapshot,
    events: &EventAnalysis,
    insight: &Insight,
    prediction: &Prediction,
) -> Explanation {
    Explanation {
        summary: summary(insight, prediction),
        reasoning: reasoning(events, insight),
        risks: risks(events, insight, prediction),
        opportunities: opportunities(snapshot, insight, prediction),
    }
}

fn summary(insight: &Insight, prediction: &Prediction) -> String {
    format!(
        "{} with {:.0}% confidence ({:+.2}% expected). {}",
        prediction.direction, prediction.confidence, prediction.expected_change, insight.summary
    )
}

fn reasoning(events: &EventAnalysis, insight: &Insight) -> Vec<String> {
    let sentiment = &insight.sentiment;
    let mut lines = vec![
        format!(
            "Sentiment: {} (score: {:.2}) - {}",
            sentiment.label, sentiment.score, sentiment.reasoning
        ),
        format!("Technical Analysis: {} trend detected", insight.trend.describe()),
        format!(
            "Event Analysis: {} events detected ({} critical)",
            events.total_events, events.critical_events
        ),
    ];

    if !insight.key_factors.is_empty() {
        lines.push(format!("Key Factors: {}", insight.key_factors.join(", ")));
    }

    lines
}

fn risks(events: &EventAnalysis, insight: &Insight, prediction: &Prediction) -> Vec<String> {
    let mut risks = Vec::new();

    if insight.volatility_risk == VolatilityRisk::High {
        risks.push("High volatility increases prediction uncertainty".to_string());
    }

    if !insight.anomalies.is_empty() {
        let kinds: Vec<&str> = insight.anomalies.iter().map(|a| a.kind.as_str()).collect();
        risks.push(format!("Anomalies detected: {}", kinds.join(", ")));
    }

    if prediction.confidence < LOW_CONFIDENCE {
        risks.push("Low confidence prediction - exercise caution".to_string());
    }

    if events.critical_events > 0 {
        risks.push(format!(
            "{} critical event(s) may cause sudden price movements",
            events.critical_events
        ));
    }

    if risks.is_empty() {
        risks.push("Standard market risks apply".to_string());
    }
    risks
}

fn opportunities(
    snapshot: &AggregatedSnapshot,
    insight: &Insight,
    prediction: &Prediction,
) -> Vec<String> {
    let mut opportunities = Vec::new();

    if prediction.confidence > HIGH_CONFIDENCE {
        opportunities.push("High confidence setup with favorable risk/reward".to_string());
    }

    if let (Some(support), Some(resistance)) = (insight.support, insight.resistance) {
        opportunities.push(format!(
            "Clear support at {support:.2} and resistance at {resistance:.2}"
        ));
    }

    if snapshot.technical.volume_ratio > HIGH_VOLUME_RATIO {
        opportunities.push("High volume confirms price movement strength".to_string());
    }

    if insight.sentiment.score.abs() > STRONG_SENTIMENT {
        opportunities.push("Strong directional bias from multiple signals".to_string());
    }

    if opportunities.is_empty() {
        opportunities.push("Monitor for better entry points".to_string());
    }
    opportunities
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use market_pulse_core::{
        Anomaly, BarSeries, Direction, Event, EventType, FactorScores, InsightSource, Interval,
        Sentiment, SentimentLabel, Severity, TechnicalFeatures, Trend,
    };
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn snapshot(volume_ratio: f64) -> AggregatedSnapshot {
        AggregatedSnapshot {
            symbol: "TLKM.JK".to_string(),
            timestamp: now(),
            interval: Interval::OneHour,
            open: 3000.0,
            high: 3000.0,
            low: 3000.0,
            close: 3000.0,
            volume: 0.0,
            technical: TechnicalFeatures {
                volume_ratio,
                ..Default::default()
            },
            multi_interval_context: BTreeMap::new(),
            history: BarSeries::flat(3000.0, 20, now(), Duration::hours(1)),
            order_book: None,
            quote_source: "mock".to_string(),
            history_source: None,
        }
    }

    fn insight() -> Insight {
        Insight {
            sentiment: Sentiment {
                score: 0.1,
                magnitude: 0.1,
                label: SentimentLabel::Neutral,
                confidence: 0.7,
                reasoning: "Mixed technicals".to_string(),
            },
            trend: Trend::StrongUp,
            support: None,
            resistance: None,
            volatility_risk: VolatilityRisk::Low,
            key_factors: Vec::new(),
            anomalies: Vec::new(),
            summary: "Quiet session.".to_string(),
            event_outlook: Vec::new(),
            source: InsightSource::Heuristic,
        }
    }

    fn prediction(confidence: f64) -> Prediction {
        Prediction {
            direction: Direction::Sideways,
            confidence,
            expected_change: 0.25,
            current_price: 3000.0,
            target_price: 3007.5,
            stop_loss: 2970.0,
            take_profit: 3015.0,
            direction_score: 0.1,
            factors: FactorScores::default(),
        }
    }

    #[test]
    fn test_reasoning_lines() {
        let mut i = insight();
        i.key_factors = vec!["RSI neutral".to_string(), "Low volume".to_string()];
        let events = EventAnalysis::from_events(
            "TLKM.JK",
            now(),
            vec![
                Event::new(EventType::VolumeSurge, Severity::Critical, now(), "surge"),
                Event::new(EventType::VolatilitySurge, Severity::Medium, now(), "wide bands"),
            ],
        );

        let e = build_explanation(&snapshot(1.0), &events, &i, &prediction(65.0));

        assert_eq!(
            e.reasoning,
            vec![
                "Sentiment: NEUTRAL (score: 0.10) - Mixed technicals".to_string(),
                "Technical Analysis: strong up trend detected".to_string(),
                "Event Analysis: 2 events detected (1 critical)".to_string(),
                "Key Factors: RSI neutral, Low volume".to_string(),
            ]
        );
        assert_eq!(
            e.risks,
            vec!["1 critical event(s) may cause sudden price movements".to_string()]
        );
    }

    #[test]
    fn test_defaults_when_nothing_triggers() {
        let e = build_explanation(
            &snapshot(1.0),
            &EventAnalysis::empty("TLKM.JK", now()),
            &insight(),
            &prediction(65.0),
        );

        assert_eq!(e.reasoning.len(), 3);
        assert_eq!(e.risks, vec!["Standard market risks apply".to_string()]);
        assert_eq!(e.opportunities, vec!["Monitor for better entry points".to_string()]);
        assert_eq!(e.summary, "SIDEWAYS with 65% confidence (+0.25% expected). Quiet session.");
    }

    #[test]
    fn test_risks() {
        let mut i = insight();
        i.volatility_risk = VolatilityRisk::High;
        i.anomalies = vec![
            Anomaly {
                kind: "Price-Volume Divergence".to_string(),
                description: "d".to_string(),
                severity: 0.6,
            },
            Anomaly {
                kind: "Volatility Breakout".to_string(),
                description: "d".to_string(),
                severity: 0.7,
            },
        ];

        let e = build_explanation(
            &snapshot(1.0),
            &EventAnalysis::empty("TLKM.JK", now()),
            &i,
            &prediction(45.0),
        );

        assert_eq!(
            e.risks,
            vec![
                "High volatility increases prediction uncertainty".to_string(),
                "Anomalies detected: Price-Volume Divergence, Volatility Breakout".to_string(),
                "Low confidence prediction - exercise caution".to_string(),
            ]
        );
    }

    #[test]
    fn test_opportunities() {
        let mut i = insight();
        i.support = Some(2950.0);
        i.resistance = Some(3061.2);
        i.sentiment.score = -0.7;

        let e = build_explanation(
            &snapshot(2.5),
            &EventAnalysis::empty("TLKM.JK", now()),
            &i,
            &prediction(80.0),
        );

        assert_eq!(
            e.opportunities,
            vec![
                "High confidence setup with favorable risk/reward".to_string(),
                "Clear support at 2950.00 and resistance at 3061.20".to_string(),
                "High volume confirms price movement strength".to_string(),
                "Strong directional bias from multiple signals".to_string(),
            ]
        );
    }

    #[test]
    fn test_single_level_is_not_an_opportunity() {
        let mut i = insight();
        i.support = Some(2950.0);

        let e = build_explanation(
            &snapshot(1.0),
            &EventAnalysis::empty("TLKM.JK", now()),
            &i,
            &prediction(65.0),
        );
        assert_eq!(e.opportunities, vec!["Monitor for better entry points".to_string()]);
    }
}
