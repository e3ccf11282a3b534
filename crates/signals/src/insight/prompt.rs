//! Language-model prompt construction.
//!
//! The prompt is a pure function of the snapshot and events: the same inputs always
//! produce byte-identical text.

use market_pulse_core::{AggregatedSnapshot, EventAnalysis};
use std::fmt::Write;

const MAX_PROMPT_EVENTS: usize = 10;

const RESPONSE_INSTRUCTIONS: &str = r#"Based on this data, provide a CONCISE analysis for short-term trading (1m to 1h timeframe):

1. OVERALL SENTIMENT (bullish/bearish scale -1 to +1, reasoning)
2. PRICE TREND (STRONG_UP/UP/SIDEWAYS/DOWN/STRONG_DOWN)
3. KEY SUPPORT AND RESISTANCE LEVELS (if identifiable from data)
4. VOLATILITY RISK (LOW/MEDIUM/HIGH)
5. TOP 3-5 KEY FACTORS affecting the stock right now
6. ANY ANOMALIES (price-volume divergence, unusual patterns, etc.)
7. SHORT SUMMARY (2-3 sentences for traders)

Format your response as JSON with this structure:
{
  "sentiment": {
    "score": -1 to +1,
    "magnitude": 0 to 1,
    "label": "VERY_BEARISH|BEARISH|NEUTRAL|BULLISH|VERY_BULLISH",
    "confidence": 0 to 1,
    "reasoning": "brief explanation"
  },
  "priceContext": {
    "trend": "STRONG_UP|UP|SIDEWAYS|DOWN|STRONG_DOWN",
    "support": number or null,
    "resistance": number or null,
    "volatilityRisk": "LOW|MEDIUM|HIGH"
  },
  "keyFactors": ["factor1", "factor2", "factor3"],
  "anomalies": [{"type": "name", "description": "text", "severity": 0-1}],
  "summary": "2-3 sentence summary for traders"
}"#;

#[must_use]
pub fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "(Overbought)"
    } else if rsi < 30.0 {
        "(Oversold)"
    } else if rsi > 60.0 {
        "(Bullish)"
    } else if rsi < 40.0 {
        "(Bearish)"
    } else {
        "(Neutral)"
    }
}

#[must_use]
pub fn interpret_bandwidth(bandwidth: f64) -> &'static str {
    if bandwidth > 10.0 {
        "(Very High Volatility)"
    } else if bandwidth > 5.0 {
        "(High Volatility)"
    } else if bandwidth < 2.0 {
        "(Low Volatility - Squeeze)"
    } else {
        "(Normal)"
    }
}

#[must_use]
pub fn interpret_volume_ratio(ratio: f64) -> &'static str {
    if ratio > 3.0 {
        "(Extremely High)"
    } else if ratio > 1.5 {
        "(High)"
    } else if ratio < 0.5 {
        "(Low)"
    } else {
        "(Normal)"
    }
}

/// Builds the analysis prompt for `snapshot` and its detected `events`.
#[must_use]
pub fn build_prompt(snapshot: &AggregatedSnapshot, events: &EventAnalysis) -> String {
    let t = &snapshot.technical;
    let mut p = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        p,
        "Analyze stock {} for short-term trading (1 minute to 1 hour):\n",
        snapshot.symbol
    );

    let _ = writeln!(p, "CURRENT PRICE DATA:");
    let _ = writeln!(p, "- Current Price: {}", snapshot.close);
    let _ = writeln!(
        p,
        "- Open: {}, High: {}, Low: {}",
        snapshot.open, snapshot.high, snapshot.low
    );
    let _ = writeln!(p, "- Volume: {:.0}", snapshot.volume);
    let _ = writeln!(p, "- Price Change: {:.2}%\n", t.price_change_pct);

    let _ = writeln!(p, "TECHNICAL INDICATORS:");
    let _ = writeln!(p, "- RSI(14): {:.2} {}", t.rsi_14, interpret_rsi(t.rsi_14));
    let _ = writeln!(
        p,
        "- MACD: {:.4} (Signal: {:.4}, Histogram: {:.4})",
        t.macd, t.macd_signal, t.macd_histogram
    );
    let _ = writeln!(
        p,
        "- Bollinger Bands: Upper={:.2}, Middle={:.2}, Lower={:.2}",
        t.bollinger_upper, t.bollinger_middle, t.bollinger_lower
    );
    let _ = writeln!(
        p,
        "- Bollinger Bandwidth: {:.2}% {}",
        t.bollinger_bandwidth,
        interpret_bandwidth(t.bollinger_bandwidth)
    );
    let _ = writeln!(
        p,
        "- Volume Ratio: {:.2}x average {}",
        t.volume_ratio,
        interpret_volume_ratio(t.volume_ratio)
    );
    let _ = writeln!(p, "- ATR(14): {:.4} (volatility measure)\n", t.atr_14);

    let _ = writeln!(p, "TREND ANALYSIS:");
    let _ = writeln!(
        p,
        "- SMA(5/10/20): {:.2} / {:.2} / {:.2}",
        t.sma_5, t.sma_10, t.sma_20
    );
    let _ = writeln!(
        p,
        "- EMA(5/10/20): {:.2} / {:.2} / {:.2}",
        t.ema_5, t.ema_10, t.ema_20
    );
    let _ = writeln!(
        p,
        "- Current vs SMA20: {:.2}%\n",
        t.sma20_deviation(snapshot.close) * 100.0
    );

    if !events.events.is_empty() {
        let _ = writeln!(p, "DETECTED EVENTS ({} total):", events.events.len());
        for event in events.events.iter().take(MAX_PROMPT_EVENTS) {
            let _ = writeln!(
                p,
                "- [{}] {}: {}",
                event.severity, event.event_type, event.description
            );
        }
        let _ = writeln!(
            p,
            "\nEvent Bias: Bullish {:.0}% / Bearish {:.0}% / Neutral {:.0}%\n",
            events.bullish_score, events.bearish_score, events.neutral_score
        );
    }

    if t.bid_ask_spread > 0.0 {
        let _ = writeln!(p, "ORDER BOOK:");
        let _ = writeln!(p, "- Bid-Ask Spread: {:.4}", t.bid_ask_spread);
        let _ = writeln!(
            p,
            "- Imbalance: {:.2}% {}\n",
            t.order_book_imbalance * 100.0,
            if t.order_book_imbalance > 0.0 {
                "(buy pressure)"
            } else {
                "(sell pressure)"
            }
        );
    }

    p.push('\n');
    p.push_str(RESPONSE_INSTRUCTIONS);
    p
}
