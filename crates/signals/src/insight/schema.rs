//! Strict schema for language-model answers.
//!
//! The answer is untrusted text. It is only turned into an [`Insight`] after it
//! deserializes into [`ModelAnswer`] and every numeric field passes range checks.

use anyhow::{anyhow, bail, Context, Result};
use market_pulse_core::{
    Anomaly, EventOutlook, Insight, InsightSource, Sentiment, SentimentLabel, Trend,
    VolatilityRisk,
};
use serde::Deserialize;

const MAX_KEY_FACTORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSentiment {
    pub score: f64,
    pub magnitude: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPriceContext {
    pub trend: Trend,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub volatility_risk: VolatilityRisk,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnswer {
    pub sentiment: ModelSentiment,
    pub price_context: ModelPriceContext,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    pub summary: String,
}

/// Slice from the first `{` to the last `}`, tolerating prose or code fences around the JSON.
fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        bail!("{name} = {value} is outside [{min}, {max}]");
    }
    Ok(())
}

fn check_level(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => bail!("{name} = {v} is not a positive price"),
        _ => Ok(()),
    }
}

impl ModelAnswer {
    /// Extracts and deserializes the JSON object embedded in `text`.
    ///
    /// # Errors
    /// Returns error if no object is found, it does not match the schema, or a value is out of range.
    pub fn parse(text: &str) -> Result<Self> {
        let json = json_object(text).ok_or_else(|| anyhow!("no JSON object in model output"))?;
        let answer: Self =
            serde_json::from_str(json).context("model output does not match the insight schema")?;
        answer.validate()?;
        Ok(answer)
    }

    /// Range-checks every numeric field.
    ///
    /// # Errors
    /// Returns error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let s = &self.sentiment;
        check_range("sentiment.score", s.score, -1.0, 1.0)?;
        check_range("sentiment.magnitude", s.magnitude, 0.0, 1.0)?;
        check_range("sentiment.confidence", s.confidence, 0.0, 1.0)?;
        check_level("priceContext.support", self.price_context.support)?;
        check_level("priceContext.resistance", self.price_context.resistance)?;
        for anomaly in &self.anomalies {
            check_range("anomalies.severity", anomaly.severity, 0.0, 1.0)?;
        }
        if self.summary.trim().is_empty() {
            bail!("summary is empty");
        }
        Ok(())
    }

    /// Converts into an insight carrying the locally computed event outlook.
    #[must_use]
    pub fn into_insight(self, event_outlook: Vec<EventOutlook>) -> Insight {
        let mut key_factors = self.key_factors;
        key_factors.truncate(MAX_KEY_FACTORS);

        Insight {
            sentiment: Sentiment {
                score: self.sentiment.score,
                magnitude: self.sentiment.magnitude,
                label: self.sentiment.label,
                confidence: self.sentiment.confidence,
                reasoning: self.sentiment.reasoning,
            },
            trend: self.price_context.trend,
            support: self.price_context.support,
            resistance: self.price_context.resistance,
            volatility_risk: self.price_context.volatility_risk,
            key_factors,
            anomalies: self.anomalies,
            summary: self.summary,
            event_outlook,
            source: InsightSource::LanguageModel,
        }
    }
}
