//! Sentiment and price-context insight.
//!
//! The primary path asks a language model; the heuristic path is deterministic and
//! takes over whenever the model is missing, fails, or answers outside the schema.
//! Both produce the same [`Insight`] shape.

pub mod heuristic;
pub mod prompt;
pub mod schema;

pub use heuristic::{event_outlook, heuristic_insight};
pub use prompt::build_prompt;
pub use schema::ModelAnswer;

use market_pulse_core::{AggregatedSnapshot, EventAnalysis, Insight, LanguageModel, UpstreamError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct InsightGenerator {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self {
            model: None,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for InsightGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightGenerator")
            .field("model", &self.model.as_ref().map(|m| m.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl InsightGenerator {
    /// Creates a generator that only uses the heuristic path.
    #[must_use]
    pub fn heuristic() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Upper bound on a single model call; a slower answer counts as a failure.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produces an insight. Never fails.
    pub async fn analyze(&self, snapshot: &AggregatedSnapshot, events: &EventAnalysis) -> Insight {
        let Some(model) = &self.model else {
            info!("No language model configured, using heuristic insight for {}", snapshot.symbol);
            return heuristic_insight(snapshot, events);
        };

        let prompt = build_prompt(snapshot, events);
        let limit = self.timeout;
        let generated = tokio::time::timeout(limit, model.generate(&prompt))
            .await
            .unwrap_or_else(|_| Err(UpstreamError::Timeout(format!("no answer within {limit:?}"))));
        let answer = match generated {
            Ok(text) => ModelAnswer::parse(&text),
            Err(e) => Err(e.into()),
        };

        match answer {
            Ok(answer) => {
                info!("Insight for {} from {}", snapshot.symbol, model.name());
                answer.into_insight(event_outlook(events))
            }
            Err(e) => {
                warn!(
                    "Language model {} unusable for {}, falling back to heuristic: {:#}",
                    model.name(),
                    snapshot.symbol,
                    e
                );
                heuristic_insight(snapshot, events)
            }
        }
    }
}
