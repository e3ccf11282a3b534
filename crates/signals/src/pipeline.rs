//! End-to-end prediction pipeline.
//!
//! validate → aggregate → detect events → insight → predict → explain.
//! Only validation and a missing current price can fail a run; every later stage
//! always produces a value.

use crate::aggregator::DataAggregator;
use crate::events::EventDetector;
use crate::explanation::build_explanation;
use crate::insight::InsightGenerator;
use crate::predictor::PredictionEngine;
use crate::quality::assess_data_quality;
use chrono::Utc;
use market_pulse_core::error::Result;
use market_pulse_core::{
    validate_request, AppConfig, LanguageModel, MarketDataSource, NewsFeed, PredictionReport,
    PredictionRequest,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug)]
pub struct PredictionPipeline {
    aggregator: DataAggregator,
    detector: EventDetector,
    insight: InsightGenerator,
    engine: PredictionEngine,
}

impl PredictionPipeline {
    #[must_use]
    pub fn new(
        aggregator: DataAggregator,
        detector: EventDetector,
        insight: InsightGenerator,
        engine: PredictionEngine,
    ) -> Self {
        Self {
            aggregator,
            detector,
            insight,
            engine,
        }
    }

    /// Wires the stages from application config and already-built collaborators.
    #[must_use]
    pub fn from_config(
        config: &AppConfig,
        sources: Vec<Arc<dyn MarketDataSource>>,
        model: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let model_timeout = Duration::from_secs(config.llm.timeout_secs.max(1));
        let insight = match model {
            Some(model) => InsightGenerator::heuristic()
                .with_model(model)
                .with_timeout(model_timeout),
            None => InsightGenerator::heuristic(),
        };
        let news_timeout = Duration::from_secs(config.aggregator.call_timeout_secs.max(1));

        Self::new(
            DataAggregator::new(sources, config.aggregator.clone()),
            EventDetector::new().with_news_timeout(news_timeout),
            insight,
            PredictionEngine::new(config.policy.clone()),
        )
    }

    /// Attaches a news feed to the current detector, keeping its timeout.
    #[must_use]
    pub fn with_news_feed(mut self, feed: Arc<dyn NewsFeed>) -> Self {
        self.detector = std::mem::take(&mut self.detector).with_news_feed(feed);
        self
    }

    /// Replaces the event detector.
    #[must_use]
    pub fn with_detector(mut self, detector: EventDetector) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub const fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    /// Validates raw input and runs the pipeline.
    ///
    /// # Errors
    /// Returns [`market_pulse_core::PipelineError::Validation`] for bad input, before any
    /// source is called, and `DataUnavailable` when no source yields a current price.
    pub async fn run(&self, symbol: &str, interval: &str) -> Result<PredictionReport> {
        let request = validate_request(symbol, interval)?;
        self.run_request(&request).await
    }

    /// Runs the pipeline for an already validated request.
    ///
    /// # Errors
    /// Returns `DataUnavailable` when no source yields a current price.
    pub async fn run_request(&self, request: &PredictionRequest) -> Result<PredictionReport> {
        let started = Instant::now();
        let symbol = request.symbol.as_str();
        info!("Starting {} prediction for {}", request.interval, symbol);

        let snapshot = self.aggregator.aggregate(symbol, request.interval).await?;
        let events = self.detector.detect(&snapshot).await;
        let insight = self.insight.analyze(&snapshot, &events).await;
        let prediction = self.engine.predict(&snapshot, &events, &insight);
        let explanation = build_explanation(&snapshot, &events, &insight, &prediction);
        let data_quality = assess_data_quality(&snapshot, &events);

        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "{} {}: {} at {:.1}% confidence ({:+.2}%), {} events, {}ms",
            symbol,
            request.interval,
            prediction.direction,
            prediction.confidence,
            prediction.expected_change,
            events.total_events,
            processing_ms
        );

        Ok(PredictionReport {
            symbol: request.symbol.clone(),
            interval: request.interval,
            generated_at: Utc::now(),
            snapshot,
            events,
            insight,
            prediction,
            explanation,
            data_quality,
            policy_version: self.engine.policy().version.clone(),
            processing_ms,
        })
    }
}
