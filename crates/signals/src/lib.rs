pub mod aggregator;
pub mod events;
pub mod explanation;
pub mod indicators;
pub mod insight;
pub mod pipeline;
pub mod predictor;
pub mod quality;

// Re-export pipeline stages for convenience
pub use aggregator::DataAggregator;
pub use events::{categorize_news, detect_market_events, EventDetector};
pub use insight::{heuristic_insight, InsightGenerator, ModelAnswer};
pub use pipeline::PredictionPipeline;
pub use predictor::{momentum_score, technical_score, PredictionEngine};

// Re-export feature calculation
pub use indicators::compute_features;

pub use explanation::build_explanation;
pub use quality::assess_data_quality;
