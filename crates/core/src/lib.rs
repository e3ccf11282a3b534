pub mod bar;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod event;
pub mod features;
pub mod insight;
pub mod policy;
pub mod prediction;
pub mod traits;
pub mod validation;

pub use bar::{Bar, BarSeries, Interval, OrderBookSnapshot, PriceLevel, Quote, Resolution};
pub use config::{AggregatorConfig, AppConfig, LlmConfig, ProvidersConfig};
pub use config_loader::ConfigLoader;
pub use error::{PipelineError, UpstreamError, UpstreamResult, ValidationError};
pub use event::{Event, EventAnalysis, EventType, NewsArticle, Polarity, Severity};
pub use features::{AggregatedSnapshot, TechnicalFeatures};
pub use insight::{
    Anomaly, EventOutlook, Insight, InsightSource, Sentiment, SentimentLabel, Trend,
    VolatilityRisk,
};
pub use policy::{FactorWeights, ScoringPolicy, MAX_CONFIDENCE, MIN_CONFIDENCE};
pub use prediction::{
    DataQuality, Direction, Explanation, FactorScores, Prediction, PredictionReport,
};
pub use traits::{LanguageModel, MarketDataSource, NewsFeed, OrderBookSource};
pub use validation::{validate_request, validate_symbol, PredictionRequest};
