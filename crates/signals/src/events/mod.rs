//! Event detection: market-data thresholds plus optional news.

pub mod detector;
pub mod news;

pub use detector::{detect_market_events, event_confidence, EventDetector};
pub use news::{categorize_news, headline_score};
