//! Collaborator seams.
//!
//! The pipeline only talks to the outside world through these traits. Every method
//! returns [`UpstreamError`](crate::error::UpstreamError) on failure, which the pipeline
//! absorbs into a degraded value.

use crate::bar::{Bar, OrderBookSnapshot, Quote, Resolution};
use crate::error::UpstreamResult;
use crate::event::NewsArticle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A source of current prices and historical candles.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short stable name used for priority ordering and logs.
    fn name(&self) -> &str;

    /// Current price, `None` when the source has no quote for the symbol.
    async fn fetch_quote(&self, symbol: &str) -> UpstreamResult<Option<Quote>>;

    /// Candles in `[from, to]`, oldest first. May be empty.
    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> UpstreamResult<Vec<Bar>>;
}

#[async_trait]
pub trait OrderBookSource: Send + Sync {
    fn name(&self) -> &str;

    async fn order_book(&self, symbol: &str) -> UpstreamResult<OrderBookSnapshot>;
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn recent_news(&self, symbol: &str) -> UpstreamResult<Vec<NewsArticle>>;
}

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> UpstreamResult<String>;
}
