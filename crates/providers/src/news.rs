//! News feed placeholder.
//!
//! No news provider is wired up yet, so the detector sees an empty article list.

use async_trait::async_trait;
use market_pulse_core::{NewsArticle, NewsFeed, UpstreamResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyNewsFeed;

#[async_trait]
impl NewsFeed for EmptyNewsFeed {
    async fn recent_news(&self, symbol: &str) -> UpstreamResult<Vec<NewsArticle>> {
        tracing::debug!(symbol, "no news provider configured");
        Ok(Vec::new())
    }
}
