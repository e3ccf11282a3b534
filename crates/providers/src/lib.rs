//! Adapters for the collaborators the prediction pipeline depends on.

pub mod finnhub;
pub mod gemini;
pub mod http;
pub mod news;
pub mod registry;
pub mod yahoo;

pub use finnhub::FinnhubSource;
pub use gemini::GeminiClient;
pub use http::{upstream_from_reqwest, HttpClientConfig, RateLimitedClient};
pub use news::EmptyNewsFeed;
pub use registry::{language_model, market_sources};
pub use yahoo::YahooFinanceSource;
