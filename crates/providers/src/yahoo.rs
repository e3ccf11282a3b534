//! Yahoo Finance chart API source.
//!
//! One endpoint serves both needs: `chart/{symbol}` returns the regular market price in
//! `meta` and parallel OHLCV arrays under `indicators.quote[0]`.

use crate::http::{HttpClientConfig, RateLimitedClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_pulse_core::config::SOURCE_YAHOO;
use market_pulse_core::{
    Bar, MarketDataSource, Quote, Resolution, UpstreamError, UpstreamResult,
};
use serde::Deserialize;

// =============================================================================
// API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<RawQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_result(self) -> UpstreamResult<Option<ChartResult>> {
        if let Some(err) = self.chart.error {
            return Err(UpstreamError::api(
                404,
                format!(
                    "{}: {}",
                    err.code.unwrap_or_default(),
                    err.description.unwrap_or_default()
                ),
            ));
        }
        Ok(self.chart.result.and_then(|r| r.into_iter().next()))
    }
}

impl ChartResult {
    /// Zips the parallel arrays into bars, skipping rows with any missing price.
    fn into_bars(self) -> Vec<Bar> {
        let quote = self
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .unwrap_or_default();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let field = |v: &[Option<f64>]| v.get(i).copied().flatten();
                let bar = Bar {
                    timestamp: DateTime::from_timestamp(*ts, 0)?,
                    open: field(&quote.open)?,
                    high: field(&quote.high)?,
                    low: field(&quote.low)?,
                    close: field(&quote.close)?,
                    volume: field(&quote.volume).unwrap_or(0.0),
                };
                Some(bar)
            })
            .collect()
    }
}

const fn chart_interval(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::OneMinute => "1m",
        Resolution::FiveMinutes => "5m",
        Resolution::FifteenMinutes => "15m",
        Resolution::ThirtyMinutes => "30m",
        Resolution::OneHour => "60m",
    }
}

// =============================================================================
// YahooFinanceSource
// =============================================================================

#[derive(Debug)]
pub struct YahooFinanceSource {
    client: RateLimitedClient,
}

impl YahooFinanceSource {
    /// Creates a source against the given chart API base URL.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpClientConfig) -> UpstreamResult<Self> {
        Ok(Self {
            client: RateLimitedClient::new(config)?,
        })
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> UpstreamResult<Option<ChartResult>> {
        let url = self.client.endpoint(&["chart", symbol])?;
        let response: ChartResponse = self.client.get_json(url, query).await?;
        response.into_result()
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceSource {
    fn name(&self) -> &str {
        SOURCE_YAHOO
    }

    async fn fetch_quote(&self, symbol: &str) -> UpstreamResult<Option<Quote>> {
        let query = [("interval", "1m".to_string()), ("range", "1d".to_string())];
        let Some(result) = self.chart(symbol, &query).await? else {
            return Ok(None);
        };

        let timestamp = result
            .meta
            .regular_market_time
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);

        Ok(result
            .meta
            .regular_market_price
            .map(|price| Quote::new(symbol, price, timestamp)))
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> UpstreamResult<Vec<Bar>> {
        let query = [
            ("period1", from.timestamp().to_string()),
            ("period2", to.timestamp().to_string()),
            ("interval", chart_interval(resolution).to_string()),
        ];
        Ok(self
            .chart(symbol, &query)
            .await?
            .map(ChartResult::into_bars)
            .unwrap_or_default())
    }
}
