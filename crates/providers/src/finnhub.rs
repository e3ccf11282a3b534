//! Finnhub REST source (`/quote` and `/stock/candle`).

use crate::http::{HttpClientConfig, RateLimitedClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_pulse_core::config::SOURCE_FINNHUB;
use market_pulse_core::{Bar, MarketDataSource, Quote, Resolution, UpstreamResult};
use serde::Deserialize;

/// `/quote` response. `c` is the current price and is 0 for unknown symbols.
#[derive(Debug, Deserialize)]
struct RawQuote {
    c: Option<f64>,
    t: Option<i64>,
}

/// `/stock/candle` response: status plus parallel arrays.
#[derive(Debug, Deserialize)]
struct RawCandles {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

impl RawCandles {
    fn into_bars(self) -> Vec<Bar> {
        if self.s != "ok" {
            return Vec::new();
        }
        self.t
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp(*ts, 0)?,
                    open: *self.o.get(i)?,
                    high: *self.h.get(i)?,
                    low: *self.l.get(i)?,
                    close: *self.c.get(i)?,
                    volume: self.v.get(i).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

const fn candle_resolution(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::OneMinute => "1",
        Resolution::FiveMinutes => "5",
        Resolution::FifteenMinutes => "15",
        Resolution::ThirtyMinutes => "30",
        Resolution::OneHour => "60",
    }
}

pub struct FinnhubSource {
    client: RateLimitedClient,
    api_key: String,
}

impl std::fmt::Debug for FinnhubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubSource")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl FinnhubSource {
    /// Creates a source authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpClientConfig, api_key: impl Into<String>) -> UpstreamResult<Self> {
        Ok(Self {
            client: RateLimitedClient::new(config)?,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl MarketDataSource for FinnhubSource {
    fn name(&self) -> &str {
        SOURCE_FINNHUB
    }

    async fn fetch_quote(&self, symbol: &str) -> UpstreamResult<Option<Quote>> {
        let url = self.client.endpoint(&["quote"])?;
        let query = [("symbol", symbol.to_string()), ("token", self.api_key.clone())];
        let raw: RawQuote = self.client.get_json(url, &query).await?;

        let timestamp = raw
            .t
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);
        Ok(raw.c.map(|price| Quote::new(symbol, price, timestamp)))
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> UpstreamResult<Vec<Bar>> {
        let url = self.client.endpoint(&["stock", "candle"])?;
        let query = [
            ("symbol", symbol.to_string()),
            ("resolution", candle_resolution(resolution).to_string()),
            ("from", from.timestamp().to_string()),
            ("to", to.timestamp().to_string()),
            ("token", self.api_key.clone()),
        ];
        let raw: RawCandles = self.client.get_json(url, &query).await?;
        Ok(raw.into_bars())
    }
}
