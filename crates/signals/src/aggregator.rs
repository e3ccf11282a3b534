//! Market data aggregation.
//!
//! Fans out to every configured source, picks the current price by source priority,
//! falls back through sources for history, and computes the feature record. Only a
//! missing current price fails the request; every other gap degrades the snapshot.

use crate::indicators::compute_features;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use market_pulse_core::error::Result;
use market_pulse_core::{
    AggregatedSnapshot, AggregatorConfig, Bar, BarSeries, Interval, MarketDataSource,
    OrderBookSnapshot, OrderBookSource, PipelineError, Quote, Resolution, UpstreamError,
    UpstreamResult,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// History look-back used when a resolution is fetched as cross-timeframe context.
fn context_lookback(resolution: Resolution) -> ChronoDuration {
    let interval = match resolution {
        Resolution::OneMinute => Interval::OneMinute,
        Resolution::FiveMinutes => Interval::FiveMinutes,
        Resolution::FifteenMinutes => Interval::FifteenMinutes,
        Resolution::ThirtyMinutes => Interval::ThirtyMinutes,
        Resolution::OneHour => Interval::OneHour,
    };
    interval.lookback()
}

/// Bars plus the name of the source that supplied them.
type SourcedBars = (Vec<Bar>, String);

pub struct DataAggregator {
    sources: Vec<Arc<dyn MarketDataSource>>,
    order_book: Option<Arc<dyn OrderBookSource>>,
    config: AggregatorConfig,
}

impl std::fmt::Debug for DataAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAggregator")
            .field("sources", &self.source_names())
            .field("order_book", &self.order_book.as_ref().map(|s| s.name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

impl DataAggregator {
    /// Creates an aggregator over `sources`, highest priority first.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn MarketDataSource>>, config: AggregatorConfig) -> Self {
        Self {
            sources,
            order_book: None,
            config,
        }
    }

    #[must_use]
    pub fn with_order_book(mut self, source: Arc<dyn OrderBookSource>) -> Self {
        self.order_book = Some(source);
        self
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.call_timeout_secs.max(1))
    }

    async fn timed<T>(&self, call: impl Future<Output = UpstreamResult<T>>) -> UpstreamResult<T> {
        let limit = self.call_timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(UpstreamError::Timeout(format!("no response within {limit:?}"))))
    }

    /// Builds the snapshot for `symbol` at `interval`.
    ///
    /// # Errors
    /// Returns [`PipelineError::DataUnavailable`] when no source yields a positive, finite price.
    pub async fn aggregate(&self, symbol: &str, interval: Interval) -> Result<AggregatedSnapshot> {
        info!("Aggregating {} ({})", symbol, interval);
        let now = Utc::now();
        let resolution = interval.resolution();

        let (quote, history, context, order_book) = tokio::join!(
            self.current_quote(symbol),
            self.history(symbol, resolution, now - interval.lookback(), now),
            self.context(symbol, now),
            self.order_book(symbol),
        );

        let Some((quote, quote_source)) = quote else {
            warn!("No valid price for {} from {:?}", symbol, self.source_names());
            return Err(PipelineError::data_unavailable(symbol, self.source_names()));
        };
        let price = quote.price;

        let (history, history_source) = match history.and_then(|(bars, src)| {
            BarSeries::new(bars).map(|series| (series, src))
        }) {
            Some((series, src)) => (series, Some(src)),
            None => {
                warn!(
                    "No history for {}, synthesizing {} flat bars at {}",
                    symbol, self.config.synthetic_bars, price
                );
                let series =
                    BarSeries::flat(price, self.config.synthetic_bars, now, resolution.duration());
                (series, None)
            }
        };

        let technical = compute_features(&history, price, order_book.as_ref());
        let bars = history.as_slice();
        let open = history.first().open;
        let high = bars.iter().map(|b| b.high).fold(price, f64::max);
        let low = bars.iter().map(|b| b.low).fold(price, f64::min);
        let volume: f64 = bars.iter().map(|b| b.volume).sum();

        let snapshot = AggregatedSnapshot {
            symbol: symbol.to_string(),
            timestamp: now,
            interval,
            open,
            high,
            low,
            close: price,
            volume,
            technical,
            multi_interval_context: context,
            history,
            order_book,
            quote_source,
            history_source,
        };

        info!(
            "Aggregated {}: price {} from {}, {} bars, {} context intervals",
            symbol,
            price,
            snapshot.quote_source,
            snapshot.history.len(),
            snapshot.multi_interval_context.len()
        );
        Ok(snapshot)
    }

    /// First valid quote in priority order. All sources are queried concurrently.
    async fn current_quote(&self, symbol: &str) -> Option<(Quote, String)> {
        let calls = self.sources.iter().map(|source| async move {
            (source.name(), self.timed(source.fetch_quote(symbol)).await)
        });

        let mut chosen = None;
        for (name, result) in join_all(calls).await {
            match result {
                Ok(Some(quote)) if quote.is_valid() => {
                    if chosen.is_none() {
                        chosen = Some((quote, name.to_string()));
                    }
                }
                Ok(Some(quote)) => {
                    debug!("Ignoring invalid price {} for {} from {}", quote.price, symbol, name);
                }
                Ok(None) => debug!("No quote for {} from {}", symbol, name),
                Err(e) => warn!("Quote from {} failed for {}: {}", name, symbol, e),
            }
        }
        chosen
    }

    /// Candles from the first source (by priority) that returns any.
    async fn history(
        &self,
        symbol: &str,
        resolution: Resolution,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Option<SourcedBars> {
        for source in &self.sources {
            match self
                .timed(source.fetch_candles(symbol, resolution, from, to))
                .await
            {
                Ok(bars) if !bars.is_empty() => return Some((bars, source.name().to_string())),
                Ok(_) => debug!("No {} candles for {} from {}", resolution, symbol, source.name()),
                Err(e) => warn!(
                    "{} candles from {} failed for {}: {}",
                    resolution,
                    source.name(),
                    symbol,
                    e
                ),
            }
        }
        None
    }

    /// Close prices for every context resolution that could be fetched.
    async fn context(&self, symbol: &str, now: DateTime<Utc>) -> BTreeMap<Resolution, Vec<f64>> {
        let calls = Resolution::CONTEXT.into_iter().map(|resolution| async move {
            let bars = self
                .history(symbol, resolution, now - context_lookback(resolution), now)
                .await;
            (resolution, bars)
        });

        join_all(calls)
            .await
            .into_iter()
            .filter_map(|(resolution, bars)| match bars {
                Some((bars, _)) => Some((resolution, bars.iter().map(|b| b.close).collect())),
                None => {
                    warn!("No {} context for {}", resolution, symbol);
                    None
                }
            })
            .collect()
    }

    async fn order_book(&self, symbol: &str) -> Option<OrderBookSnapshot> {
        let source = self.order_book.as_ref()?;
        match self.timed(source.order_book(symbol)).await {
            Ok(book) => Some(book),
            Err(e) => {
                warn!("Order book from {} unavailable for {}: {}", source.name(), symbol, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_pulse_core::PriceLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EPS: f64 = 1e-9;

    /// Configurable in-memory source.
    struct MockSource {
        name: &'static str,
        price: Option<f64>,
        fail_quote: bool,
        bars: Vec<Bar>,
        fail_candles: bool,
        failing_resolutions: Vec<Resolution>,
        delay: Option<Duration>,
        candle_calls: AtomicUsize,
    }

    impl MockSource {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                price: None,
                fail_quote: false,
                bars: Vec::new(),
                fail_candles: false,
                failing_resolutions: Vec::new(),
                delay: None,
                candle_calls: AtomicUsize::new(0),
            }
        }

        fn with_price(mut self, price: f64) -> Self {
            self.price = Some(price);
            self
        }

        fn with_bars(mut self, closes: &[f64]) -> Self {
            let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
            self.bars = closes
                .iter()
                .enumerate()
                .map(|(i, c)| Bar {
                    timestamp: start + ChronoDuration::minutes(i as i64),
                    open: *c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: *c,
                    volume: 10.0,
                })
                .collect();
            self
        }

        fn failing(mut self) -> Self {
            self.fail_quote = true;
            self.fail_candles = true;
            self
        }

        fn failing_for(mut self, resolutions: &[Resolution]) -> Self {
            self.failing_resolutions = resolutions.to_vec();
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_quote(&self, symbol: &str) -> UpstreamResult<Option<Quote>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_quote {
                return Err(UpstreamError::Network("down".to_string()));
            }
            Ok(self.price.map(|p| Quote::new(symbol, p, Utc::now())))
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            resolution: Resolution,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> UpstreamResult<Vec<Bar>> {
            self.candle_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_candles || self.failing_resolutions.contains(&resolution) {
                return Err(UpstreamError::api(503, "unavailable"));
            }
            Ok(self.bars.clone())
        }
    }

    struct MockBook(Option<OrderBookSnapshot>);

    #[async_trait]
    impl OrderBookSource for MockBook {
        fn name(&self) -> &str {
            "book"
        }

        async fn order_book(&self, _symbol: &str) -> UpstreamResult<OrderBookSnapshot> {
            self.0
                .clone()
                .ok_or_else(|| UpstreamError::NotConfigured("book".to_string()))
        }
    }

    fn aggregator(sources: Vec<Arc<dyn MarketDataSource>>) -> DataAggregator {
        DataAggregator::new(sources, AggregatorConfig::default())
    }

    // ==================== Price Selection Tests ====================

    #[tokio::test]
    async fn test_priority_wins_over_later_sources() {
        let agg = aggregator(vec![
            Arc::new(MockSource::new("primary").with_price(101.0)),
            Arc::new(MockSource::new("secondary").with_price(99.0)),
        ]);
        let snapshot = agg.aggregate("AAPL", Interval::FiveMinutes).await.unwrap();
        assert!((snapshot.close - 101.0).abs() < EPS);
        assert_eq!(snapshot.quote_source, "primary");
    }

    #[tokio::test]
    async fn test_invalid_primary_price_falls_through() {
        let agg = aggregator(vec![
            Arc::new(MockSource::new("primary").with_price(0.0)),
            Arc::new(MockSource::new("broken").failing()),
            Arc::new(MockSource::new("tertiary").with_price(42.5)),
        ]);
        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();
        assert!((snapshot.close - 42.5).abs() < EPS);
        assert_eq!(snapshot.quote_source, "tertiary");
    }

    #[tokio::test]
    async fn test_no_valid_price_is_data_unavailable() {
        let agg = aggregator(vec![
            Arc::new(MockSource::new("a").with_price(0.0)),
            Arc::new(MockSource::new("b").with_price(f64::NAN)),
            Arc::new(MockSource::new("c").failing()),
        ]);
        let err = agg.aggregate("ZZZZ", Interval::OneMinute).await.unwrap_err();
        match err {
            PipelineError::DataUnavailable {
                symbol,
                attempted_sources,
            } => {
                assert_eq!(symbol, "ZZZZ");
                assert_eq!(attempted_sources, vec!["a", "b", "c"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let config = AggregatorConfig {
            call_timeout_secs: 1,
            ..Default::default()
        };
        let agg = DataAggregator::new(
            vec![
                Arc::new(MockSource::new("slow").with_price(10.0).slow(Duration::from_secs(30))),
                Arc::new(MockSource::new("fast").with_price(11.0)),
            ],
            config,
        );
        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();
        assert_eq!(snapshot.quote_source, "fast");
    }

    // ==================== History Tests ====================

    #[tokio::test]
    async fn test_empty_history_is_synthesized() {
        let agg = aggregator(vec![Arc::new(MockSource::new("only").with_price(50.0))]);
        let snapshot = agg.aggregate("AAPL", Interval::FifteenMinutes).await.unwrap();

        assert!(snapshot.is_synthesized());
        assert_eq!(snapshot.history.len(), 20);
        assert!(snapshot.history.as_slice().iter().all(|b| b.close == 50.0 && b.volume == 0.0));
        assert!((snapshot.open - 50.0).abs() < EPS);
        assert_eq!(snapshot.volume, 0.0);
        assert!((snapshot.technical.rsi_14 - 50.0).abs() < EPS);
        assert!(snapshot.multi_interval_context.is_empty());
    }

    #[tokio::test]
    async fn test_history_falls_back_by_priority() {
        let agg = aggregator(vec![
            Arc::new(MockSource::new("quotes-only").with_price(105.0)),
            Arc::new(MockSource::new("candles").with_bars(&[100.0, 102.0, 104.0])),
        ]);
        let snapshot = agg.aggregate("AAPL", Interval::FiveMinutes).await.unwrap();

        assert_eq!(snapshot.history_source.as_deref(), Some("candles"));
        assert_eq!(snapshot.history.len(), 3);
        assert!((snapshot.open - 100.0).abs() < EPS);
        // high includes the current price, low the lowest bar low
        assert!((snapshot.high - 105.0).abs() < EPS);
        assert!((snapshot.low - 99.0).abs() < EPS);
        assert!((snapshot.volume - 30.0).abs() < EPS);
        assert!((snapshot.technical.price_change_pct - 5.0).abs() < EPS);
    }

    #[tokio::test]
    async fn test_context_has_every_resolution() {
        let source = Arc::new(
            MockSource::new("full")
                .with_price(10.0)
                .with_bars(&[9.0, 9.5, 10.0]),
        );
        let agg = aggregator(vec![source.clone() as Arc<dyn MarketDataSource>]);
        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();

        assert_eq!(snapshot.multi_interval_context.len(), Resolution::CONTEXT.len());
        assert_eq!(snapshot.context_len(Resolution::OneHour), 3);
        assert_eq!(
            snapshot.multi_interval_context[&Resolution::FiveMinutes],
            vec![9.0, 9.5, 10.0]
        );
        // one primary history call plus five context calls
        assert_eq!(source.candle_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_failed_context_intervals_are_left_out() {
        let source = MockSource::new("partial")
            .with_price(10.0)
            .with_bars(&[9.0, 9.5, 10.0])
            .failing_for(&[Resolution::FiveMinutes, Resolution::ThirtyMinutes]);
        let agg = aggregator(vec![Arc::new(source)]);

        let snapshot = agg.aggregate("AAPL", Interval::OneHour).await.unwrap();

        let present: Vec<Resolution> = snapshot.multi_interval_context.keys().copied().collect();
        assert_eq!(
            present,
            vec![Resolution::OneMinute, Resolution::FifteenMinutes, Resolution::OneHour]
        );
        assert_eq!(snapshot.context_len(Resolution::FiveMinutes), 0);
        assert_eq!(snapshot.history_source.as_deref(), Some("partial"));
        assert!(!snapshot.is_synthesized());
    }

    #[tokio::test]
    async fn test_failed_context_interval_served_by_next_source() {
        let agg = aggregator(vec![
            Arc::new(
                MockSource::new("primary")
                    .with_price(10.0)
                    .with_bars(&[9.0, 10.0])
                    .failing_for(&[Resolution::FifteenMinutes]),
            ),
            Arc::new(MockSource::new("backup").with_bars(&[8.0, 8.5, 9.0])),
        ]);

        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();

        assert_eq!(snapshot.multi_interval_context.len(), Resolution::CONTEXT.len());
        assert_eq!(
            snapshot.multi_interval_context[&Resolution::FifteenMinutes],
            vec![8.0, 8.5, 9.0]
        );
        assert_eq!(snapshot.multi_interval_context[&Resolution::OneHour], vec![9.0, 10.0]);
    }

    // ==================== Order Book Tests ====================

    #[tokio::test]
    async fn test_order_book_feeds_features() {
        let book = OrderBookSnapshot {
            bids: vec![PriceLevel { price: 9.9, size: 80.0 }],
            asks: vec![PriceLevel { price: 10.1, size: 20.0 }],
        };
        let agg = aggregator(vec![Arc::new(MockSource::new("a").with_price(10.0))])
            .with_order_book(Arc::new(MockBook(Some(book))));
        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();

        assert!(snapshot.order_book.is_some());
        assert!((snapshot.technical.order_book_imbalance - 0.6).abs() < EPS);
    }

    #[tokio::test]
    async fn test_order_book_failure_degrades_to_zero() {
        let agg = aggregator(vec![Arc::new(MockSource::new("a").with_price(10.0))])
            .with_order_book(Arc::new(MockBook(None)));
        let snapshot = agg.aggregate("AAPL", Interval::OneMinute).await.unwrap();

        assert!(snapshot.order_book.is_none());
        assert_eq!(snapshot.technical.bid_ask_spread, 0.0);
        assert_eq!(snapshot.technical.order_book_imbalance, 0.0);
    }
}
