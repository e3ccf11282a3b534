//! Builds the configured collaborators in priority order.

use crate::finnhub::FinnhubSource;
use crate::gemini::GeminiClient;
use crate::http::HttpClientConfig;
use crate::yahoo::YahooFinanceSource;
use anyhow::{Context, Result};
use market_pulse_core::config::{SOURCE_FINNHUB, SOURCE_YAHOO};
use market_pulse_core::{LanguageModel, LlmConfig, MarketDataSource, ProvidersConfig};
use std::sync::Arc;

/// Instantiates market data sources in `config.priority` order.
///
/// Finnhub is skipped without an API key. Unknown and duplicate names are skipped with
/// a warning.
///
/// # Errors
/// Returns error if no source could be built or an HTTP client fails to build.
pub fn market_sources(config: &ProvidersConfig) -> Result<Vec<Arc<dyn MarketDataSource>>> {
    let http = |base_url: &str| {
        HttpClientConfig::new(base_url)
            .with_rate_limit(config.requests_per_minute)
            .with_timeout_secs(config.timeout_secs)
    };

    let mut sources: Vec<Arc<dyn MarketDataSource>> = Vec::new();
    for name in &config.priority {
        if sources.iter().any(|s| s.name() == name.as_str()) {
            tracing::warn!(source = %name, "duplicate source in priority list, skipping");
            continue;
        }

        match name.as_str() {
            SOURCE_YAHOO => {
                let source = YahooFinanceSource::new(http(&config.yahoo_base_url))
                    .context("failed to build yahoo source")?;
                sources.push(Arc::new(source));
            }
            SOURCE_FINNHUB => match config.finnhub_api_key.as_deref().map(str::trim) {
                Some(key) if !key.is_empty() => {
                    let source = FinnhubSource::new(http(&config.finnhub_base_url), key)
                        .context("failed to build finnhub source")?;
                    sources.push(Arc::new(source));
                }
                _ => tracing::warn!("FINNHUB_API_KEY not set, finnhub source disabled"),
            },
            other => tracing::warn!(source = %other, "unknown market data source, skipping"),
        }
    }

    if sources.is_empty() {
        anyhow::bail!("no market data source is enabled (priority: {:?})", config.priority);
    }

    tracing::info!(
        sources = ?sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
        "market data sources ready"
    );
    Ok(sources)
}

/// Builds the language model client, or `None` when no API key is configured.
///
/// # Errors
/// Returns error if a key is configured but the HTTP client fails to build.
pub fn language_model(config: &LlmConfig) -> Result<Option<Arc<dyn LanguageModel>>> {
    if !config.is_configured() {
        tracing::info!("GEMINI_API_KEY not set, using heuristic insights");
        return Ok(None);
    }
    let client = GeminiClient::from_config(config).context("failed to build gemini client")?;
    Ok(Some(Arc::new(client)))
}
