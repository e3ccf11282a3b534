//! predict CLI command.
//!
//! Runs the pipeline once and prints a JSON envelope on stdout. Logs go to stderr, so
//! the output can be piped straight into another tool.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use market_pulse_core::{ConfigLoader, PipelineError, PredictionReport};
use market_pulse_providers::{language_model, market_sources, EmptyNewsFeed};
use market_pulse_signals::PredictionPipeline;
use serde_json::{json, Value};
use std::sync::Arc;

/// Arguments for the predict command.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Ticker symbol (e.g., "AAPL", "BBCA.JK")
    #[arg(short, long)]
    pub symbol: String,

    /// Prediction interval (1m, 5m, 10m, 15m, 30m, 1h)
    #[arg(short, long, default_value = "5m")]
    pub interval: String,

    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Wraps a report as `{"success": true, "risk_reward_ratio": .., "report": ..}`.
///
/// # Errors
/// Returns error if the report cannot be serialized.
pub fn success_envelope(report: &PredictionReport) -> Result<Value> {
    Ok(json!({
        "success": true,
        "risk_reward_ratio": report.prediction.risk_reward_ratio(),
        "report": serde_json::to_value(report)?,
    }))
}

#[must_use]
pub fn error_envelope(error: &PipelineError, timestamp: DateTime<Utc>) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "code": error.code(),
        "timestamp": timestamp.to_rfc3339(),
    })
}

/// Runs one prediction and prints the envelope. Returns whether a prediction was produced.
///
/// # Errors
/// Returns error if configuration or collaborators cannot be set up. Pipeline failures
/// are printed as an error envelope instead.
pub async fn run_predict(args: PredictArgs) -> Result<bool> {
    let config = ConfigLoader::load_from(&args.config)?;
    let sources = market_sources(&config.providers)?;
    let model = language_model(&config.llm)?;

    let pipeline = PredictionPipeline::from_config(&config, sources, model)
        .with_news_feed(Arc::new(EmptyNewsFeed));

    let (envelope, produced) = match pipeline.run(&args.symbol, &args.interval).await {
        Ok(report) => (success_envelope(&report)?, true),
        Err(e) => {
            tracing::error!("Prediction for {} failed: {}", args.symbol, e);
            (error_envelope(&e, Utc::now()), false)
        }
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{output}");

    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_pulse_core::ValidationError;

    #[test]
    fn test_error_envelope_shape() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let err = PipelineError::data_unavailable("ZZZZ", vec!["yahoo".to_string()]);
        let envelope = error_envelope(&err, ts);

        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["code"], "DATA_UNAVAILABLE");
        assert!(envelope["error"].as_str().unwrap().contains("ZZZZ"));
        assert_eq!(envelope["timestamp"], "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_validation_error_code() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let err = PipelineError::from(ValidationError::InvalidInterval("2h".to_string()));
        assert_eq!(error_envelope(&err, ts)["code"], "INVALID_INTERVAL");
    }
}
