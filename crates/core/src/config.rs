use crate::policy::ScoringPolicy;
use serde::{Deserialize, Serialize};

/// Name of the Yahoo Finance market data source.
pub const SOURCE_YAHOO: &str = "yahoo";
/// Name of the Finnhub market data source.
pub const SOURCE_FINNHUB: &str = "finnhub";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub llm: LlmConfig,
    pub aggregator: AggregatorConfig,
    pub policy: ScoringPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo_base_url: String,
    pub finnhub_base_url: String,
    pub finnhub_api_key: Option<String>,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
    /// Source names, highest priority first.
    pub priority: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com/v8/finance".to_string(),
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            finnhub_api_key: None,
            timeout_secs: 10,
            requests_per_minute: 60,
            priority: vec![SOURCE_FINNHUB.to_string(), SOURCE_YAHOO.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Without a key the heuristic insight path is used.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            requests_per_minute: 15,
        }
    }
}

impl LlmConfig {
    /// True when an API key is present and non-blank.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Length of the flat series synthesized when no history is available.
    pub synthetic_bars: usize,
    /// Upper bound on any single collaborator call.
    pub call_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            synthetic_bars: 20,
            call_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.providers.priority, vec!["finnhub", "yahoo"]);
        assert_eq!(config.providers.timeout_secs, 10);
        assert_eq!(config.aggregator.synthetic_bars, 20);
        assert_eq!(config.llm.model, "gemini-2.0-flash-exp");
        assert!(!config.llm.is_configured());
    }

    #[test]
    fn test_blank_llm_key_is_not_configured() {
        let llm = LlmConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!llm.is_configured());
    }
}
