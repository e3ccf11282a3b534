//! Google Gemini `generateContent` client.

use crate::http::{HttpClientConfig, RateLimitedClient};
use async_trait::async_trait;
use market_pulse_core::{LanguageModel, LlmConfig, UpstreamError, UpstreamResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiClient {
    client: RateLimitedClient,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    /// Returns [`UpstreamError::NotConfigured`] when no API key is set.
    pub fn from_config(config: &LlmConfig) -> UpstreamResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| UpstreamError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;

        let http = HttpClientConfig::new(&config.base_url)
            .with_rate_limit(config.requests_per_minute)
            .with_timeout_secs(config.timeout_secs);

        Ok(Self {
            client: RateLimitedClient::new(http)?,
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> UpstreamResult<String> {
        let method = format!("{}:generateContent", self.model);
        let url = self.client.endpoint(&["models", method.as_str()])?;
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json",
            },
        };

        let response: GenerateResponse = self
            .client
            .post_json(url, &[("key", self.api_key.clone())], &body)
            .await?;

        response
            .into_text()
            .ok_or_else(|| UpstreamError::Parse("response contained no text candidate".to_string()))
    }
}
