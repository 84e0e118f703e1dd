//! Anthropic Messages API client
//!
//! Performs one HTTP call per `complete` and classifies every non-success
//! into an [`ApiFailure`] so the retry state machine can tell transient
//! failures from terminal ones.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use shared::{component_debug, ApiFailure, Component};

use crate::error::{GeneratorError, GeneratorResult};
use crate::traits::CompletionApi;
use crate::types::{Completion, CompletionRequest};

/// Production endpoint
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Real generative API backed by Anthropic
pub struct RealCompletionApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl RealCompletionApi {
    pub fn new(api_key: String) -> GeneratorResult<Self> {
        Self::with_base_url(api_key, ANTHROPIC_API_URL.to_string())
    }

    /// Point the client at another host (used against mock servers)
    pub fn with_base_url(api_key: String, base_url: String) -> GeneratorResult<Self> {
        if api_key.trim().is_empty() {
            return Err(GeneratorError::ConfigError {
                message: "API key is empty".to_string(),
            });
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Read a `retry-after` header given in seconds
    pub fn extract_retry_after(headers: &HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Map an error status and body to a failure class
    pub fn classify_status(status: u16, headers: &HeaderMap, body: &str) -> ApiFailure {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());

        match status {
            401 | 403 => ApiFailure::AuthenticationFailed,
            429 => ApiFailure::RateLimitExceeded {
                retry_after: Self::extract_retry_after(headers),
            },
            400 if message.to_lowercase().contains("policy") => ApiFailure::ContentPolicyViolation(message),
            500..=599 => ApiFailure::ServerError(status),
            _ => ApiFailure::InvalidRequest(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl CompletionApi for RealCompletionApi {
    async fn complete(&self, request: &CompletionRequest, timeout: Duration) -> Result<Completion, ApiFailure> {
        let mut request_body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [
                {
                    "role": "user",
                    "content": request.user
                }
            ]
        });
        if let Some(temperature) = request.temperature {
            request_body["temperature"] = serde_json::json!(temperature);
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiFailure::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status.as_u16(), &headers, &body));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiFailure::NetworkError(format!("Failed to read response: {e}")))?;

        let text = response_json
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|item| item.get("text"))
            .and_then(|text| text.as_str())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ApiFailure::EmptyCompletion);
        }

        let usage = response_json.get("usage");
        let input_tokens = usage
            .and_then(|u| u.get("input_tokens"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;
        let output_tokens = usage
            .and_then(|u| u.get("output_tokens"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;

        component_debug!(
            Component::Generator,
            "📥 Completion received ({} in / {} out tokens)",
            input_tokens,
            output_tokens
        );

        Ok(Completion {
            text: text.to_string(),
            input_tokens,
            output_tokens,
            model: request.model.clone(),
        })
    }
}
