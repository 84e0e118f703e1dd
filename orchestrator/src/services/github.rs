//! GitHub contents API publisher
//!
//! Creates or updates one file per call: a GET finds the current `sha` when
//! the file already exists, then a PUT commits the base64 content on `main`.
//! Reads decode the base64 `content` of the same GET.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::json;
use shared::{component_info, component_warn, BotError, BotResult, Component};
use url::Url;

use crate::error::OrchestratorResult;
use crate::traits::Publisher;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const PUBLISH_BRANCH: &str = "main";

fn publish_error(message: impl Into<String>) -> BotError {
    BotError::Publish {
        message: message.into(),
    }
}

pub struct RealGithubPublisher {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl RealGithubPublisher {
    pub fn new(token: Option<String>) -> OrchestratorResult<Self> {
        Self::with_base_url(token, GITHUB_API_URL.to_string())
    }

    pub fn with_base_url(token: Option<String>, base_url: String) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn token(&self) -> BotResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| publish_error("GITHUB_TOKEN not configured"))
    }

    fn contents_url(&self, repo: &str, path: &str) -> BotResult<Url> {
        Url::parse(&format!("{}/repos/{}/contents/{}", self.base_url, repo, path))
            .map_err(|e| publish_error(format!("invalid repository path {repo}/{path}: {e}")))
    }

    fn headers(&self, token: &str) -> BotResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| publish_error("GITHUB_TOKEN contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("content-bot"));
        Ok(headers)
    }

    async fn existing_sha(&self, url: &Url, headers: &HeaderMap) -> BotResult<Option<String>> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| publish_error(format!("GitHub request failed: {e}")))?;

        if !response.status().is_success() {
            return Ok(None);
        }
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| publish_error(format!("unreadable GitHub response: {e}")))?;
        Ok(body.get("sha").and_then(|sha| sha.as_str()).map(str::to_string))
    }
}

#[async_trait]
impl Publisher for RealGithubPublisher {
    async fn publish(&self, repo: &str, path: &str, content: &str, message: &str) -> BotResult<()> {
        let token = self.token()?;
        let url = self.contents_url(repo, path)?;
        let headers = self.headers(token)?;

        let sha = self.existing_sha(&url, &headers).await?;
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content.as_bytes()),
            "branch": PUBLISH_BRANCH,
        });
        if let Some(sha) = &sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .client
            .put(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| publish_error(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            component_info!(
                Component::Publisher,
                "🚀 Published {} to {} ({})",
                path,
                repo,
                if sha.is_some() { "updated" } else { "created" }
            );
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            component_warn!(Component::Publisher, "❌ GitHub publish failed: {} {}", status.as_u16(), text);
            Err(publish_error(format!(
                "GitHub publish failed: HTTP {} {}",
                status.as_u16(),
                text.chars().take(200).collect::<String>()
            )))
        }
    }

    async fn fetch(&self, repo: &str, path: &str) -> BotResult<Option<String>> {
        let url = self.contents_url(repo, path)?;
        let headers = self.headers(self.token()?)?;

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| publish_error(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(publish_error(format!("GitHub read of {path} failed: HTTP {}", status.as_u16())));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| publish_error(format!("unreadable GitHub response: {e}")))?;
        // the API wraps base64 at 60 columns
        let encoded: String = body
            .get("content")
            .and_then(|content| content.as_str())
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| publish_error(format!("{path} is not valid base64: {e}")))?;

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| publish_error(format!("{path} is not UTF-8 text")))
    }
}
