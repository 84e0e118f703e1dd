//! Telegram Bot API transport
//!
//! Long polling through `getUpdates` and replies through `sendMessage`.
//! Replies go out as Markdown first; when Telegram rejects the markup the
//! same text is resent as plain text.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shared::{component_debug, component_warn, Component, RequesterId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::ChatTransport;
use crate::types::{InboundMessage, InboundUpdate};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Seconds Telegram holds a `getUpdates` call open
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    from: Option<RawUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: i64,
}

impl RawUpdate {
    fn into_update(self) -> InboundUpdate {
        let message = self.message.and_then(|message| {
            let text = message.text?;
            let requester = message.from.map(|user| user.id).unwrap_or(message.chat.id);
            Some(InboundMessage {
                chat_id: message.chat.id,
                requester: RequesterId(requester),
                text,
            })
        });

        InboundUpdate {
            update_id: self.update_id,
            message,
        }
    }
}

pub struct RealTelegramTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
    poll_timeout: u64,
}

impl RealTelegramTransport {
    pub fn new(token: String) -> OrchestratorResult<Self> {
        Self::with_base_url(token, TELEGRAM_API_URL.to_string(), DEFAULT_POLL_TIMEOUT_SECS)
    }

    pub fn with_base_url(token: String, base_url: String, poll_timeout: u64) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn post_send(&self, body: serde_json::Value) -> OrchestratorResult<ApiResponse<serde_json::Value>> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatTransport for RealTelegramTransport {
    async fn fetch_updates(&self, offset: Option<i64>) -> OrchestratorResult<Vec<InboundUpdate>> {
        let mut body = json!({ "timeout": self.poll_timeout, "allowed_updates": ["message"] });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&body)
            .timeout(Duration::from_secs(self.poll_timeout + 10))
            .send()
            .await?;
        let parsed: ApiResponse<Vec<RawUpdate>> = response.json().await?;

        if !parsed.ok {
            return Err(OrchestratorError::TransportError {
                message: parsed.description.unwrap_or_else(|| "getUpdates failed".to_string()),
            });
        }

        let updates: Vec<InboundUpdate> = parsed
            .result
            .unwrap_or_default()
            .into_iter()
            .map(RawUpdate::into_update)
            .collect();
        if !updates.is_empty() {
            component_debug!(Component::Transport, "📥 {} update(s)", updates.len());
        }
        Ok(updates)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> OrchestratorResult<()> {
        let markdown = self
            .post_send(json!({ "chat_id": chat_id, "text": text, "parse_mode": "Markdown" }))
            .await?;
        if markdown.ok {
            return Ok(());
        }

        component_warn!(
            Component::Transport,
            "⚠️ Markdown rejected ({}), resending as plain text",
            markdown.description.as_deref().unwrap_or("no description")
        );
        let plain = self.post_send(json!({ "chat_id": chat_id, "text": text })).await?;
        if plain.ok {
            Ok(())
        } else {
            Err(OrchestratorError::TransportError {
                message: plain.description.unwrap_or_else(|| "sendMessage failed".to_string()),
            })
        }
    }
}
