//! Environment configuration
//!
//! Values come from the process environment after loading a `.env` file if
//! one exists. Environment variables take precedence over `.env` values.
//!
//! ## Required Keys
//! - `TELEGRAM_TOKEN`: bot token for the chat transport
//! - `CLAUDE_API_KEY`: generative API key
//!
//! The `auto-update` run needs `CLAUDE_API_KEY` and `GITHUB_TOKEN` instead;
//! without `TELEGRAM_TOKEN` it publishes without notifying the team.
//!
//! ## Optional Keys
//! - `TEAM_CHAT_IDS`: comma-separated user ids allowed to use the bot
//! - `GITHUB_TOKEN`, `GITHUB_REPO_PH`, `GITHUB_REPO_TP`: blog publishing
//! - `CLAUDE_MODEL`, `MAX_ATTEMPTS`: generation client
//! - `BATCH_CONCURRENCY`, `REQUEST_TIMEOUT_SECS`, `BATCH_DEADLINE_SECS`: batches
//! - `USAGE_STORE_PATH`: JSON usage ledger; in-memory when unset
//! - `BOE_DATE`: decree publication date (`YYYY-MM-DD`)
//! - `UPDATE_STATE_PATH`: local file for the auto-update seen list; kept in
//!   the campaign repository when unset

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use generator::{ClientSettings, RetryPolicy, DEFAULT_MODEL};
use shared::RequesterId;

use crate::core::batch::BatchSettings;
use crate::core::publishing::PublishRepos;
use crate::error::{OrchestratorError, OrchestratorResult};

const REQUIRED_KEYS: &[&str] = &["TELEGRAM_TOKEN", "CLAUDE_API_KEY"];
const AUTO_UPDATE_KEYS: &[&str] = &["CLAUDE_API_KEY", "GITHUB_TOKEN"];

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub telegram_token: String,
    pub claude_api_key: String,
    pub team: Vec<RequesterId>,
    pub github_token: Option<String>,
    pub repos: PublishRepos,
    pub model: String,
    pub max_attempts: u32,
    pub batch: BatchSettings,
    pub usage_store_path: Option<PathBuf>,
    pub update_state_path: Option<PathBuf>,
    pub boe_date: Option<NaiveDate>,
}

impl BotConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> OrchestratorResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with the keys the auto-update run needs
    pub fn auto_update_from_env() -> OrchestratorResult<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup_requiring(|key| std::env::var(key).ok(), AUTO_UPDATE_KEYS)
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_requiring(lookup, REQUIRED_KEYS)
    }

    pub fn from_lookup_requiring<F>(lookup: F, required: &[&str]) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<String> = required
            .iter()
            .filter(|key| get(**key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(OrchestratorError::MissingKeys { keys: missing });
        }

        let defaults = PublishRepos::default();
        let batch_defaults = BatchSettings::default();

        Ok(Self {
            telegram_token: get("TELEGRAM_TOKEN").unwrap_or_default(),
            claude_api_key: get("CLAUDE_API_KEY").unwrap_or_default(),
            team: parse_team(get("TEAM_CHAT_IDS").as_deref().unwrap_or(""))?,
            github_token: get("GITHUB_TOKEN"),
            repos: PublishRepos {
                ph: get("GITHUB_REPO_PH").unwrap_or(defaults.ph),
                tp: get("GITHUB_REPO_TP").unwrap_or(defaults.tp),
            },
            model: get("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_attempts: parse_or("MAX_ATTEMPTS", get("MAX_ATTEMPTS"), RetryPolicy::default().max_attempts)?,
            batch: BatchSettings {
                concurrency: parse_or("BATCH_CONCURRENCY", get("BATCH_CONCURRENCY"), batch_defaults.concurrency)?,
                request_timeout: Duration::from_secs(parse_or(
                    "REQUEST_TIMEOUT_SECS",
                    get("REQUEST_TIMEOUT_SECS"),
                    batch_defaults.request_timeout.as_secs(),
                )?),
                batch_deadline: Duration::from_secs(parse_or(
                    "BATCH_DEADLINE_SECS",
                    get("BATCH_DEADLINE_SECS"),
                    batch_defaults.batch_deadline.as_secs(),
                )?),
            },
            usage_store_path: get("USAGE_STORE_PATH").map(PathBuf::from),
            update_state_path: get("UPDATE_STATE_PATH").map(PathBuf::from),
            boe_date: get("BOE_DATE")
                .map(|raw| {
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| OrchestratorError::ConfigurationError {
                        message: format!("BOE_DATE '{raw}' is not YYYY-MM-DD: {e}"),
                    })
                })
                .transpose()?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            model: self.model.clone(),
            retry: self.retry_policy(),
            ..ClientSettings::default()
        }
    }
}

/// Parse an optional value, keeping `default` when it is unset
fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> OrchestratorResult<T> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| OrchestratorError::ConfigurationError {
            message: format!("{key} has an invalid value '{raw}'"),
        }),
    }
}

fn parse_team(raw: &str) -> OrchestratorResult<Vec<RequesterId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i64>()
                .map(RequesterId)
                .map_err(|_| OrchestratorError::ConfigurationError {
                    message: format!("TEAM_CHAT_IDS entry '{id}' is not a number"),
                })
        })
        .collect()
}
