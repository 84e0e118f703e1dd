//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::content::ContentPayload;
use crate::errors::BotError;

/// Component identifier attached to every structured log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Command dispatch and access control
    Bot,
    /// Chat transport polling loop
    Transport,
    /// Batch and weekly orchestration
    Orchestrator,
    /// Generative API client
    Generator,
    /// Repository publishing
    Publisher,
    /// News feed polling
    News,
    /// Usage ledger and its stores
    Usage,
    /// Unattended news-to-blog publishing
    AutoUpdate,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Bot => "bot",
            Component::Transport => "transport",
            Component::Orchestrator => "orchestrator",
            Component::Generator => "generator",
            Component::Publisher => "publisher",
            Component::News => "news",
            Component::Usage => "usage",
            Component::AutoUpdate => "auto_update",
        };
        f.write_str(name)
    }
}

/// Identity of the chat user issuing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequesterId(pub i64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The seven content formats the bot can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Tiktok,
    Carousel,
    Caption,
    Whatsapp,
    FbPost,
    Story,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Blog,
        ContentType::Tiktok,
        ContentType::Carousel,
        ContentType::Caption,
        ContentType::Whatsapp,
        ContentType::FbPost,
        ContentType::Story,
    ];

    /// Command-style name, also used in prompts and stats
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Tiktok => "tiktok",
            ContentType::Carousel => "carousel",
            ContentType::Caption => "caption",
            ContentType::Whatsapp => "whatsapp",
            ContentType::FbPost => "fbpost",
            ContentType::Story => "story",
        }
    }

    /// Human label used in report headings
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Blog => "Blog articles",
            ContentType::Tiktok => "TikTok scripts",
            ContentType::Carousel => "Carousels",
            ContentType::Caption => "Captions",
            ContentType::Whatsapp => "WhatsApp messages",
            ContentType::FbPost => "Facebook posts",
            ContentType::Story => "Stories",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == normalized)
            .ok_or_else(|| BotError::InvalidContentType { input: s.to_string() })
    }
}

/// Campaign phase driving the tone of every prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignPhase {
    PreBoe,
    BoeWeek,
    AppsOpen,
    FinalPush,
}

impl CampaignPhase {
    pub const ALL: [CampaignPhase; 4] = [
        CampaignPhase::PreBoe,
        CampaignPhase::BoeWeek,
        CampaignPhase::AppsOpen,
        CampaignPhase::FinalPush,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignPhase::PreBoe => "pre_boe",
            CampaignPhase::BoeWeek => "boe_week",
            CampaignPhase::AppsOpen => "apps_open",
            CampaignPhase::FinalPush => "final_push",
        }
    }

    pub fn tone(&self) -> &'static str {
        match self {
            CampaignPhase::PreBoe => "educational, trust-building",
            CampaignPhase::BoeWeek => "urgent but not panicky",
            CampaignPhase::AppsOpen => "conversion-focused",
            CampaignPhase::FinalPush => "last chance",
        }
    }

    pub fn urgency(&self) -> &'static str {
        match self {
            CampaignPhase::PreBoe => "low",
            CampaignPhase::BoeWeek => "high",
            CampaignPhase::AppsOpen => "medium",
            CampaignPhase::FinalPush => "maximum",
        }
    }

    /// Recommended talking points for the phase
    pub fn talking_points(&self) -> &'static [&'static str] {
        match self {
            CampaignPhase::PreBoe => &[
                "get ready",
                "prepare your documents now",
                "understand the process",
            ],
            CampaignPhase::BoeWeek => &[
                "it's official",
                "the law has been published",
                "act now to secure your spot",
                "no job offer needed thanks to the vulnerability clause",
            ],
            CampaignPhase::AppsOpen => &[
                "testimonials and social proof",
                "limited slots remaining",
                "early starters are already getting approvals",
            ],
            CampaignPhase::FinalPush => &[
                "daily countdown to the June 30 deadline",
                "this opportunity may not come again for another 20 years",
            ],
        }
    }
}

impl fmt::Display for CampaignPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignPhase {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        CampaignPhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| BotError::InvalidPhase { input: s.to_string() })
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub content_type: ContentType,
    pub topic: Option<String>,
    pub requester: RequesterId,
}

/// API failure reasons for generative API requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// Authentication failed (invalid or missing API key, forbidden)
    AuthenticationFailed,
    /// Rate limit exceeded, with the server's suggested wait if any
    RateLimitExceeded { retry_after: Option<Duration> },
    /// Invalid request format or parameters
    InvalidRequest(String),
    /// Content policy violation
    ContentPolicyViolation(String),
    /// Network/connection error
    NetworkError(String),
    /// Server error from provider (5xx, overloaded)
    ServerError(u16),
    /// The provider answered but without any text
    EmptyCompletion,
}

impl ApiFailure {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiFailure::RateLimitExceeded { .. } | ApiFailure::NetworkError(_) | ApiFailure::ServerError(_)
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiFailure::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::AuthenticationFailed => write!(f, "authentication failed"),
            ApiFailure::RateLimitExceeded { .. } => write!(f, "rate limit exceeded"),
            ApiFailure::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            ApiFailure::ContentPolicyViolation(msg) => write!(f, "content policy violation: {msg}"),
            ApiFailure::NetworkError(msg) => write!(f, "network error: {msg}"),
            ApiFailure::ServerError(status) => write!(f, "server error (HTTP {status})"),
            ApiFailure::EmptyCompletion => write!(f, "empty completion"),
        }
    }
}

/// Lifecycle of one request inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed)
    }
}

/// Outcome of a single generation
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Succeeded(ContentPayload),
    Failed(BotError),
}

/// One entry of a batch report, tagged with its original position
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub index: usize,
    pub request: ContentRequest,
    pub outcome: GenerationOutcome,
    pub latency: Duration,
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Succeeded(_))
    }

    pub fn state(&self) -> RequestState {
        if self.is_success() {
            RequestState::Succeeded
        } else {
            RequestState::Failed
        }
    }
}

/// Final status of a batch once collection ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Complete,
    Partial,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Complete => write!(f, "complete"),
            BatchStatus::Partial => write!(f, "partial"),
        }
    }
}

/// Aggregated, order-preserving result of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub content_type: ContentType,
    pub results: Vec<GenerationResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub status: BatchStatus,
}

impl BatchReport {
    /// Build a report from results already sorted by index
    pub fn from_results(content_type: ContentType, results: Vec<GenerationResult>, elapsed: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        let status = if failed == 0 { BatchStatus::Complete } else { BatchStatus::Partial };

        Self {
            content_type,
            results,
            succeeded,
            failed,
            elapsed,
            status,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}
