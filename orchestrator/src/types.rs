//! Orchestrator-level types shared between the core and the services

use std::time::Duration;

use shared::{BatchReport, ContentType, RequesterId};

/// A text message received from the chat transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub requester: RequesterId,
    pub text: String,
}

/// One transport update. Updates without a usable message still advance the
/// polling offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: i64,
    pub message: Option<InboundMessage>,
}

/// A decoded `/command arg1 arg2` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub chat_id: i64,
    pub requester: RequesterId,
    pub name: String,
    pub args: Vec<String>,
}

impl InboundCommand {
    /// Parse a message text; `None` when it is not a command.
    ///
    /// A `@botname` suffix on the command is dropped and the name is
    /// lowercased.
    pub fn parse(message: &InboundMessage) -> Option<Self> {
        let text = message.text.trim();
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            chat_id: message.chat_id,
            requester: message.requester,
            name,
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// Input to one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSpec {
    pub content_type: ContentType,
    pub count: usize,
    /// Topic per position; positions past the end get a suggested topic
    pub topics: Option<Vec<String>>,
    pub requester: RequesterId,
}

impl BatchSpec {
    pub fn new(content_type: ContentType, count: usize, requester: RequesterId) -> Self {
        Self {
            content_type,
            count,
            topics: None,
            requester,
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = Some(topics);
        self
    }

    pub fn topic_for(&self, index: usize) -> Option<String> {
        self.topics
            .as_ref()
            .and_then(|topics| topics.get(index))
            .filter(|topic| !topic.trim().is_empty())
            .cloned()
    }
}

/// Seven batch reports making up the weekly pack
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub sections: Vec<BatchReport>,
    pub elapsed: Duration,
}

impl WeeklyReport {
    pub fn total(&self) -> usize {
        self.sections.iter().map(BatchReport::total).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.sections.iter().map(|s| s.succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.sections.iter().map(|s| s.failed).sum()
    }
}
