//! Transport polling loop
//!
//! Fetches updates, advances the offset past every update received, and
//! hands each command to its own task so a long batch never blocks polling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use generator::CompletionApi;
use shared::{component_debug, component_warn, logging, Component};
use tokio::task::JoinHandle;

use crate::bot::ContentBot;
use crate::core::access::UNAUTHORIZED_REPLY;
use crate::error::OrchestratorResult;
use crate::traits::ChatTransport;
use crate::types::{InboundCommand, InboundMessage, InboundUpdate};

/// Pause after a failed poll before trying again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct BotRunner<A: CompletionApi + 'static> {
    bot: Arc<ContentBot<A>>,
    transport: Arc<dyn ChatTransport>,
}

impl<A: CompletionApi + 'static> BotRunner<A> {
    pub fn new(bot: Arc<ContentBot<A>>, transport: Arc<dyn ChatTransport>) -> Self {
        Self { bot, transport }
    }

    /// Poll until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> OrchestratorResult<()>
    where
        F: Future<Output = ()>,
    {
        logging::log_startup(Component::Transport, "long polling");
        tokio::pin!(shutdown);
        let mut offset = None;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    logging::log_shutdown(Component::Transport, "shutdown requested");
                    return Ok(());
                }
                polled = self.poll_once(offset) => match polled {
                    Ok((next, _handles)) => offset = next,
                    Err(e) => {
                        logging::log_error(Component::Transport, "Polling", &e);
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }
        }
    }

    /// One `getUpdates` round. Returns the next offset and the spawned
    /// handler tasks.
    pub async fn poll_once(&self, offset: Option<i64>) -> OrchestratorResult<(Option<i64>, Vec<JoinHandle<()>>)> {
        let updates = self.transport.fetch_updates(offset).await?;
        let next = updates.iter().map(|u| u.update_id + 1).max().or(offset);

        let handles = updates.into_iter().filter_map(|update| self.dispatch(update)).collect();
        Ok((next, handles))
    }

    fn dispatch(&self, update: InboundUpdate) -> Option<JoinHandle<()>> {
        let message = update.message?;
        let bot = self.bot.clone();
        let transport = self.transport.clone();

        Some(tokio::spawn(async move {
            match InboundCommand::parse(&message) {
                Some(command) => {
                    let chat_id = command.chat_id;
                    let notes = transport.clone();
                    let replies = bot
                        .handle_with_progress(&command, move |note: String| async move {
                            deliver(notes.as_ref(), chat_id, &note).await;
                        })
                        .await;
                    for reply in replies {
                        deliver(transport.as_ref(), chat_id, &reply).await;
                    }
                }
                None => reply_to_text(&bot, transport.as_ref(), &message).await,
            }
        }))
    }
}

/// Plain text from outsiders gets the private-bot reply; team chatter is ignored
async fn reply_to_text<A: CompletionApi + 'static>(
    bot: &ContentBot<A>,
    transport: &dyn ChatTransport,
    message: &InboundMessage,
) {
    if bot.is_authorized(message.requester) {
        component_debug!(Component::Transport, "💬 Ignoring plain text from {}", message.requester);
    } else {
        deliver(transport, message.chat_id, UNAUTHORIZED_REPLY).await;
    }
}

async fn deliver(transport: &dyn ChatTransport, chat_id: i64, text: &str) {
    if let Err(e) = transport.send_message(chat_id, text).await {
        component_warn!(Component::Transport, "⚠️ Could not deliver reply to {}: {}", chat_id, e);
    }
}
