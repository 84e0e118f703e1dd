//! Command dispatch
//!
//! `ContentBot` owns the process-wide state (phase override, usage counters,
//! cached articles) and turns one decoded command into the reply messages.
//! Access is checked before anything else; generation commands share a single
//! busy gate so a second batch is refused while one is running.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use generator::{ClientSettings, CompletionApi, GenerationClient, PromptBuilder, TopicSource};
use shared::{
    component_debug, component_info, component_warn, BatchReport, BotError, CampaignPhase, Component, ContentPayload,
    ContentType, GenerationOutcome, NewsAnalysis, RequesterId, TopicSuggestions,
};
use tokio::sync::Mutex;

use crate::core::access::{AccessGuard, UNAUTHORIZED_REPLY};
use crate::core::articles::ArticleCache;
use crate::core::batch::{BatchOrchestrator, BatchSettings};
use crate::core::commands::{self, BatchPreset, CommandAction, CommandSpec};
use crate::core::phase::{CampaignCalendar, PhaseTracker};
use crate::core::publishing::{self, PublishRepos};
use crate::core::render::{self, escape_md, ArticleIds, StatsView, TELEGRAM_MAX_LEN};
use crate::core::usage::UsageTracker;
use crate::core::weekly::WeeklyComposer;
use crate::error::OrchestratorResult;
use crate::traits::{Clock, NewsSource, Publisher, UsageStore};
use crate::types::{BatchSpec, InboundCommand};

pub const BUSY_REPLY: &str = "⏳ Still working on the previous request. Try again when it finishes.";

/// Static bot configuration
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub team: Vec<RequesterId>,
    pub calendar: CampaignCalendar,
    pub client: ClientSettings,
    pub batch: BatchSettings,
    pub repos: PublishRepos,
    /// Override applied at startup, as if `/phase` had been sent
    pub initial_phase: Option<CampaignPhase>,
    /// Minimum gap between two `/weekly` runs without `confirm`
    pub weekly_cooldown: Duration,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            team: Vec::new(),
            calendar: CampaignCalendar::default(),
            client: ClientSettings::default(),
            batch: BatchSettings::default(),
            repos: PublishRepos::default(),
            initial_phase: None,
            weekly_cooldown: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// External collaborators of the bot
pub struct BotServices<A: CompletionApi> {
    pub api: Arc<A>,
    pub topics: Arc<dyn TopicSource>,
    pub clock: Arc<dyn Clock>,
    pub usage_store: Arc<dyn UsageStore>,
    pub publisher: Arc<dyn Publisher>,
    pub news: Arc<dyn NewsSource>,
}

pub struct ContentBot<A: CompletionApi + 'static> {
    guard: AccessGuard,
    phase: Arc<PhaseTracker>,
    usage: Arc<UsageTracker>,
    client: Arc<GenerationClient<A>>,
    prompts: PromptBuilder,
    batches: Arc<BatchOrchestrator<A>>,
    weekly: WeeklyComposer<BatchOrchestrator<A>>,
    articles: ArticleCache,
    publisher: Arc<dyn Publisher>,
    news: Arc<dyn NewsSource>,
    clock: Arc<dyn Clock>,
    repos: PublishRepos,
    request_timeout: Duration,
    weekly_cooldown: Duration,
    busy: Mutex<()>,
}

impl<A: CompletionApi + 'static> ContentBot<A> {
    /// Wire the bot and load the usage ledger
    pub async fn initialize(settings: BotSettings, services: BotServices<A>) -> OrchestratorResult<Self> {
        let usage = Arc::new(UsageTracker::initialize(services.usage_store).await?);
        let phase = Arc::new(PhaseTracker::new(settings.calendar, services.clock.clone()));
        if let Some(initial) = settings.initial_phase {
            phase.set_override(initial).await;
        }

        let client = Arc::new(GenerationClient::new(services.api, settings.client));
        let prompts = PromptBuilder::new(services.topics);
        let batches = Arc::new(BatchOrchestrator::new(
            client.clone(),
            prompts.clone(),
            phase.clone(),
            usage.clone(),
            services.clock.clone(),
            settings.batch.clone(),
        ));

        let guard = AccessGuard::new(settings.team);
        component_info!(
            Component::Bot,
            "🤖 Bot ready: {} team member(s), phase {}",
            guard.team_size(),
            phase.current_phase().await
        );

        Ok(Self {
            guard,
            weekly: WeeklyComposer::new(batches.clone()),
            phase,
            usage,
            client,
            prompts,
            batches,
            articles: ArticleCache::default(),
            publisher: services.publisher,
            news: services.news,
            clock: services.clock,
            repos: settings.repos,
            request_timeout: settings.batch.request_timeout,
            weekly_cooldown: settings.weekly_cooldown,
            busy: Mutex::new(()),
        })
    }

    pub fn phase(&self) -> &PhaseTracker {
        &self.phase
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn articles(&self) -> &ArticleCache {
        &self.articles
    }

    pub fn batches(&self) -> &BatchOrchestrator<A> {
        &self.batches
    }

    pub fn is_authorized(&self, requester: RequesterId) -> bool {
        self.guard.authorize(requester)
    }

    /// Handle one command and return the replies, each within the transport
    /// length limit.
    pub async fn handle(&self, command: &InboundCommand) -> Vec<String> {
        self.handle_with_progress(command, |_| std::future::ready(())).await
    }

    /// Same as [`handle`](Self::handle), and a generating command that wins
    /// the busy gate hands its progress note to `progress` before the work
    /// starts. The note is emitted while the gate is held, so a refused
    /// command never gets one.
    pub async fn handle_with_progress<F, Fut>(&self, command: &InboundCommand, progress: F) -> Vec<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        if !self.is_authorized(command.requester) {
            let refusal = BotError::Unauthorized {
                requester: command.requester,
            };
            component_warn!(Component::Bot, "🚫 /{} refused: {}", command.name, refusal);
            return vec![UNAUTHORIZED_REPLY.to_string()];
        }

        let replies = match commands::lookup(&command.name) {
            None => vec![format!(
                "Unknown command /{}. Type /help to see all commands.",
                escape_md(&command.name)
            )],
            Some(spec) if spec.action.generates() => match self.busy.try_lock() {
                Ok(_gate) => {
                    if let Some(note) = progress_note(spec.action) {
                        progress(note).await;
                    }
                    self.dispatch(spec, command).await
                }
                Err(_) => {
                    component_debug!(Component::Bot, "⏳ /{} refused, bot busy", command.name);
                    vec![BUSY_REPLY.to_string()]
                }
            },
            Some(spec) => self.dispatch(spec, command).await,
        };

        replies
            .iter()
            .flat_map(|reply| render::split_message(reply, TELEGRAM_MAX_LEN))
            .collect()
    }

    async fn dispatch(&self, spec: &CommandSpec, command: &InboundCommand) -> Vec<String> {
        component_info!(Component::Bot, "📨 /{} from {}", spec.name, command.requester);

        match spec.action {
            CommandAction::Start => vec![self.start_text().await],
            CommandAction::Help => vec![commands::help_text()],
            CommandAction::Single(content_type) => {
                let topic = commands::resolve_topic(spec.shape, &command.args);
                self.single(content_type, topic, command).await
            }
            CommandAction::Batch(preset) => self.batch(preset, command).await,
            CommandAction::Weekly => self.weekly(command).await,
            CommandAction::News => self.news().await,
            CommandAction::Topics => self.topics().await,
            CommandAction::Stats => vec![self.stats().await],
            CommandAction::Phase => vec![self.set_phase(&command.args).await],
            CommandAction::Publish => vec![self.publish(&command.args).await],
        }
    }

    async fn start_text(&self) -> String {
        format!(
            "🤖 *Content Bot*\n\nAI Content Factory for tuspapeles2026.es\nPhase: *{}*\n\nType /help to see all commands.",
            escape_md(self.phase.current_phase().await.as_str())
        )
    }

    async fn cache_articles(&self, report: &BatchReport) -> ArticleIds {
        let mut ids = ArticleIds::new();
        for result in &report.results {
            if let GenerationOutcome::Succeeded(ContentPayload::Blog(article)) = &result.outcome {
                ids.insert(result.index, self.articles.insert(article.clone()).await);
            }
        }
        ids
    }

    async fn single(&self, content_type: ContentType, topic: Option<String>, command: &InboundCommand) -> Vec<String> {
        let mut spec = BatchSpec::new(content_type, 1, command.requester);
        if let Some(topic) = topic {
            spec = spec.with_topics(vec![topic]);
        }
        let report = self.batches.run(spec).await;
        let ids = self.cache_articles(&report).await;

        match report.results.first().map(|r| &r.outcome) {
            Some(GenerationOutcome::Succeeded(payload)) => {
                let mut text = render::render_payload(payload);
                if let Some(id) = ids.get(&0) {
                    text.push_str(&render::publish_hint(id));
                }
                vec![text]
            }
            Some(GenerationOutcome::Failed(error)) => vec![render::render_error(content_type, error)],
            None => Vec::new(),
        }
    }

    async fn batch(&self, preset: BatchPreset, command: &InboundCommand) -> Vec<String> {
        let mut spec = BatchSpec::new(preset.content_type, preset.count, command.requester);
        if !preset.topics.is_empty() {
            spec = spec.with_topics(preset.topics.iter().map(|t| t.to_string()).collect());
        }
        let report = self.batches.run(spec).await;
        let ids = self.cache_articles(&report).await;
        render::render_batch(&report, &ids)
    }

    async fn weekly(&self, command: &InboundCommand) -> Vec<String> {
        let confirmed = command.args.iter().any(|arg| arg.eq_ignore_ascii_case("confirm"));
        let now = self.clock.now();

        if let Some(last) = self.usage.last_weekly().await {
            let since = now - last;
            let cooldown = chrono::Duration::from_std(self.weekly_cooldown).unwrap_or_else(|_| chrono::Duration::days(365));
            if since < cooldown && !confirmed {
                let hours = since.num_minutes() as f64 / 60.0;
                return vec![format!(
                    "⚠️ Last weekly was {hours:.1} hours ago. Send /weekly confirm to generate it again."
                )];
            }
        }

        if let Err(e) = self.usage.record_weekly_run(now).await {
            component_warn!(Component::Usage, "⚠️ Could not persist weekly run: {}", e);
        }

        let report = self.weekly.compose(command.requester).await;
        let mut ids = Vec::with_capacity(report.sections.len());
        for section in &report.sections {
            ids.push(self.cache_articles(section).await);
        }
        render::render_weekly(&report, &ids)
    }

    async fn news(&self) -> Vec<String> {
        let articles = match self.news.latest().await {
            Ok(articles) => articles,
            Err(e) => return vec![format!("❌ Error fetching news: {}", escape_md(&e.to_string()))],
        };

        let mut replies = vec![render::render_news(&articles)];
        if articles.is_empty() {
            return replies;
        }

        let prompt = self.prompts.news_analysis(self.phase.current_phase().await, &articles);
        match self.client.generate_json::<NewsAnalysis>(&prompt, self.request_timeout).await {
            Ok(analysis) => replies.push(render::render_news_analysis(&analysis)),
            Err(e) => replies.push(format!("⚠️ Could not analyze news: {}", escape_md(&e.to_string()))),
        }
        replies
    }

    async fn topics(&self) -> Vec<String> {
        let phase = self.phase.current_phase().await;
        let prompt = self.prompts.topic_suggestions(phase);
        match self.client.generate_json::<TopicSuggestions>(&prompt, self.request_timeout).await {
            Ok(suggestions) => vec![render::render_topics(&suggestions, phase)],
            Err(e) => vec![format!("❌ Error: {}", escape_md(&e.to_string()))],
        }
    }

    async fn stats(&self) -> String {
        let today = self.clock.now().date();
        let week_start = today - chrono::Duration::days(i64::from(today.weekday().num_days_from_monday()));

        let day = self.usage.stats_since(today).await;
        let week = self.usage.stats_since(week_start).await;
        let all = self.usage.stats_since(NaiveDate::MIN).await;

        render::render_stats(&StatsView {
            today: day.successes,
            this_week: week.successes,
            total: all.successes,
            failures: all.failures,
            by_type: all.by_type,
            last_weekly: self.usage.last_weekly().await,
            phase: self.phase.current_phase().await,
            overridden: self.phase.override_phase().await.is_some(),
            days_to_deadline: self.phase.calendar().days_to_deadline(today),
        })
    }

    async fn set_phase(&self, args: &[String]) -> String {
        let Some(raw) = args.first() else {
            self.phase.clear_override().await;
            return format!(
                "Phase reset to auto-detect: *{}*",
                escape_md(self.phase.current_phase().await.as_str())
            );
        };

        match raw.parse::<CampaignPhase>() {
            Ok(phase) => {
                self.phase.set_override(phase).await;
                format!("Phase set to: *{}*", escape_md(phase.as_str()))
            }
            Err(_) => {
                let valid: Vec<&str> = CampaignPhase::ALL.iter().map(|p| p.as_str()).collect();
                format!("Invalid phase. Choose: {}", escape_md(&valid.join(", ")))
            }
        }
    }

    async fn publish(&self, args: &[String]) -> String {
        let (target, id) = match publishing::parse_publish_args(args) {
            Ok(parsed) => parsed,
            Err(e) => return format!("❌ {}", escape_md(&e.to_string())),
        };
        let Some(article) = self.articles.get(&id).await else {
            return format!(
                "❌ Unknown article id `{}`. Articles are kept only while the bot runs.",
                escape_md(&id)
            );
        };

        let html = publishing::wrap_blog_html(&article, self.clock.now().date());
        let path = publishing::blog_path(&article);
        let repo = self.repos.repo_for(target);

        match self
            .publisher
            .publish(repo, &path, &html, &publishing::commit_message(&article))
            .await
        {
            Ok(()) => format!("✅ Published to {}: {}", target.site_name(), escape_md(&path)),
            Err(e) => format!(
                "❌ Publish to {} failed: {}\nCopy the article text and publish manually.",
                target.site_name(),
                escape_md(&e.to_string())
            ),
        }
    }
}

/// Progress note for a slow command, if it has one
fn progress_note(action: CommandAction) -> Option<String> {
    match action {
        CommandAction::Single(content_type) => Some(format!("⏳ Generating {content_type}...")),
        CommandAction::Batch(preset) => Some(format!("📦 Generating {} {}...", preset.count, preset.content_type)),
        CommandAction::Weekly => Some("🚀 Generating weekly content pack...".to_string()),
        CommandAction::News => Some("📰 Fetching latest news...".to_string()),
        CommandAction::Topics => Some("💡 Brainstorming topics...".to_string()),
        _ => None,
    }
}
