//! Test helpers and builder patterns for orchestrator tests

use std::sync::{Arc, Mutex};

use generator::{ClientSettings, CuratedTopicSource, GenerationClient, PromptBuilder, TopicSource};
use orchestrator::services::InMemoryUsageStore;
use orchestrator::traits::{MockNewsSource, MockPublisher};
use orchestrator::{
    BatchOrchestrator, BatchSettings, BotServices, BotSettings, CampaignCalendar, ContentBot, InboundCommand,
    PhaseTracker, UsageStore, UsageTracker,
};
use shared::{CampaignPhase, ContentPayload, GenerationOutcome, GenerationResult};

use super::fixtures::{FakeApi, FixedClock, TestFixtures};

/// A bot wired to fakes, with handles on the fakes for assertions
pub struct TestBot {
    pub bot: Arc<ContentBot<FakeApi>>,
    pub api: Arc<FakeApi>,
    pub clock: Arc<FixedClock>,
}

impl TestBot {
    /// Run one command from a team member and join the replies
    pub async fn send(&self, text: &str) -> String {
        self.bot.handle(&TestFixtures::team_command(text)).await.join("\n")
    }

    /// Run one command, returning the progress notes it emitted and its replies
    pub async fn handle_noting(&self, command: &InboundCommand) -> (Vec<String>, Vec<String>) {
        let notes = Arc::new(Mutex::new(Vec::new()));
        let sink = notes.clone();
        let replies = self
            .bot
            .handle_with_progress(command, move |note| {
                sink.lock().unwrap().push(note);
                std::future::ready(())
            })
            .await;
        let notes = notes.lock().unwrap().clone();
        (notes, replies)
    }
}

/// Builder for a bot with sensible test defaults: one team member, an
/// echoing API, a fixed pre-BOE clock and in-memory usage
pub struct BotBuilder {
    api: Arc<FakeApi>,
    clock: Arc<FixedClock>,
    usage_store: Arc<dyn UsageStore>,
    publisher: MockPublisher,
    news: MockNewsSource,
    topics: Arc<dyn TopicSource>,
    settings: BotSettings,
}

impl BotBuilder {
    pub fn new() -> Self {
        Self {
            api: Arc::new(FakeApi::echo()),
            clock: Arc::new(FixedClock::new(TestFixtures::pre_boe_morning())),
            usage_store: Arc::new(InMemoryUsageStore::new()),
            publisher: MockPublisher::new(),
            news: MockNewsSource::new(),
            topics: Arc::new(CuratedTopicSource::with_seed(7)),
            settings: BotSettings {
                team: vec![TestFixtures::TEAM_MEMBER],
                client: ClientSettings {
                    model: "test-model".to_string(),
                    ..ClientSettings::default()
                },
                ..BotSettings::default()
            },
        }
    }

    pub fn with_api(mut self, api: FakeApi) -> Self {
        self.api = Arc::new(api);
        self
    }

    pub fn with_clock(mut self, clock: Arc<FixedClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_usage_store(mut self, store: Arc<dyn UsageStore>) -> Self {
        self.usage_store = store;
        self
    }

    pub fn with_publisher(mut self, publisher: MockPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_news(mut self, news: MockNewsSource) -> Self {
        self.news = news;
        self
    }

    pub fn with_topics(mut self, topics: Arc<dyn TopicSource>) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_batch(mut self, batch: BatchSettings) -> Self {
        self.settings.batch = batch;
        self
    }

    pub fn with_initial_phase(mut self, phase: CampaignPhase) -> Self {
        self.settings.initial_phase = Some(phase);
        self
    }

    pub async fn build(self) -> TestBot {
        let services = BotServices {
            api: self.api.clone(),
            topics: self.topics,
            clock: self.clock.clone(),
            usage_store: self.usage_store,
            publisher: Arc::new(self.publisher),
            news: Arc::new(self.news),
        };
        let bot = ContentBot::initialize(self.settings, services)
            .await
            .expect("bot initializes");

        TestBot {
            bot: Arc::new(bot),
            api: self.api,
            clock: self.clock,
        }
    }
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch orchestrator with its state, built without the bot around it
pub struct TestOrchestrator {
    pub batches: Arc<BatchOrchestrator<FakeApi>>,
    pub usage: Arc<UsageTracker>,
    pub phase: Arc<PhaseTracker>,
    pub api: Arc<FakeApi>,
}

pub struct TestHelpers;

impl TestHelpers {
    pub async fn orchestrator(api: FakeApi, settings: BatchSettings) -> TestOrchestrator {
        let api = Arc::new(api);
        let clock: Arc<FixedClock> = Arc::new(FixedClock::new(TestFixtures::pre_boe_morning()));
        let usage = Arc::new(
            UsageTracker::initialize(Arc::new(InMemoryUsageStore::new()))
                .await
                .expect("usage loads"),
        );
        let phase = Arc::new(PhaseTracker::new(CampaignCalendar::default(), clock.clone()));
        let client = Arc::new(GenerationClient::new(api.clone(), ClientSettings::default()));
        let prompts = PromptBuilder::new(Arc::new(CuratedTopicSource::with_seed(7)));

        let batches = Arc::new(BatchOrchestrator::new(
            client,
            prompts,
            phase.clone(),
            usage.clone(),
            clock,
            settings,
        ));

        TestOrchestrator {
            batches,
            usage,
            phase,
            api,
        }
    }

    /// The main text of a successful result, which the fake API fills with
    /// the requested topic
    pub fn marker(result: &GenerationResult) -> Option<String> {
        let GenerationOutcome::Succeeded(payload) = &result.outcome else {
            return None;
        };
        let text = match payload {
            ContentPayload::Blog(article) => &article.title,
            ContentPayload::Tiktok(script) => &script.hook,
            ContentPayload::Carousel(carousel) => &carousel.topic,
            ContentPayload::Caption(caption) => &caption.caption_text,
            ContentPayload::Whatsapp(message) => &message.message_text,
            ContentPayload::FbPost(post) => &post.post_text,
            ContentPayload::Story(story) => &story.main_text,
        };
        Some(text.clone())
    }
}
