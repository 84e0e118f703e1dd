//! Entry point for the content bot binary
//!
//! Loads configuration from the environment and either serves the team chat
//! until Ctrl+C or performs one unattended auto-publish run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use generator::{CuratedTopicSource, RealCompletionApi};
use orchestrator::core::AutoUpdateServices;
use orchestrator::services::news::AUTO_UPDATE_QUERIES;
use orchestrator::services::{
    InMemoryUsageStore, JsonFileUpdateStateStore, JsonFileUsageStore, RealClock, RealGithubPublisher,
    RealNewsSource, RealTelegramTransport, RepoUpdateStateStore,
};
use orchestrator::{
    AutoPublisher, AutoUpdateSettings, BotConfig, BotRunner, BotServices, BotSettings, CampaignCalendar, ChatTransport,
    ContentBot, Publisher, UpdateStateStore, UsageStore,
};
use shared::{component_info, logging, CampaignPhase, Component};
use tokio::signal;

/// Telegram bot generating campaign content with a generative API
#[derive(Parser)]
#[command(name = "content-bot")]
#[command(about = "Generates campaign content on demand for a private team chat")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Maximum simultaneous generation calls (overrides BATCH_CONCURRENCY)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Usage ledger file (overrides USAGE_STORE_PATH)
    #[arg(long)]
    pub usage_store: Option<std::path::PathBuf>,

    /// Start with a phase override (pre_boe, boe_week, apps_open, final_push)
    #[arg(long)]
    pub phase: Option<CampaignPhase>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer team chat commands until Ctrl+C (default)
    Serve,
    /// Publish blog posts for new headlines once, then exit
    AutoUpdate {
        /// Keep the seen-headline state in this file instead of the site repository
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Most posts to publish in this run
        #[arg(long, default_value_t = 2)]
        max_articles: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    match args.command.take() {
        Some(Command::AutoUpdate {
            state_file,
            max_articles,
        }) => auto_update(state_file, max_articles).await,
        Some(Command::Serve) | None => serve(args).await,
    }
}

async fn serve(args: Args) -> anyhow::Result<()> {
    let mut config = BotConfig::from_env().context("loading configuration")?;
    if let Some(concurrency) = args.concurrency {
        config.batch.concurrency = concurrency;
    }
    if let Some(path) = args.usage_store {
        config.usage_store_path = Some(path);
    }

    logging::log_startup(Component::Bot, "content bot");
    if config.team.is_empty() {
        component_info!(Component::Bot, "⚠️ TEAM_CHAT_IDS is empty, every request will be refused");
    }

    let usage_store: Arc<dyn UsageStore> = match &config.usage_store_path {
        Some(path) => {
            component_info!(Component::Usage, "📂 Usage ledger at {}", path.display());
            Arc::new(JsonFileUsageStore::new(path))
        }
        None => Arc::new(InMemoryUsageStore::new()),
    };

    let services = BotServices {
        api: Arc::new(RealCompletionApi::new(config.claude_api_key.clone())?),
        topics: Arc::new(CuratedTopicSource::new()),
        clock: Arc::new(RealClock),
        usage_store,
        publisher: Arc::new(RealGithubPublisher::new(config.github_token.clone())?),
        news: Arc::new(RealNewsSource::new()?),
    };
    let settings = BotSettings {
        team: config.team.clone(),
        calendar: CampaignCalendar::default().with_boe_date(config.boe_date),
        client: config.client_settings(),
        batch: config.batch.clone(),
        repos: config.repos.clone(),
        initial_phase: args.phase,
        ..BotSettings::default()
    };

    let bot = Arc::new(ContentBot::initialize(settings, services).await?);
    let transport = Arc::new(RealTelegramTransport::new(config.telegram_token.clone())?);
    let runner = BotRunner::new(bot, transport);

    runner
        .run_until(async {
            if let Err(err) = signal::ctrl_c().await {
                logging::log_error(Component::Bot, "Signal handling", &err);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    logging::log_shutdown(Component::Bot, "stopped gracefully");
    Ok(())
}

async fn auto_update(state_file: Option<PathBuf>, max_articles: usize) -> anyhow::Result<()> {
    let config = BotConfig::auto_update_from_env().context("loading configuration")?;
    logging::log_startup(Component::AutoUpdate, "auto-publish run");

    let publisher: Arc<dyn Publisher> = Arc::new(RealGithubPublisher::new(config.github_token.clone())?);
    let state: Arc<dyn UpdateStateStore> = match state_file.or_else(|| config.update_state_path.clone()) {
        Some(path) => {
            component_info!(Component::AutoUpdate, "📂 State file at {}", path.display());
            Arc::new(JsonFileUpdateStateStore::new(path))
        }
        None => Arc::new(RepoUpdateStateStore::new(publisher.clone(), config.repos.tp.clone())),
    };
    let notifier: Option<Arc<dyn ChatTransport>> = if config.telegram_token.trim().is_empty() {
        None
    } else {
        let transport: Arc<dyn ChatTransport> = Arc::new(RealTelegramTransport::new(config.telegram_token.clone())?);
        Some(transport)
    };
    let news = RealNewsSource::new()?
        .with_queries(AUTO_UPDATE_QUERIES.iter().map(|query| query.to_string()).collect())
        .with_limits(8, 16);

    let services = AutoUpdateServices {
        api: Arc::new(RealCompletionApi::new(config.claude_api_key.clone())?),
        news: Arc::new(news),
        publisher,
        state,
        notifier,
        clock: Arc::new(RealClock),
    };
    let settings = AutoUpdateSettings {
        repo: config.repos.tp.clone(),
        max_articles,
        ..AutoUpdateSettings::default()
    };

    let publisher = AutoPublisher::new(settings, config.client_settings(), config.team.clone(), services)?;
    let report = publisher.run().await?;

    component_info!(
        Component::AutoUpdate,
        "📊 {} fetched, {} new, {} picked, {} published",
        report.fetched,
        report.fresh,
        report.picked,
        report.published.len()
    );
    for path in &report.published {
        component_info!(Component::AutoUpdate, "  ✅ {}", path);
    }
    for (title, reason) in &report.skipped {
        component_info!(Component::AutoUpdate, "  ⏭️ {}: {}", title, reason);
    }
    Ok(())
}
