//! Unattended news-to-blog publishing
//!
//! One run fetches headlines, drops the ones seen by earlier runs, asks the
//! model which deserve coverage, then writes and publishes a post for each
//! pick. A published post is added to the blog index and the home page
//! timeline, and the team is told about it. Every new headline is
//! remembered whether or not it was picked, so each one is judged once.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use generator::{headline_selection, news_post, ClientSettings, CompletionApi, GenerationClient};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use shared::{
    component_debug, component_info, component_warn, BlogArticle, BotError, Component, NewsArticle, NewsPost,
    RequesterId,
};

use crate::core::publishing::{self, html_escape};
use crate::core::render::escape_md;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ChatTransport, Clock, NewsSource, Publisher, UpdateStateStore};

pub const BLOG_INDEX_PATH: &str = "blog/index.json";
pub const HOME_PAGE_PATH: &str = "index.html";
pub const TIMELINE_MARKER: &str = r#"<div class="updates-timeline" id="updates-timeline">"#;

const HEADLINE_KEY_CHARS: usize = 80;
const DUPLICATE_OVERLAP: f64 = 0.7;
const PREVIEW_CHARS: usize = 200;
const COMMIT_TITLE_CHARS: usize = 50;
const TIMELINE_SUMMARY_CHARS: usize = 200;

/// Headlines already judged and the outcome of the last run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoUpdateState {
    /// Oldest first
    #[serde(default)]
    pub seen_hashes: Vec<String>,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub last_published: usize,
}

impl AutoUpdateState {
    pub fn has_seen(&self, key: &str) -> bool {
        self.seen_hashes.iter().any(|seen| seen == key)
    }

    /// Append the keys not yet known, then keep only the newest `limit`
    pub fn remember<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>, limit: usize) {
        let mut known: HashSet<String> = self.seen_hashes.iter().cloned().collect();
        for key in keys {
            if known.insert(key.to_string()) {
                self.seen_hashes.push(key.to_string());
            }
        }
        if self.seen_hashes.len() > limit {
            let excess = self.seen_hashes.len() - limit;
            self.seen_hashes.drain(..excess);
        }
    }
}

/// Stable key of a headline: SHA-256 of its first 80 lowercase characters
pub fn headline_key(title: &str) -> String {
    let normalized: String = title.trim().to_lowercase().chars().take(HEADLINE_KEY_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// First existing title sharing more than 70% of its words with `title`,
/// measured against the larger of the two word sets
pub fn find_duplicate<'a>(title: &str, existing: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let words = word_set(title);
    if words.is_empty() {
        return None;
    }

    existing.into_iter().find(|other| {
        let other_words = word_set(other);
        if other_words.is_empty() {
            return false;
        }
        let shared = words.intersection(&other_words).count();
        shared as f64 / words.len().max(other_words.len()) as f64 > DUPLICATE_OVERLAP
    })
}

/// `blog/index.json`. Unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogIndex {
    #[serde(default)]
    pub articles: Vec<BlogIndexEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogIndexEntry {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub preview: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlogIndexEntry {
    fn sort_key(&self) -> &str {
        self.published_at.as_deref().unwrap_or(&self.date)
    }
}

impl BlogIndex {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|entry| entry.title.as_str())
    }

    /// Add an entry, newest first
    pub fn add(&mut self, entry: BlogIndexEntry) {
        self.articles.insert(0, entry);
        self.articles.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
    }
}

/// Reads the model's pick list: the first JSON array of numbers in the reply
pub struct PickParser {
    array: Regex,
}

impl PickParser {
    pub fn new() -> OrchestratorResult<Self> {
        Ok(Self {
            array: compile(r"\[[\d\s,]*\]")?,
        })
    }

    /// Zero-based positions of the picked headlines out of `count`, in the
    /// order given, without repeats. Anything unreadable means no picks.
    pub fn parse(&self, reply: &str, count: usize) -> Vec<usize> {
        let Some(found) = self.array.find(reply) else {
            return Vec::new();
        };
        let numbers: Vec<usize> = serde_json::from_str(found.as_str()).unwrap_or_default();

        let mut picked = Vec::new();
        for number in numbers {
            if (1..=count).contains(&number) && !picked.contains(&(number - 1)) {
                picked.push(number - 1);
            }
        }
        picked
    }
}

/// Text edits on the site's HTML
pub struct PageEditor {
    first_entry: Regex,
    date_label: Regex,
    markup: Regex,
}

impl PageEditor {
    pub fn new() -> OrchestratorResult<Self> {
        Ok(Self {
            first_entry: compile(r"\n(\s*<!-- \d+ )")?,
            date_label: compile(r#"(<span class="timeline-date">)[^<]+(</span>)"#)?,
            markup: compile(r"<[^>]+>")?,
        })
    }

    pub fn strip_markup(&self, html: &str) -> String {
        self.markup.replace_all(html, "").into_owned()
    }

    /// Put `entry` ahead of the newest timeline item and set the headline
    /// date to `today`. `None` when the page has no timeline.
    ///
    /// Items are recognised by their leading `<!-- DD ...` comment; with no
    /// item yet the entry goes after the line following the marker.
    pub fn insert_timeline_entry(&self, page: &str, entry: &str, today: &str) -> Option<String> {
        let start = page.find(TIMELINE_MARKER)?;
        let at = match self.first_entry.find(&page[start..]) {
            Some(found) => start + found.start(),
            None => {
                let after_marker = start + TIMELINE_MARKER.len();
                let marker_eol = after_marker + page[after_marker..].find('\n')?;
                page[marker_eol + 1..]
                    .find('\n')
                    .map(|offset| marker_eol + 1 + offset)
                    .unwrap_or(page.len())
            }
        };

        let mut updated = String::with_capacity(page.len() + entry.len());
        updated.push_str(&page[..at]);
        updated.push_str(entry);
        updated.push_str(&page[at..]);

        let dated = self
            .date_label
            .replacen(&updated, 1, |caps: &Captures| format!("{}{}{}", &caps[1], today, &caps[2]));
        Some(dated.into_owned())
    }
}

fn compile(pattern: &str) -> OrchestratorResult<Regex> {
    Regex::new(pattern).map_err(|e| OrchestratorError::AutoUpdateError {
        message: format!("bad pattern {pattern}: {e}"),
    })
}

/// Tag class and label shown on a timeline item for a post category
fn timeline_tag(category: &str) -> (&'static str, &'static str) {
    match category {
        "noticias" => ("oficial", "Oficial"),
        "historias" => ("beneficio", "Beneficio"),
        _ => ("tramitacion", "Tramitaci&oacute;n"),
    }
}

/// `9 de marzo de 2026`
fn long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), publishing::month_name(date), date.year())
}

/// Home page timeline item for a post
pub fn timeline_entry(post: &NewsPost, date: NaiveDate) -> String {
    let (tag_class, tag_label) = timeline_tag(post.category());
    let day = format!("{:02}", date.day());
    let month_year = format!("{} {}", publishing::month_abbreviation(date), date.year());
    let title = html_escape(post.title.trim());
    let summary: String = post.timeline_summary().chars().take(TIMELINE_SUMMARY_CHARS).collect();
    let summary = html_escape(&summary);

    format!(
        r#"
                <!-- {day} {month_year} - AUTO -->
                <div class="update-item">
                    <div class="update-date-badge">
                        <div class="update-date-day">{day}</div>
                        <div class="update-date-month">{month_year}</div>
                    </div>
                    <div class="update-card">
                        <div class="update-card-top">
                            <span class="update-tag {tag_class}">{tag_label}</span>
                        </div>
                        <h4>{title}</h4>
                        <p>{summary}</p>
                    </div>
                </div>
"#
    )
}

fn timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn short_title(title: &str) -> String {
    title.chars().take(COMMIT_TITLE_CHARS).collect()
}

/// Why a picked headline produced no post
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Generation(BotError),
    /// Title, slug or body missing from the answer
    Incomplete,
    Duplicate { existing: String },
    Publish(BotError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Generation(e) => write!(f, "generation failed: {e}"),
            SkipReason::Incomplete => f.write_str("article missing required fields"),
            SkipReason::Duplicate { existing } => write!(f, "duplicate of '{existing}'"),
            SkipReason::Publish(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoUpdateReport {
    pub fetched: usize,
    pub fresh: usize,
    pub picked: usize,
    /// Repository paths of the published pages
    pub published: Vec<String>,
    /// Headline title and reason for every pick that was not published
    pub skipped: Vec<(String, SkipReason)>,
}

#[derive(Debug, Clone)]
pub struct AutoUpdateSettings {
    /// Campaign site repository (`owner/name`)
    pub repo: String,
    pub site_url: String,
    pub max_articles: usize,
    /// Headlines shown to the model per run
    pub max_candidates: usize,
    pub seen_limit: usize,
    pub request_timeout: Duration,
}

impl Default for AutoUpdateSettings {
    fn default() -> Self {
        Self {
            repo: publishing::PublishRepos::default().tp,
            site_url: "https://tuspapeles2026.es".to_string(),
            max_articles: 2,
            max_candidates: 10,
            seen_limit: 500,
            request_timeout: Duration::from_secs(60),
        }
    }
}

pub struct AutoUpdateServices<A: CompletionApi> {
    pub api: Arc<A>,
    pub news: Arc<dyn NewsSource>,
    pub publisher: Arc<dyn Publisher>,
    pub state: Arc<dyn UpdateStateStore>,
    /// Team notifications are skipped without a transport
    pub notifier: Option<Arc<dyn ChatTransport>>,
    pub clock: Arc<dyn Clock>,
}

pub struct AutoPublisher<A: CompletionApi> {
    client: GenerationClient<A>,
    news: Arc<dyn NewsSource>,
    publisher: Arc<dyn Publisher>,
    state: Arc<dyn UpdateStateStore>,
    notifier: Option<Arc<dyn ChatTransport>>,
    clock: Arc<dyn Clock>,
    team: Vec<RequesterId>,
    settings: AutoUpdateSettings,
    picks: PickParser,
    pages: PageEditor,
}

impl<A: CompletionApi> AutoPublisher<A> {
    pub fn new(
        settings: AutoUpdateSettings,
        client: ClientSettings,
        team: Vec<RequesterId>,
        services: AutoUpdateServices<A>,
    ) -> OrchestratorResult<Self> {
        Ok(Self {
            client: GenerationClient::new(services.api, client),
            news: services.news,
            publisher: services.publisher,
            state: services.state,
            notifier: services.notifier,
            clock: services.clock,
            team,
            settings,
            picks: PickParser::new()?,
            pages: PageEditor::new()?,
        })
    }

    /// One complete run.
    ///
    /// Fails only when the state, the feed or the blog index cannot be read,
    /// or the state cannot be saved. Problems with a single post are
    /// reported in [`AutoUpdateReport::skipped`].
    pub async fn run(&self) -> OrchestratorResult<AutoUpdateReport> {
        let mut state = self.state.load().await?;
        let headlines = self.news.latest().await?;
        let fetched = headlines.len();

        let fresh: Vec<(String, NewsArticle)> = headlines
            .into_iter()
            .map(|headline| (headline_key(&headline.title), headline))
            .filter(|(key, _)| !state.has_seen(key))
            .collect();
        component_info!(Component::AutoUpdate, "📰 {} headline(s), {} new", fetched, fresh.len());

        let mut report = AutoUpdateReport {
            fetched,
            fresh: fresh.len(),
            ..AutoUpdateReport::default()
        };
        let now = self.clock.now();

        if fresh.is_empty() {
            state.last_run = Some(timestamp(now));
            self.state.save(&state).await?;
            return Ok(report);
        }

        let mut index = self.load_index().await?;
        let candidates: Vec<NewsArticle> = fresh
            .iter()
            .take(self.settings.max_candidates)
            .map(|(_, headline)| headline.clone())
            .collect();
        let picks = self.pick(&candidates).await;
        report.picked = picks.len();
        component_info!(Component::AutoUpdate, "🎯 {} headline(s) picked for coverage", picks.len());

        for headline in picks.into_iter().take(self.settings.max_articles) {
            match self.cover(&headline, &mut index, now).await {
                Ok(path) => report.published.push(path),
                Err(reason) => {
                    component_warn!(Component::AutoUpdate, "⏭️ Skipped '{}': {}", headline.title, reason);
                    report.skipped.push((headline.title, reason));
                }
            }
        }

        state.remember(fresh.iter().map(|(key, _)| key.as_str()), self.settings.seen_limit);
        state.last_run = Some(timestamp(now));
        state.last_published = report.published.len();
        self.state.save(&state).await?;

        component_info!(
            Component::AutoUpdate,
            "✅ Auto-update done: {} published, {} skipped",
            report.published.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn load_index(&self) -> OrchestratorResult<BlogIndex> {
        match self.publisher.fetch(&self.settings.repo, BLOG_INDEX_PATH).await? {
            Some(text) => serde_json::from_str(&text).map_err(|e| OrchestratorError::AutoUpdateError {
                message: format!("unreadable {BLOG_INDEX_PATH}: {e}"),
            }),
            None => Ok(BlogIndex::default()),
        }
    }

    async fn pick(&self, candidates: &[NewsArticle]) -> Vec<NewsArticle> {
        let prompt = headline_selection(candidates);
        match self.client.generate(&prompt, self.settings.request_timeout).await {
            Ok(completion) => self
                .picks
                .parse(&completion.text, candidates.len())
                .into_iter()
                .filter_map(|position| candidates.get(position).cloned())
                .collect(),
            Err(e) => {
                component_warn!(Component::AutoUpdate, "⚠️ Headline selection failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Write, publish and announce a post for one headline
    async fn cover(
        &self,
        headline: &NewsArticle,
        index: &mut BlogIndex,
        now: NaiveDateTime,
    ) -> Result<String, SkipReason> {
        let post: NewsPost = self
            .client
            .generate_json(&news_post(headline), self.settings.request_timeout)
            .await
            .map_err(SkipReason::Generation)?;
        if !post.is_complete() {
            return Err(SkipReason::Incomplete);
        }
        if let Some(existing) = find_duplicate(&post.title, index.titles()) {
            return Err(SkipReason::Duplicate {
                existing: existing.to_string(),
            });
        }

        let article = post.to_blog_article();
        let path = publishing::blog_path(&article);
        let page = publishing::wrap_blog_html(&article, now.date());
        self.publisher
            .publish(&self.settings.repo, &path, &page, &format!("Auto-publish: {}", article.title))
            .await
            .map_err(SkipReason::Publish)?;
        component_info!(Component::AutoUpdate, "🚀 Published {}", path);

        index.add(self.index_entry(&post, &article, now));
        self.publish_index(index, &article.title).await;
        self.update_timeline(&post, now.date()).await;
        self.announce(&post, &article).await;
        Ok(path)
    }

    fn index_entry(&self, post: &NewsPost, article: &BlogArticle, now: NaiveDateTime) -> BlogIndexEntry {
        BlogIndexEntry {
            slug: article.url_slug(),
            title: article.title.clone(),
            meta: article.meta_description.clone(),
            date: now.format("%Y-%m-%d").to_string(),
            published_at: Some(timestamp(now)),
            category: post.category().to_string(),
            preview: self.pages.strip_markup(&post.html_content).chars().take(PREVIEW_CHARS).collect(),
            extra: Map::new(),
        }
    }

    async fn publish_index(&self, index: &BlogIndex, title: &str) {
        let content = match serde_json::to_string_pretty(index) {
            Ok(content) => content,
            Err(e) => {
                component_warn!(Component::AutoUpdate, "⚠️ Could not encode blog index: {}", e);
                return;
            }
        };
        let message = format!("Index: {}", short_title(title));
        if let Err(e) = self
            .publisher
            .publish(&self.settings.repo, BLOG_INDEX_PATH, &content, &message)
            .await
        {
            component_warn!(Component::AutoUpdate, "⚠️ Blog index not updated: {}", e);
        }
    }

    async fn update_timeline(&self, post: &NewsPost, date: NaiveDate) {
        let page = match self.publisher.fetch(&self.settings.repo, HOME_PAGE_PATH).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                component_warn!(Component::AutoUpdate, "⚠️ No {} in {}", HOME_PAGE_PATH, self.settings.repo);
                return;
            }
            Err(e) => {
                component_warn!(Component::AutoUpdate, "⚠️ Could not read {}: {}", HOME_PAGE_PATH, e);
                return;
            }
        };

        let entry = timeline_entry(post, date);
        let Some(updated) = self.pages.insert_timeline_entry(&page, &entry, &long_date(date)) else {
            component_warn!(Component::AutoUpdate, "⚠️ {} has no updates timeline", HOME_PAGE_PATH);
            return;
        };

        let message = format!("Estado: {}", short_title(post.title.trim()));
        if let Err(e) = self
            .publisher
            .publish(&self.settings.repo, HOME_PAGE_PATH, &updated, &message)
            .await
        {
            component_warn!(Component::AutoUpdate, "⚠️ Timeline not updated: {}", e);
        }
    }

    async fn announce(&self, post: &NewsPost, article: &BlogArticle) {
        let Some(notifier) = &self.notifier else {
            component_debug!(Component::AutoUpdate, "🔕 No chat transport, skipping team notice");
            return;
        };

        let text = format!(
            "🤖 *Auto-publicado:*\n\n📰 {}\n🏷️ {}\n🔗 {}/blog/{}.html",
            escape_md(&article.title),
            escape_md(post.category()),
            self.settings.site_url.trim_end_matches('/'),
            article.url_slug()
        );
        for member in &self.team {
            if let Err(e) = notifier.send_message(member.0, &text).await {
                component_warn!(Component::AutoUpdate, "⚠️ Could not notify {}: {}", member, e);
            }
        }
    }
}
