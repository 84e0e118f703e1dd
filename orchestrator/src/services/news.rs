//! Google News RSS source
//!
//! Runs a fixed set of searches, keeps the first few items of each feed and
//! drops near-duplicate headlines. A query that fails is logged and skipped.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use shared::{component_debug, component_warn, Component, NewsArticle};
use url::Url;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::NewsSource;

pub const GOOGLE_NEWS_URL: &str = "https://news.google.com";

pub const DEFAULT_QUERIES: &[&str] = &[
    "regularización extraordinaria España 2026",
    "regularización masiva inmigrantes España",
    "papeles España 2026",
];

/// Searches watched by the auto-publish run
pub const AUTO_UPDATE_QUERIES: &[&str] = &["regularización extraordinaria España", "papeles inmigrantes España 2026"];

const ITEMS_PER_QUERY: usize = 3;
const MAX_ARTICLES: usize = 10;
const SUMMARY_CHARS: usize = 300;
const DEDUPE_PREFIX_CHARS: usize = 50;
const UNKNOWN_SOURCE: &str = "Desconocido";

/// Minimal RSS item extractor
pub struct RssParser {
    item: Regex,
    title: Regex,
    link: Regex,
    source: Regex,
    published: Regex,
    description: Regex,
    markup: Regex,
}

impl RssParser {
    pub fn new() -> OrchestratorResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| OrchestratorError::NewsError {
                message: format!("bad feed pattern: {e}"),
            })
        };

        Ok(Self {
            item: compile(r"(?s)<item\b[^>]*>(.*?)</item>")?,
            title: compile(r"(?s)<title\b[^>]*>(.*?)</title>")?,
            link: compile(r"(?s)<link\b[^>]*>(.*?)</link>")?,
            source: compile(r"(?s)<source\b[^>]*>(.*?)</source>")?,
            published: compile(r"(?s)<pubDate\b[^>]*>(.*?)</pubDate>")?,
            description: compile(r"(?s)<description\b[^>]*>(.*?)</description>")?,
            markup: compile(r"<[^>]+>")?,
        })
    }

    fn field(pattern: &Regex, item: &str) -> Option<String> {
        pattern
            .captures(item)
            .and_then(|captures| captures.get(1))
            .map(|m| decode_text(m.as_str()))
            .filter(|text| !text.is_empty())
    }

    /// Description with its HTML removed, whitespace collapsed and capped
    fn summary(&self, item: &str) -> String {
        let Some(raw) = Self::field(&self.description, item) else {
            return String::new();
        };
        let text = self.markup.replace_all(&raw, " ").replace("&nbsp;", " ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        text.chars().take(SUMMARY_CHARS).collect()
    }

    /// Items of one feed, at most `limit`, skipping items without a title
    pub fn parse(&self, xml: &str, limit: usize) -> Vec<NewsArticle> {
        self.item
            .captures_iter(xml)
            .filter_map(|captures| captures.get(1))
            .filter_map(|item| {
                let item = item.as_str();
                Some(NewsArticle {
                    title: Self::field(&self.title, item)?,
                    link: Self::field(&self.link, item).unwrap_or_default(),
                    source: Self::field(&self.source, item).unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                    published: Self::field(&self.published, item).unwrap_or_default(),
                    summary: self.summary(item),
                })
            })
            .take(limit)
            .collect()
    }
}

fn decode_text(raw: &str) -> String {
    let text = raw.trim();
    let text = text
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text);

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Keep the first article per lowercase title prefix, up to `cap`
pub fn dedupe(articles: Vec<NewsArticle>, cap: usize) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            let key: String = article
                .title
                .to_lowercase()
                .chars()
                .take(DEDUPE_PREFIX_CHARS)
                .collect();
            seen.insert(key)
        })
        .take(cap)
        .collect()
}

pub struct RealNewsSource {
    client: reqwest::Client,
    base_url: String,
    queries: Vec<String>,
    per_query: usize,
    cap: usize,
    parser: RssParser,
}

impl RealNewsSource {
    pub fn new() -> OrchestratorResult<Self> {
        Self::with_base_url(GOOGLE_NEWS_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(20)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            per_query: ITEMS_PER_QUERY,
            cap: MAX_ARTICLES,
            parser: RssParser::new()?,
        })
    }

    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    /// Items kept from each feed and in total after deduplication
    pub fn with_limits(mut self, per_query: usize, cap: usize) -> Self {
        self.per_query = per_query;
        self.cap = cap;
        self
    }

    fn search_url(&self, query: &str) -> OrchestratorResult<Url> {
        Url::parse_with_params(
            &format!("{}/rss/search", self.base_url),
            &[("q", query), ("hl", "es"), ("gl", "ES"), ("ceid", "ES:es")],
        )
        .map_err(|e| OrchestratorError::NewsError {
            message: format!("invalid news URL: {e}"),
        })
    }

    async fn fetch_query(&self, query: &str) -> OrchestratorResult<Vec<NewsArticle>> {
        let response = self.client.get(self.search_url(query)?).send().await?;
        if !response.status().is_success() {
            return Err(OrchestratorError::NewsError {
                message: format!("HTTP {}", response.status().as_u16()),
            });
        }
        let xml = response.text().await?;
        Ok(self.parser.parse(&xml, self.per_query))
    }
}

#[async_trait]
impl NewsSource for RealNewsSource {
    async fn latest(&self) -> OrchestratorResult<Vec<NewsArticle>> {
        let mut articles = Vec::new();
        for query in &self.queries {
            match self.fetch_query(query).await {
                Ok(found) => {
                    component_debug!(Component::News, "📰 '{}': {} item(s)", query, found.len());
                    articles.extend(found);
                }
                Err(e) => component_warn!(Component::News, "⚠️ News query '{}' failed: {}", query, e),
            }
        }
        Ok(dedupe(articles, self.cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            link: String::new(),
            source: String::new(),
            published: String::new(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_dedupe_on_title_prefix() {
        let long = "El Gobierno aprueba la regularización extraordinaria de migrantes";
        let articles = vec![
            article(long),
            article(&format!("{} - El País", long.to_uppercase())),
            article("Otra noticia"),
        ];
        let unique = dedupe(articles, 10);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[1].title, "Otra noticia");
    }

    #[test]
    fn test_dedupe_caps_results() {
        let articles = (0..15).map(|i| article(&format!("noticia {i}"))).collect();
        assert_eq!(dedupe(articles, 10).len(), 10);
    }

    #[test]
    fn test_decode_cdata_and_entities() {
        assert_eq!(decode_text("<![CDATA[ Papeles &amp; plazos ]]>"), "Papeles & plazos");
        assert_eq!(decode_text("A &lt;b&gt;"), "A <b>");
    }
}
