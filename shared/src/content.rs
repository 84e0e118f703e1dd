//! Structured payloads returned by the model for each content type
//!
//! Every schema mirrors the JSON shape requested in the prompt. The fields a
//! piece cannot exist without are required; the rest default to empty so a
//! slightly terse completion still parses.

use serde::{Deserialize, Serialize};

use crate::types::ContentType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogArticle {
    pub title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub slug: String,
    pub html_content: String,
    #[serde(default)]
    pub word_count: Option<u32>,
}

impl BlogArticle {
    /// Reported word count, falling back to counting the HTML body
    pub fn words(&self) -> u32 {
        self.word_count
            .unwrap_or_else(|| self.html_content.split_whitespace().count() as u32)
    }

    /// Slug safe to use as a file name and URL path segment
    pub fn url_slug(&self) -> String {
        sanitize_slug(&self.slug)
    }
}

const FALLBACK_SLUG: &str = "article";

/// Reduce a model-supplied slug to `[a-z0-9-]`.
///
/// Spanish accents fold to their base letter, every other character becomes a
/// dash, runs of dashes collapse and edge dashes are dropped. An empty result
/// falls back to `article`.
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            c if c.is_ascii_lowercase() || c.is_ascii_digit() => c,
            _ => '-',
        };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { FALLBACK_SLUG.to_string() } else { slug.to_string() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiktokScript {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    pub hook: String,
    pub script: String,
    #[serde(default)]
    pub text_overlays: Vec<String>,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub production_tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselSlide {
    #[serde(default)]
    pub slide_number: Option<u32>,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carousel {
    #[serde(default)]
    pub topic: String,
    pub slides: Vec<CarouselSlide>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialCaption {
    #[serde(default)]
    pub platform: String,
    pub caption_text: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsappMessage {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub message_text: String,
    #[serde(default)]
    pub suggested_send_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacebookPost {
    pub post_text: String,
    #[serde(default)]
    pub suggested_groups: Vec<String>,
    #[serde(default)]
    pub cta_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryConcept {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub main_text: String,
    #[serde(default)]
    pub sticker_suggestion: String,
    #[serde(default)]
    pub background_suggestion: String,
}

/// A parsed piece of content, tagged by its format
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPayload {
    Blog(BlogArticle),
    Tiktok(TiktokScript),
    Carousel(Carousel),
    Caption(SocialCaption),
    Whatsapp(WhatsappMessage),
    FbPost(FacebookPost),
    Story(StoryConcept),
}

impl ContentPayload {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentPayload::Blog(_) => ContentType::Blog,
            ContentPayload::Tiktok(_) => ContentType::Tiktok,
            ContentPayload::Carousel(_) => ContentType::Carousel,
            ContentPayload::Caption(_) => ContentType::Caption,
            ContentPayload::Whatsapp(_) => ContentType::Whatsapp,
            ContentPayload::FbPost(_) => ContentType::FbPost,
            ContentPayload::Story(_) => ContentType::Story,
        }
    }
}

/// One suggestion from the topic brainstorm prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicIdea {
    pub title: String,
    #[serde(default)]
    pub angle: String,
    #[serde(default)]
    pub best_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSuggestions {
    pub topics: Vec<TopicIdea>,
}

/// Content ideas derived from one news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsInsight {
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content_ideas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsAnalysis {
    pub analysis: Vec<NewsInsight>,
}

/// A headline pulled from the news feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published: String,
    /// Plain-text feed description, possibly empty
    #[serde(default)]
    pub summary: String,
}

const DEFAULT_POST_CATEGORY: &str = "noticias";

fn default_post_category() -> String {
    DEFAULT_POST_CATEGORY.to_string()
}

/// Blog post written from one headline by the auto-publish run.
///
/// Every field defaults so an incomplete answer still parses; callers check
/// [`is_complete`](Self::is_complete) before publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub meta_description: String,
    /// One of noticias, guia, mitos, analisis, historias
    #[serde(default = "default_post_category")]
    pub category: String,
    /// One or two sentences for the site timeline
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub html_content: String,
}

impl NewsPost {
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.slug, &self.html_content]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    pub fn category(&self) -> &str {
        match self.category.trim() {
            "" => DEFAULT_POST_CATEGORY,
            category => category,
        }
    }

    /// Timeline text: the summary, else the meta description, else the title
    pub fn timeline_summary(&self) -> &str {
        [&self.summary, &self.meta_description, &self.title]
            .into_iter()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or("")
    }

    pub fn to_blog_article(&self) -> BlogArticle {
        BlogArticle {
            title: self.title.trim().to_string(),
            meta_description: self.meta_description.trim().to_string(),
            slug: self.slug.clone(),
            html_content: self.html_content.clone(),
            word_count: None,
        }
    }
}
