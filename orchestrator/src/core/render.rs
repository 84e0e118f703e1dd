//! Chat rendering
//!
//! Turns payloads and reports into Telegram Markdown. Model text is always
//! passed through [`escape_md`]; our own `*bold*` markers are left alone.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use shared::{
    BatchReport, BlogArticle, BotError, CampaignPhase, Carousel, ContentPayload, ContentType, FacebookPost,
    GenerationOutcome, NewsAnalysis, NewsArticle, SocialCaption, StoryConcept, TiktokScript, TopicSuggestions,
    WhatsappMessage,
};

use crate::types::WeeklyReport;

/// Hard limit of one Telegram message
pub const TELEGRAM_MAX_LEN: usize = 4096;

const BLOG_PREVIEW_CHARS: usize = 3000;

/// Article ids by batch position, for blog results that were cached
pub type ArticleIds = BTreeMap<usize, String>;

pub fn escape_md(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '[' | ']' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Split on the last newline before `limit` characters, or hard-split when a
/// single line is longer than that.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        let cut = rest.char_indices().nth(limit).map(|(i, _)| i).unwrap_or(rest.len());
        let split_at = match rest[..cut].rfind('\n') {
            Some(i) if i > 0 => i,
            _ => cut,
        };
        chunks.push(rest[..split_at].to_string());
        rest = rest[split_at..].trim_start_matches('\n');
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

fn strip_tags(html: &str) -> String {
    let mut plain = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    plain
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

pub fn render_blog(article: &BlogArticle) -> String {
    let words = article.words();
    let reading_time = (words / 200).max(1);
    let plain = strip_tags(&article.html_content);

    format!(
        "📝 *BLOG ARTICLE READY*\n\n\
         *Title:* {}\n\
         *Meta:* {}\n\
         *Slug:* {}\n\
         *Words:* {} | *Reading time:* {} min\n\n\
         ---ARTICLE START---\n{}\n---ARTICLE END---",
        escape_md(or_default(&article.title, "Sin título")),
        escape_md(&article.meta_description),
        escape_md(&article.url_slug()),
        words,
        reading_time,
        escape_md(truncate_chars(plain.trim(), BLOG_PREVIEW_CHARS)),
    )
}

pub fn render_tiktok(script: &TiktokScript) -> String {
    let overlays = script
        .text_overlays
        .iter()
        .enumerate()
        .map(|(i, overlay)| format!("  {}. {}", i + 1, escape_md(overlay)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🎬 *TIKTOK SCRIPT*\n\n\
         *Format:* {}\n\
         *Duration:* ~{}s\n\n\
         🎯 *HOOK (first 2 sec):*\n\"{}\"\n\n\
         📝 *SCRIPT:*\n\"{}\"\n\n\
         📱 *TEXT OVERLAYS:*\n{}\n\n\
         #️⃣ {}\n\n\
         💡 *TIP:* {}",
        escape_md(or_default(&script.format, "face-to-camera")),
        script.duration_seconds.unwrap_or(30),
        escape_md(&script.hook),
        escape_md(&script.script),
        overlays,
        escape_md(&script.hashtags),
        escape_md(&script.production_tip),
    )
}

pub fn render_carousel(carousel: &Carousel) -> String {
    let slides: String = carousel
        .slides
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            format!(
                "\n*Slide {}:*\n  📌 {}\n  {}\n",
                slide.slide_number.unwrap_or(i as u32 + 1),
                escape_md(&slide.headline),
                escape_md(&slide.body)
            )
        })
        .collect();

    format!(
        "📸 *INSTAGRAM CAROUSEL*\n\n*Topic:* {}\n{}\n✏️ *CAPTION:*\n{}\n\n#️⃣ {}",
        escape_md(&carousel.topic),
        slides,
        escape_md(&carousel.caption),
        escape_md(&carousel.hashtags),
    )
}

pub fn render_caption(caption: &SocialCaption) -> String {
    format!(
        "✏️ *SOCIAL MEDIA CAPTION*\n\n*Platform:* {}\n\n📝 *Caption:*\n{}\n\n#️⃣ {}\n\n👉 *CTA:* {}",
        escape_md(or_default(&caption.platform, "general")),
        escape_md(&caption.caption_text),
        escape_md(&caption.hashtags),
        escape_md(&caption.cta),
    )
}

pub fn render_whatsapp(message: &WhatsappMessage) -> String {
    format!(
        "📱 *WHATSAPP MESSAGE*\n\n*Type:* {}\n*Send at:* {}\n\n💬 *Message:*\n{}\n\n_{} characters_",
        escape_md(or_default(&message.kind, "general")),
        escape_md(or_default(&message.suggested_send_time, "any")),
        escape_md(&message.message_text),
        message.message_text.chars().count(),
    )
}

pub fn render_fbpost(post: &FacebookPost) -> String {
    let groups = if post.suggested_groups.is_empty() {
        "any".to_string()
    } else {
        post.suggested_groups.join(", ")
    };

    format!(
        "📘 *FACEBOOK POST*\n\n📝 *Post:*\n{}\n\n🎯 *Suggested groups:* {}\n🔗 *CTA link:* {}",
        escape_md(&post.post_text),
        escape_md(&groups),
        escape_md(&post.cta_link),
    )
}

pub fn render_story(story: &StoryConcept) -> String {
    format!(
        "📖 *INSTAGRAM STORY*\n\n*Type:* {}\n\n📝 *Text:*\n{}\n\n🎨 *Sticker:* {}\n🖼 *Background:* {}",
        escape_md(or_default(&story.kind, "tip")),
        escape_md(&story.main_text),
        escape_md(&story.sticker_suggestion),
        escape_md(&story.background_suggestion),
    )
}

pub fn render_payload(payload: &ContentPayload) -> String {
    match payload {
        ContentPayload::Blog(article) => render_blog(article),
        ContentPayload::Tiktok(script) => render_tiktok(script),
        ContentPayload::Carousel(carousel) => render_carousel(carousel),
        ContentPayload::Caption(caption) => render_caption(caption),
        ContentPayload::Whatsapp(message) => render_whatsapp(message),
        ContentPayload::FbPost(post) => render_fbpost(post),
        ContentPayload::Story(story) => render_story(story),
    }
}

/// Footer appended to a cached blog article
pub fn publish_hint(article_id: &str) -> String {
    format!("\n\n🆔 Article id: `{article_id}`\n🚀 /publish ph {article_id}  ·  🌐 /publish tp {article_id}")
}

pub fn render_error(content_type: ContentType, error: &BotError) -> String {
    format!("❌ Error generating {}: {}", content_type, escape_md(&error.to_string()))
}

/// One message per batch entry in original order, then a summary line
pub fn render_batch(report: &BatchReport, article_ids: &ArticleIds) -> Vec<String> {
    let total = report.total();
    let mut messages = Vec::with_capacity(total + 1);

    for result in &report.results {
        let position = result.index + 1;
        match &result.outcome {
            GenerationOutcome::Succeeded(payload) => {
                let mut text = format!("*{} {}/{}*\n\n{}", report.content_type, position, total, render_payload(payload));
                if let Some(id) = article_ids.get(&result.index) {
                    text.push_str(&publish_hint(id));
                }
                messages.push(text);
            }
            GenerationOutcome::Failed(error) => messages.push(format!(
                "⚠️ Error on {} {}/{}: {}",
                report.content_type,
                position,
                total,
                escape_md(&error.to_string())
            )),
        }
    }

    messages.push(batch_summary(report));
    messages
}

fn batch_summary(report: &BatchReport) -> String {
    let mut summary = format!(
        "✅ *{} BATCH DONE* — {}/{} generated",
        report.content_type.as_str().to_uppercase(),
        report.succeeded,
        report.total()
    );
    if report.failed > 0 {
        summary.push_str(&format!(" ({} failed, {})", report.failed, report.status));
    }
    summary
}

/// Section headers, every section's messages, and a grand total
pub fn render_weekly(report: &WeeklyReport, article_ids: &[ArticleIds]) -> Vec<String> {
    let empty = ArticleIds::new();
    let sections = report.sections.len();
    let mut messages = Vec::new();

    for (position, section) in report.sections.iter().enumerate() {
        messages.push(format!(
            "📦 *Section {}/{}: {}*",
            position + 1,
            sections,
            section.content_type.label()
        ));
        messages.extend(render_batch(section, article_ids.get(position).unwrap_or(&empty)));
    }

    let subtotals = report
        .sections
        .iter()
        .map(|s| format!("  {}: {}/{}", s.content_type, s.succeeded, s.total()))
        .collect::<Vec<_>>()
        .join("\n");

    messages.push(format!(
        "✅ *WEEKLY PACK COMPLETE* — {}/{} pieces generated\n\n{}{}",
        report.succeeded(),
        report.total(),
        subtotals,
        if report.failed() > 0 {
            format!("\n\n⚠️ {} piece(s) failed", report.failed())
        } else {
            String::new()
        }
    ));
    messages
}

/// Everything `/stats` shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub today: u64,
    pub this_week: u64,
    pub total: u64,
    pub failures: u64,
    pub by_type: BTreeMap<ContentType, u64>,
    pub last_weekly: Option<NaiveDateTime>,
    pub phase: CampaignPhase,
    pub overridden: bool,
    pub days_to_deadline: i64,
}

pub fn render_stats(stats: &StatsView) -> String {
    let by_type = if stats.by_type.is_empty() {
        "  No content generated yet".to_string()
    } else {
        stats
            .by_type
            .iter()
            .map(|(content_type, count)| format!("  {content_type}: {count}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let last_weekly = stats
        .last_weekly
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Never".to_string());
    let phase = if stats.overridden {
        format!("{} (override)", stats.phase)
    } else {
        stats.phase.to_string()
    };

    format!(
        "📊 *GENERATION STATS*\n\n\
         *Today:* {}\n\
         *This week:* {}\n\
         *Total:* {}\n\
         *Failures:* {}\n\n\
         *By type:*\n{}\n\n\
         *Last /weekly:* {}\n\
         *Phase:* {}\n\
         *Days to deadline:* {}",
        stats.today,
        stats.this_week,
        stats.total,
        stats.failures,
        escape_md(&by_type),
        last_weekly,
        escape_md(&phase),
        stats.days_to_deadline,
    )
}

pub fn render_news(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return "📰 No recent news found.".to_string();
    }

    let mut text = String::from("📰 *LATEST NEWS*\n\n");
    for (i, article) in articles.iter().enumerate() {
        text.push_str(&format!(
            "*{}.* {}\n   Source: {} | {}\n\n",
            i + 1,
            escape_md(&article.title),
            escape_md(&article.source),
            escape_md(&article.published)
        ));
    }
    text
}

pub fn render_news_analysis(analysis: &NewsAnalysis) -> String {
    let mut text = String::from("🧠 *CONTENT IDEAS FROM NEWS*\n\n");
    for item in &analysis.analysis {
        text.push_str(&format!("📌 *{}*\n{}\n", escape_md(&item.headline), escape_md(&item.summary)));
        for idea in &item.content_ideas {
            text.push_str(&format!("  → {}\n", escape_md(idea)));
        }
        text.push('\n');
    }
    text
}

pub fn render_topics(suggestions: &TopicSuggestions, phase: CampaignPhase) -> String {
    let mut text = format!(
        "💡 *{} TOPIC SUGGESTIONS* (Phase: {})\n\n",
        suggestions.topics.len(),
        escape_md(phase.as_str())
    );
    for (i, topic) in suggestions.topics.iter().enumerate() {
        text.push_str(&format!(
            "*{}.* {}\n   📐 {}\n   📱 Best for: {}\n\n",
            i + 1,
            escape_md(&topic.title),
            escape_md(&topic.angle),
            escape_md(&topic.best_formats.join(", "))
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ContentRequest, GenerationResult, RequesterId};
    use std::time::Duration;

    #[test]
    fn test_escape_md() {
        assert_eq!(escape_md("a_b [c] `d` *e*"), "a\\_b \\[c\\] \\`d\\` *e*");
    }

    #[test]
    fn test_split_prefers_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 10), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_hard_cuts_long_lines() {
        let chunks = split_message(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_split_is_char_safe() {
        let text = "ñ".repeat(TELEGRAM_MAX_LEN + 10);
        let chunks = split_message(&text, TELEGRAM_MAX_LEN);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), TELEGRAM_MAX_LEN);
    }

    #[test]
    fn test_short_message_is_untouched() {
        assert_eq!(split_message("hola", TELEGRAM_MAX_LEN), vec!["hola"]);
        assert_eq!(split_message("", TELEGRAM_MAX_LEN), vec![""]);
    }

    #[test]
    fn test_blog_strips_html_and_escapes() {
        let article = BlogArticle {
            title: "Plazo_final".into(),
            meta_description: String::new(),
            slug: String::new(),
            html_content: "<h2>Hola</h2><p>mundo</p>".into(),
            word_count: None,
        };
        let text = render_blog(&article);
        assert!(text.contains("Plazo\\_final"));
        assert!(text.contains("Holamundo"));
        assert!(text.contains("*Slug:* article"));
    }

    #[test]
    fn test_batch_keeps_order_and_marks_failures() {
        let request = ContentRequest {
            content_type: ContentType::Whatsapp,
            topic: None,
            requester: RequesterId(1),
        };
        let ok = GenerationResult {
            index: 0,
            request: request.clone(),
            outcome: GenerationOutcome::Succeeded(ContentPayload::Whatsapp(WhatsappMessage {
                kind: "news".into(),
                message_text: "Hola".into(),
                suggested_send_time: String::new(),
            })),
            latency: Duration::from_millis(5),
        };
        let failed = GenerationResult {
            index: 1,
            request,
            outcome: GenerationOutcome::Failed(BotError::RateLimited),
            latency: Duration::from_millis(5),
        };
        let report = BatchReport::from_results(ContentType::Whatsapp, vec![ok, failed], Duration::from_secs(1));

        let messages = render_batch(&report, &ArticleIds::new());
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("*whatsapp 1/2*"));
        assert!(messages[1].starts_with("⚠️ Error on whatsapp 2/2"));
        assert!(messages[2].contains("1/2 generated (1 failed, partial)"));
    }
}
