//! Prompt construction
//!
//! A system prompt is the brand brief, followed by the block for the active
//! campaign phase, followed by the format block for the requested kind of
//! output. The only non-determinism is topic selection when the requester did
//! not give one, and that is delegated to an injected [`TopicSource`].

use std::sync::Arc;

use shared::{CampaignPhase, ContentType, NewsArticle};

use crate::traits::TopicSource;

/// System and user message pair sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// What the model is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Content(ContentType),
    Topics,
    NewsAnalysis,
}

impl PromptKind {
    fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Content(content_type) => content_type.as_str(),
            PromptKind::Topics => "topics",
            PromptKind::NewsAnalysis => "news_analysis",
        }
    }
}

const BRAND_BRIEF: &str = r#"You are the content engine for tuspapeles2026.es, a legal technology service helping undocumented immigrants in Spain regularize their status under the 2026 extraordinary regularization decree.

BRAND VOICE:
- Warm, professional, simple Spanish
- Maximum 15-word sentences
- No legal jargon unless you explain it immediately
- Never condescending: these people are scared and vulnerable
- Acknowledge their fear, then offer hope
- Use "tú" not "usted" (informal, like a trusted friend)

TARGET AUDIENCE:
- Undocumented immigrants in Spain (500,000-840,000 eligible)
- 90% Latin American, 35% Colombian
- Ages 25-50, low-medium digital literacy
- WhatsApp is their primary communication channel
- Their fears: scams, deportation, wasting money, rejection, missing deadline
- Their desires: legal status, work permit, travel home, security for family

KEY FACTS TO WEAVE IN NATURALLY (don't force all into every piece):
- Vulnerability clause: NO job offer needed (biggest difference from 2005)
- 80-90% approval expected based on 2005 precedent (NEVER guarantee)
- Price: €199 prepay or €247 by phases (€29 + €89 + €129); competitors charge €350-450
- 1,000 slot capacity (creates urgency without being scammy)
- Backed by Pombo & Horowitz Abogados (25 years experience)
- AI-powered document validation, 24/7 availability via Telegram bot
- Digital submission confirmed, everything is online
- Cónsul/Embajador referral program: friends get €25 off

WHAT TO NEVER SAY:
- Never guarantee approval or use "100% success"
- Never use aggressive sales ("BUY NOW", "LIMITED TIME")
- Never be condescending about their education or situation
- Never use complex legal terms without explaining them
- Never make promises about timelines we can't control

CTAs (vary by content type):
- Blog: "Verifica tu elegibilidad gratis en tuspapeles2026.es"
- Social: "Link en bio → tuspapeles2026.es"
- WhatsApp: "Comparte con quien lo necesite"
- General: "Empieza gratis en t.me/tuspapeles2026bot"

SEO KEYWORDS (for blogs only):
regularización 2026, regularización extraordinaria España, papeles España 2026,
cómo regularizarse en España, documentos regularización, requisitos regularización

COMPETITORS (differentiate naturally, never attack):
- They charge €350-450, we charge €199-247
- They process manually, we use AI document validation
- They work business hours, our bot works 24/7
- They have no referral program, we have Cónsul/Embajador tiers
"#;

fn phase_block(phase: CampaignPhase) -> String {
    let (heading, guidance) = match phase {
        CampaignPhase::PreBoe => (
            "PRE-BOE",
            "Focus on 'get ready', 'prepare your documents now', 'understand the process'. \
             No hard sells. Build authority and trust.",
        ),
        CampaignPhase::BoeWeek => (
            "BOE WEEK (law just published)",
            "'It's official', 'the law has been published', 'act now to secure your spot'. \
             Heavy emphasis on the vulnerability clause and that no job offer is needed.",
        ),
        CampaignPhase::AppsOpen => (
            "APPLICATIONS OPEN",
            "Testimonials, social proof, scarcity ('X slots remaining'). Emphasize that people \
             who started early are already getting approvals. Fear of missing out.",
        ),
        CampaignPhase::FinalPush => (
            "FINAL PUSH (deadline approaching)",
            "Daily countdown to the June 30 deadline. 'If you don't apply now, this opportunity \
             may not come again for another 20 years.'",
        ),
    };

    format!(
        "\nCURRENT PHASE: {heading}\nContent tone: {tone}. Urgency: {urgency}. {guidance}\nTalking points: {points}.\n",
        tone = phase.tone(),
        urgency = phase.urgency(),
        points = phase.talking_points().join("; "),
    )
}

fn format_block(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Content(ContentType::Blog) => concat!(
            "\nCONTENT TYPE: BLOG ARTICLE\n",
            "Write a complete SEO blog article in Spanish. 600-900 words. ",
            "Include: H2 subheadings (use <h2> tags), internal links to tuspapeles2026.es, ",
            "a CTA paragraph at the end. Format the article body as clean HTML ready to embed.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"title": "string", "meta_description": "string (max 160 chars)", "#,
            r#""slug": "string (url-friendly)", "html_content": "string (HTML)", "word_count": number}"#,
        ),
        PromptKind::Content(ContentType::Tiktok) => concat!(
            "\nCONTENT TYPE: TIKTOK SCRIPT\n",
            "Write a TikTok script for 15-60 seconds.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"format": "face-to-camera|green-screen|pov|story-time|myth-vs-reality|quick-tips", "#,
            r#""duration_seconds": number, "hook": "string (first 2 seconds, must grab attention)", "#,
            r#""script": "string (full spoken text)", "text_overlays": ["string", "string", "string"], "#,
            r#""hashtags": "string", "production_tip": "string"}"#,
        ),
        PromptKind::Content(ContentType::Carousel) => concat!(
            "\nCONTENT TYPE: INSTAGRAM CAROUSEL\n",
            "Write Instagram carousel content with 6-8 slides.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"topic": "string", "slides": [{"slide_number": 1, "headline": "string", "body": "string"}], "#,
            r#""caption": "string (Instagram caption with line breaks)", "hashtags": "string (30 hashtags)"}"#,
        ),
        PromptKind::Content(ContentType::Caption) => concat!(
            "\nCONTENT TYPE: SOCIAL MEDIA CAPTION\n",
            "Write a social media caption.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"platform": "instagram|facebook", "caption_text": "string", "hashtags": "string", "cta": "string"}"#,
        ),
        PromptKind::Content(ContentType::Whatsapp) => concat!(
            "\nCONTENT TYPE: WHATSAPP BROADCAST MESSAGE\n",
            "Write a WhatsApp broadcast message. Must be under 500 characters. ",
            "Must feel personal, like a friend sharing useful info, not a company. ",
            "Must be highly shareable/forwardable.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"type": "news|deadline|educational|referral|re-engagement", "#,
            r#""message_text": "string (under 500 chars)", "suggested_send_time": "string"}"#,
        ),
        PromptKind::Content(ContentType::FbPost) => concat!(
            "\nCONTENT TYPE: FACEBOOK GROUP POST\n",
            "Write an organic Facebook group post. VALUE-FIRST: educational, not promotional. ",
            "Should feel like a real person sharing useful info. ",
            "Soft CTA at end linking to a blog article, not directly to the bot.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"post_text": "string", "suggested_groups": ["colombianos en Madrid", "latinos en Barcelona"], "#,
            r#""cta_link": "string"}"#,
        ),
        PromptKind::Content(ContentType::Story) => concat!(
            "\nCONTENT TYPE: INSTAGRAM STORY\n",
            "Write an Instagram Story concept.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"type": "poll|question|countdown|quiz|tip", "main_text": "string", "#,
            r#""sticker_suggestion": "string", "background_suggestion": "string"}"#,
        ),
        PromptKind::Topics => concat!(
            "\nCONTENT TYPE: TOPIC SUGGESTIONS\n",
            "Generate 10 content topic suggestions for the current phase of the campaign. ",
            "Each topic should work across multiple formats (blog, TikTok, carousel, etc.).\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"topics": [{"title": "string", "angle": "string", "best_formats": ["blog", "tiktok"]}]}"#,
        ),
        PromptKind::NewsAnalysis => concat!(
            "\nCONTENT TYPE: NEWS ANALYSIS\n",
            "You are given recent news articles about regularización in Spain. ",
            "For each article, suggest 1-2 content ideas we could create based on the news.\n\n",
            "IMPORTANT: Return ONLY valid JSON with this exact structure:\n",
            r#"{"analysis": [{"headline": "string", "summary": "string", "content_ideas": ["string"]}]}"#,
        ),
    }
}

/// Full system prompt for a kind of output in a phase
pub fn system_prompt(kind: PromptKind, phase: CampaignPhase) -> String {
    let mut prompt = String::with_capacity(BRAND_BRIEF.len() + 1024);
    prompt.push_str(BRAND_BRIEF);
    prompt.push_str(&phase_block(phase));
    prompt.push_str(format_block(kind));
    prompt
}

const HEADLINE_EDITOR: &str = "You evaluate news headlines about Spain's 2026 regularización extraordinaria. \
Pick ONLY headlines that are genuinely new, relevant, and would interest undocumented immigrants in Spain. \
Respond with ONLY a JSON array of the headline numbers worth covering (e.g. [1, 3]). If none are worth it, respond []. \
Max 2 picks per batch. Skip duplicates, opinion pieces, and non-Spain news.";

const LEGAL_FACTS: &str = r#"
LEGAL FACTS — NEVER GET THESE WRONG:
- Residence requirement: 5 MONTHS (not years)
- Job offer: NOT REQUIRED (vulnerability clause)
- Application window: April 1 – June 30, 2026
- Process: 100% online
- Price: from €199 (competitors €350-450)
- Approval rate: 80-90% EXPECTED (never say guaranteed)
- All nationalities eligible
- Cutoff: must be in Spain before December 31, 2025
"#;

const NEWS_POST_FORMAT: &str = r#"Respond with a JSON object with these fields:
- title: Article title (Spanish)
- slug: URL-friendly slug (lowercase, hyphens, no accents)
- meta_description: SEO meta description (150 chars max)
- category: one of: noticias, guia, mitos, analisis, historias
- summary: 1-2 sentence summary for the Estado timeline
- html_content: The article body as HTML (h2, h3, p, ul, li, strong, em tags only). 500-800 words. Include practical implications for readers.
Respond ONLY with the JSON object, no markdown fences."#;

/// Ask which headlines deserve an article. Headlines are numbered from 1 and
/// the answer is expected to be a JSON array of those numbers.
pub fn headline_selection(headlines: &[NewsArticle]) -> Prompt {
    let listing = headlines
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {} — {}", i + 1, h.title, h.summary.chars().take(100).collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n");

    Prompt {
        system: HEADLINE_EDITOR.to_string(),
        user: listing,
    }
}

/// Ask for a complete blog post about one headline
pub fn news_post(headline: &NewsArticle) -> Prompt {
    Prompt {
        system: format!(
            "You write blog articles for tuspapeles2026.es, a Spanish legal service helping undocumented \
             immigrants with Spain's 2026 regularización extraordinaria. Write in Castilian Spanish. \
             Professional but warm tone. {LEGAL_FACTS}\n{NEWS_POST_FORMAT}"
        ),
        user: format!(
            "Write a blog article about this news:\n\nHeadline: {}\nSummary: {}\nSource: {}\n\n\
             Make it informative and practical for our audience.",
            headline.title, headline.summary, headline.link
        ),
    }
}

/// Builds prompts for content requests and the auxiliary brainstorm prompts
#[derive(Clone)]
pub struct PromptBuilder {
    topics: Arc<dyn TopicSource>,
}

impl PromptBuilder {
    pub fn new(topics: Arc<dyn TopicSource>) -> Self {
        Self { topics }
    }

    /// Build the prompt for one piece of content.
    ///
    /// A missing or blank topic is replaced by one from the topic source, so
    /// the user message always names a concrete subject.
    pub fn build(&self, content_type: ContentType, topic: Option<&str>, phase: CampaignPhase) -> Prompt {
        let topic = match topic.map(str::trim).filter(|t| !t.is_empty()) {
            Some(topic) => topic.to_string(),
            None => self.topics.suggest(content_type, phase),
        };

        Prompt {
            system: system_prompt(PromptKind::Content(content_type), phase),
            user: format!("Generate a {} about: {}", content_type.as_str(), topic),
        }
    }

    /// Ten cross-format topic ideas for the phase
    pub fn topic_suggestions(&self, phase: CampaignPhase) -> Prompt {
        Prompt {
            system: system_prompt(PromptKind::Topics, phase),
            user: format!(
                "Generate a {} on a relevant topic for this phase of the campaign",
                PromptKind::Topics.as_str()
            ),
        }
    }

    /// Content ideas for a set of headlines
    pub fn news_analysis(&self, phase: CampaignPhase, articles: &[NewsArticle]) -> Prompt {
        let summary = articles
            .iter()
            .map(|a| format!("- {} ({})", a.title, a.source))
            .collect::<Vec<_>>()
            .join("\n");

        Prompt {
            system: system_prompt(PromptKind::NewsAnalysis, phase),
            user: format!(
                "Generate a {} about: Analyze these recent news articles:\n{}",
                PromptKind::NewsAnalysis.as_str(),
                summary
            ),
        }
    }
}
