//! Blog publishing helpers
//!
//! Maps `/publish` arguments to a target repository and renders the final
//! HTML page committed to it.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use shared::{BlogArticle, BotError, BotResult};

/// Site a blog article can be published to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    /// Law firm site
    Ph,
    /// Campaign site
    Tp,
}

impl PublishTarget {
    pub fn site_name(&self) -> &'static str {
        match self {
            PublishTarget::Ph => "PH-Site",
            PublishTarget::Tp => "tuspapeles2026",
        }
    }
}

impl FromStr for PublishTarget {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ph" => Ok(PublishTarget::Ph),
            "tp" => Ok(PublishTarget::Tp),
            other => Err(BotError::Publish {
                message: format!("unknown site '{other}', use ph or tp"),
            }),
        }
    }
}

/// Repository (`owner/name`) behind each target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRepos {
    pub ph: String,
    pub tp: String,
}

impl Default for PublishRepos {
    fn default() -> Self {
        Self {
            ph: "anacuero-bit/PH-Site".to_string(),
            tp: "anacuero-bit/tus-papeles-2026".to_string(),
        }
    }
}

impl PublishRepos {
    pub fn repo_for(&self, target: PublishTarget) -> &str {
        match target {
            PublishTarget::Ph => &self.ph,
            PublishTarget::Tp => &self.tp,
        }
    }
}

/// Parse `ph|tp <article id>`
pub fn parse_publish_args(args: &[String]) -> BotResult<(PublishTarget, String)> {
    match args {
        [site, id, ..] => Ok((site.parse()?, id.trim().to_string())),
        _ => Err(BotError::Publish {
            message: "usage: /publish ph|tp <article id>".to_string(),
        }),
    }
}

/// Repository path of an article page; the slug is sanitized first
pub fn blog_path(article: &BlogArticle) -> String {
    format!("blog/{}.html", article.url_slug())
}

pub fn commit_message(article: &BlogArticle) -> String {
    format!("Publish blog: {}", article.title.trim())
}

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MONTHS_SHORT: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS.get(date.month0() as usize).copied().unwrap_or("")
}

pub fn month_abbreviation(date: NaiveDate) -> &'static str {
    MONTHS_SHORT.get(date.month0() as usize).copied().unwrap_or("")
}

/// `09 de octubre de 2026`
pub fn spanish_date(date: NaiveDate) -> String {
    format!("{:02} de {} de {}", date.day(), month_name(date), date.year())
}

pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const PAGE_STYLE: &str = r#"        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.7;
            color: #333;
            max-width: 720px;
            margin: 0 auto;
            padding: 2rem 1rem;
            background: #fafafa;
        }
        header { margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 2px solid #2563eb; }
        header a { color: #2563eb; text-decoration: none; font-weight: bold; font-size: 1.1rem; }
        h1 { font-size: 2rem; line-height: 1.3; margin: 1rem 0; color: #1a1a1a; }
        .meta { color: #666; font-size: 0.9rem; margin-bottom: 2rem; }
        h2 { font-size: 1.4rem; margin: 1.5rem 0 0.8rem; color: #1a1a1a; }
        p { margin-bottom: 1rem; }
        a { color: #2563eb; }
        .cta-box { background: #2563eb; color: white; padding: 1.5rem; border-radius: 8px; text-align: center; margin: 2rem 0; }
        .cta-box a { color: white; font-weight: bold; }
        footer { margin-top: 3rem; padding-top: 1rem; border-top: 1px solid #ddd; font-size: 0.85rem; color: #888; text-align: center; }"#;

/// Full standalone page for a generated article. The article body is
/// model-produced HTML and is inserted as is.
pub fn wrap_blog_html(article: &BlogArticle, date: NaiveDate) -> String {
    let title = html_escape(article.title.trim());
    let meta = html_escape(article.meta_description.trim());

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | tuspapeles2026.es</title>
    <meta name="description" content="{meta}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{meta}">
    <meta property="og:type" content="article">
    <meta property="og:url" content="https://tuspapeles2026.es/blog/{slug}.html">
    <style>
{style}
    </style>
</head>
<body>
    <header>
        <a href="https://tuspapeles2026.es">← tuspapeles2026.es</a>
    </header>

    <article>
        <h1>{title}</h1>
        <div class="meta">Publicado el {date}</div>
        {body}
    </article>

    <div class="cta-box">
        <p>Verifica tu elegibilidad gratis</p>
        <p><a href="https://tuspapeles2026.es">tuspapeles2026.es</a> |
           <a href="https://t.me/tuspapeles2026bot">Telegram Bot</a></p>
    </div>

    <footer>
        &copy; 2026 tuspapeles2026.es · Respaldado por Pombo &amp; Horowitz Abogados
    </footer>
</body>
</html>"#,
        title = title,
        meta = meta,
        slug = article.url_slug(),
        style = PAGE_STYLE,
        date = spanish_date(date),
        body = article.html_content,
    )
}
