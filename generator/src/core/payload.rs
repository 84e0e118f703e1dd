//! Completion text to structured payload

use serde::de::DeserializeOwned;
use shared::{
    BlogArticle, BotError, BotResult, Carousel, ContentPayload, ContentType, FacebookPost, SocialCaption,
    StoryConcept, TiktokScript, WhatsappMessage,
};

/// Pull the JSON object out of a completion.
///
/// Strips a leading markdown code fence and keeps the span from the first
/// `{` to the last `}`. Returns `None` when no object is present.
pub fn extract_json(text: &str) -> Option<String> {
    let mut body = text.trim().to_string();

    if body.starts_with("```") {
        body = body.lines().skip(1).collect::<Vec<_>>().join("\n");
        if let Some(stripped) = body.trim_end().strip_suffix("```") {
            body = stripped.to_string();
        }
        body = body.trim().to_string();
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(body[start..=end].to_string())
}

/// Parse a completion into any JSON-shaped type
pub fn parse_json<T: DeserializeOwned>(text: &str) -> BotResult<T> {
    if text.trim().is_empty() {
        return Err(BotError::malformed("empty completion"));
    }
    let json = extract_json(text).ok_or_else(|| BotError::malformed("no JSON object in completion"))?;
    serde_json::from_str(&json).map_err(BotError::malformed)
}

/// Parse a completion into the payload for `content_type`
pub fn parse_payload(content_type: ContentType, text: &str) -> BotResult<ContentPayload> {
    let payload = match content_type {
        ContentType::Blog => ContentPayload::Blog(parse_json::<BlogArticle>(text)?),
        ContentType::Tiktok => ContentPayload::Tiktok(parse_json::<TiktokScript>(text)?),
        ContentType::Carousel => ContentPayload::Carousel(parse_json::<Carousel>(text)?),
        ContentType::Caption => ContentPayload::Caption(parse_json::<SocialCaption>(text)?),
        ContentType::Whatsapp => ContentPayload::Whatsapp(parse_json::<WhatsappMessage>(text)?),
        ContentType::FbPost => ContentPayload::FbPost(parse_json::<FacebookPost>(text)?),
        ContentType::Story => ContentPayload::Story(parse_json::<StoryConcept>(text)?),
    };
    Ok(payload)
}
