//! Test fixtures and data for orchestrator tests
//!
//! `FakeApi` stands in for the generative API: a responder closure decides
//! the delay and outcome of every call, and the fake records what it was
//! asked and how many calls overlapped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use generator::{Completion, CompletionApi, CompletionRequest};
use orchestrator::{Clock, InboundCommand, InboundMessage};
use serde_json::json;
use shared::{ApiFailure, ContentType, RequesterId};

/// Standard test data
pub struct TestFixtures;

impl TestFixtures {
    pub const TEAM_MEMBER: RequesterId = RequesterId(1);
    pub const OUTSIDER: RequesterId = RequesterId(99);
    pub const CHAT_ID: i64 = 500;
    pub const BLOG_SLUG: &'static str = "requisitos-regularizacion";

    /// A Monday before applications open, so the date phase is pre-BOE
    pub fn pre_boe_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    pub fn message(text: &str, requester: RequesterId) -> InboundMessage {
        InboundMessage {
            chat_id: Self::CHAT_ID,
            requester,
            text: text.to_string(),
        }
    }

    /// Decode a command sent by `requester`
    pub fn command(text: &str, requester: RequesterId) -> InboundCommand {
        InboundCommand::parse(&Self::message(text, requester)).expect("fixture text must be a command")
    }

    pub fn team_command(text: &str) -> InboundCommand {
        Self::command(text, Self::TEAM_MEMBER)
    }
}

pub fn completion(text: &str) -> Completion {
    Completion {
        text: text.to_string(),
        input_tokens: 120,
        output_tokens: 340,
        model: "test-model".to_string(),
    }
}

/// Valid completion JSON for a content type, with `marker` in its main text
pub fn payload_json(content_type: ContentType, marker: &str) -> String {
    let value = match content_type {
        ContentType::Blog => json!({
            "title": marker,
            "meta_description": "Guía práctica",
            "slug": TestFixtures::BLOG_SLUG,
            "html_content": format!("<h2>Requisitos</h2><p>{marker}</p>"),
            "word_count": 900
        }),
        ContentType::Tiktok => json!({
            "format": "talking head",
            "duration_seconds": 45,
            "hook": marker,
            "script": "Guion de prueba",
            "text_overlays": ["Plazo: 30 de junio"],
            "hashtags": "#regularizacion",
            "production_tip": "Luz natural"
        }),
        ContentType::Carousel => json!({
            "topic": marker,
            "slides": [
                {"slide_number": 1, "headline": marker, "body": "Primera"},
                {"slide_number": 2, "headline": "Requisitos", "body": "Segunda"}
            ],
            "caption": "Guarda este post",
            "hashtags": "#papeles"
        }),
        ContentType::Caption => json!({
            "platform": "instagram",
            "caption_text": marker,
            "hashtags": "#papeles2026",
            "cta": "Link en bio"
        }),
        ContentType::Whatsapp => json!({
            "type": "news",
            "message_text": marker,
            "suggested_send_time": "09:00"
        }),
        ContentType::FbPost => json!({
            "post_text": marker,
            "suggested_groups": ["Latinos en Madrid"],
            "cta_link": "https://tuspapeles2026.es"
        }),
        ContentType::Story => json!({
            "type": "poll",
            "main_text": marker,
            "sticker_suggestion": "poll",
            "background_suggestion": "azul"
        }),
    };
    value.to_string()
}

fn topics_json() -> String {
    json!({
        "topics": [
            {"title": "Plazos clave", "angle": "Fechas que no puedes perder", "best_formats": ["tiktok", "carousel"]},
            {"title": "Documentos", "angle": "Qué preparar ya", "best_formats": ["blog"]}
        ]
    })
    .to_string()
}

fn news_analysis_json() -> String {
    json!({
        "analysis": [
            {"headline": "El Gobierno aprueba la regularización", "summary": "Resumen", "content_ideas": ["TikTok explicativo"]}
        ]
    })
    .to_string()
}

/// Split a user message of the form `Generate a {kind} about: {topic}`
pub fn parse_request(request: &CompletionRequest) -> (String, String) {
    let body = request.user.strip_prefix("Generate a ").unwrap_or(&request.user);
    match body.split_once(" about: ") {
        Some((kind, topic)) => (kind.to_string(), topic.to_string()),
        None => (body.split_whitespace().next().unwrap_or("").to_string(), String::new()),
    }
}

/// Content type named in a request, if it is a content request
pub fn requested_type(request: &CompletionRequest) -> Option<ContentType> {
    parse_request(request).0.parse().ok()
}

/// Valid answer for any request, echoing the topic as the marker
pub fn echo_answer(request: &CompletionRequest) -> String {
    let (kind, topic) = parse_request(request);
    match kind.as_str() {
        "topics" => topics_json(),
        "news_analysis" => news_analysis_json(),
        other => match other.parse::<ContentType>() {
            Ok(content_type) => payload_json(content_type, &topic),
            Err(_) => "{}".to_string(),
        },
    }
}

type Responder = dyn Fn(usize, &CompletionRequest) -> (Duration, Result<Completion, ApiFailure>) + Send + Sync;

/// Scriptable completion API
pub struct FakeApi {
    responder: Box<Responder>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeApi {
    /// `responder` gets the zero-based call number and the request
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &CompletionRequest) -> (Duration, Result<Completion, ApiFailure>) + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request immediately with a valid payload
    pub fn echo() -> Self {
        Self::echo_with_delay(Duration::ZERO)
    }

    pub fn echo_with_delay(delay: Duration) -> Self {
        Self::new(move |_, request| (delay, Ok(completion(&echo_answer(request)))))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Decrements the in-flight count even when the call is aborted mid-sleep
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionApi for FakeApi {
    async fn complete(&self, request: &CompletionRequest, _timeout: Duration) -> Result<Completion, ApiFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let (delay, outcome) = (self.responder)(call, request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

/// Clock that only moves when told to
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
