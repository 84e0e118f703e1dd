//! Curated topic lists with a seedable random pick

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{CampaignPhase, ContentType};

use crate::traits::TopicSource;

const EVERGREEN_TOPICS: &[&str] = &[
    "quién puede acogerse a la regularización extraordinaria 2026",
    "los documentos que puedes preparar desde ya",
    "la cláusula de vulnerabilidad: por qué no necesitas oferta de trabajo",
    "cómo demostrar tu tiempo de estancia en España",
    "qué cambia respecto a la regularización de 2005",
    "cómo reconocer y evitar estafas con tus papeles",
    "cuánto cuesta regularizarte y qué incluye cada fase",
    "cómo pedir el certificado de antecedentes penales de tu país",
    "qué pasa después de presentar la solicitud",
    "el programa de referidos Cónsul y Embajador",
];

const WHATSAPP_KINDS: &[&str] = &["news", "deadline", "educational", "referral", "re-engagement"];
const STORY_KINDS: &[&str] = &["poll", "question", "countdown", "quiz", "tip"];

fn phase_topics(phase: CampaignPhase) -> &'static [&'static str] {
    match phase {
        CampaignPhase::PreBoe => &[
            "cómo prepararte antes de que se publique el BOE",
            "mitos y verdades sobre la regularización",
        ],
        CampaignPhase::BoeWeek => &[
            "qué dice el BOE recién publicado",
            "los primeros pasos ahora que la ley es oficial",
        ],
        CampaignPhase::AppsOpen => &[
            "historias de quienes ya presentaron su solicitud",
            "por qué empezar hoy y no esperar",
        ],
        CampaignPhase::FinalPush => &[
            "cuántos días quedan para el 30 de junio",
            "lo que pierdes si no presentas a tiempo",
        ],
    }
}

/// Picks from static, phase-aware topic lists
pub struct CuratedTopicSource {
    rng: Mutex<StdRng>,
}

impl CuratedTopicSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic picks for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, options: &[&'static str]) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        options.choose(&mut *rng).copied().unwrap_or(EVERGREEN_TOPICS[0])
    }
}

impl Default for CuratedTopicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicSource for CuratedTopicSource {
    fn suggest(&self, content_type: ContentType, phase: CampaignPhase) -> String {
        match content_type {
            ContentType::Whatsapp => format!("type: {}", self.pick(WHATSAPP_KINDS)),
            ContentType::Story => format!("type: {}", self.pick(STORY_KINDS)),
            _ => {
                let options: Vec<&'static str> = phase_topics(phase)
                    .iter()
                    .chain(EVERGREEN_TOPICS.iter())
                    .copied()
                    .collect();
                self.pick(&options).to_string()
            }
        }
    }
}
