//! Weekly pack composition
//!
//! Seven fixed sections run one after another through a [`BatchRunner`].
//! A section that fails entirely still contributes its report; the next
//! section always runs.

use std::sync::Arc;

use shared::{component_info, Component, ContentType, RequesterId};
use tokio::time::Instant;

use crate::traits::BatchRunner;
use crate::types::{BatchSpec, WeeklyReport};

/// One section of the weekly pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySection {
    pub content_type: ContentType,
    pub count: usize,
    pub topics: Vec<String>,
}

impl WeeklySection {
    fn new(content_type: ContentType, count: usize) -> Self {
        Self {
            content_type,
            count,
            topics: Vec::new(),
        }
    }

    fn with_topics(mut self, topics: impl IntoIterator<Item = String>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    fn to_spec(&self, requester: RequesterId) -> BatchSpec {
        let spec = BatchSpec::new(self.content_type, self.count, requester);
        if self.topics.is_empty() {
            spec
        } else {
            spec.with_topics(self.topics.clone())
        }
    }
}

fn typed(kinds: &[&str]) -> Vec<String> {
    kinds.iter().map(|kind| format!("type: {kind}")).collect()
}

/// The fixed weekly plan: 46 pieces over seven sections
pub fn weekly_plan() -> Vec<WeeklySection> {
    let captions = (0..10).map(|i| {
        if i % 2 == 0 {
            "for instagram".to_string()
        } else {
            "for facebook".to_string()
        }
    });

    vec![
        WeeklySection::new(ContentType::Tiktok, 7),
        WeeklySection::new(ContentType::Carousel, 5),
        WeeklySection::new(ContentType::Story, 14).with_topics(typed(&[
            "poll",
            "question",
            "countdown",
            "quiz",
            "tip",
            "poll",
            "question",
            "countdown",
            "quiz",
            "tip",
            "poll",
            "question",
            "countdown",
            "tip",
        ])),
        WeeklySection::new(ContentType::Whatsapp, 3).with_topics(typed(&["news", "educational", "referral"])),
        WeeklySection::new(ContentType::FbPost, 5),
        WeeklySection::new(ContentType::Blog, 2),
        WeeklySection::new(ContentType::Caption, 10).with_topics(captions),
    ]
}

pub struct WeeklyComposer<R: BatchRunner + ?Sized> {
    runner: Arc<R>,
}

impl<R: BatchRunner + ?Sized> WeeklyComposer<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    /// Run every section in plan order
    pub async fn compose(&self, requester: RequesterId) -> WeeklyReport {
        let started = Instant::now();
        let plan = weekly_plan();
        let mut sections = Vec::with_capacity(plan.len());

        for (position, section) in plan.iter().enumerate() {
            component_info!(
                Component::Orchestrator,
                "🗓️ Weekly section {}/{}: {} x{}",
                position + 1,
                plan.len(),
                section.content_type,
                section.count
            );
            sections.push(self.runner.run_batch(section.to_spec(requester)).await);
        }

        let report = WeeklyReport {
            sections,
            elapsed: started.elapsed(),
        };
        component_info!(
            Component::Orchestrator,
            "🗓️ Weekly pack done: {}/{} pieces",
            report.succeeded(),
            report.total()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_totals_46_pieces() {
        let plan = weekly_plan();
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.iter().map(|s| s.count).sum::<usize>(), 46);
    }

    #[test]
    fn test_every_story_slot_has_a_type() {
        let plan = weekly_plan();
        let stories = plan.iter().find(|s| s.content_type == ContentType::Story).unwrap();
        let spec = stories.to_spec(RequesterId(1));

        assert_eq!(spec.topic_for(0).as_deref(), Some("type: poll"));
        assert_eq!(spec.topic_for(13).as_deref(), Some("type: tip"));
        assert!((0..14).all(|i| spec.topic_for(i).is_some()));
    }

    #[test]
    fn test_captions_alternate_platforms() {
        let plan = weekly_plan();
        let captions = plan.iter().find(|s| s.content_type == ContentType::Caption).unwrap();
        assert_eq!(captions.topics[0], "for instagram");
        assert_eq!(captions.topics[1], "for facebook");
        assert_eq!(captions.topics.len(), 10);
    }
}
