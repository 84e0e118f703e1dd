//! Weekly pack composition with a failing section

mod common;

use std::time::Duration;

use common::fixtures::{completion, echo_answer, requested_type};
use common::{BotBuilder, FakeApi, TestFixtures, TestHelpers};
use orchestrator::{BatchSettings, WeeklyComposer};
use shared::{ApiFailure, BatchStatus, ContentType};

fn carousel_outage() -> FakeApi {
    FakeApi::new(|_, request| {
        let outcome = match requested_type(request) {
            Some(ContentType::Carousel) => Err(ApiFailure::InvalidRequest("slides rejected".to_string())),
            _ => Ok(completion(&echo_answer(request))),
        };
        (Duration::from_millis(20), outcome)
    })
}

#[tokio::test(start_paused = true)]
async fn test_failed_section_does_not_stop_the_pack() {
    // Arrange
    let harness = TestHelpers::orchestrator(carousel_outage(), BatchSettings::default()).await;
    let composer = WeeklyComposer::new(harness.batches.clone());

    // Act
    let report = composer.compose(TestFixtures::TEAM_MEMBER).await;

    // Assert
    let types: Vec<_> = report.sections.iter().map(|s| s.content_type).collect();
    assert_eq!(
        types,
        vec![
            ContentType::Tiktok,
            ContentType::Carousel,
            ContentType::Story,
            ContentType::Whatsapp,
            ContentType::FbPost,
            ContentType::Blog,
            ContentType::Caption,
        ]
    );
    assert_eq!(report.total(), 46);
    assert_eq!(report.failed(), 5);
    assert_eq!(report.succeeded(), 41);

    for section in &report.sections {
        if section.content_type == ContentType::Carousel {
            assert_eq!(section.failed, 5);
            assert_eq!(section.status, BatchStatus::Partial);
        } else {
            assert_eq!(section.status, BatchStatus::Complete, "{} section", section.content_type);
        }
    }
    assert_eq!(harness.api.calls(), 46);
}

#[tokio::test(start_paused = true)]
async fn test_sections_carry_their_planned_topics() {
    let harness = TestHelpers::orchestrator(FakeApi::echo(), BatchSettings::default()).await;

    let report = WeeklyComposer::new(harness.batches.clone())
        .compose(TestFixtures::TEAM_MEMBER)
        .await;

    let stories = &report.sections[2];
    assert_eq!(stories.total(), 14);
    assert_eq!(stories.results[0].request.topic.as_deref(), Some("type: poll"));
    assert_eq!(stories.results[13].request.topic.as_deref(), Some("type: tip"));

    let whatsapp = &report.sections[3];
    let kinds: Vec<_> = whatsapp.results.iter().filter_map(|r| r.request.topic.clone()).collect();
    assert_eq!(kinds, vec!["type: news", "type: educational", "type: referral"]);

    let captions = &report.sections[6];
    assert_eq!(captions.results[0].request.topic.as_deref(), Some("for instagram"));
    assert_eq!(captions.results[1].request.topic.as_deref(), Some("for facebook"));
}

#[tokio::test(start_paused = true)]
async fn test_weekly_reply_reports_totals() {
    let test = BotBuilder::new().with_api(carousel_outage()).build().await;

    let replies = test.bot.handle(&TestFixtures::team_command("/weekly")).await;

    let summary = replies.last().unwrap();
    assert!(summary.starts_with("✅ *WEEKLY PACK COMPLETE* — 41/46 pieces generated"), "{summary}");
    assert!(summary.contains("carousel: 0/5"));
    assert!(summary.contains("⚠️ 5 piece(s) failed"));
    assert_eq!(replies.iter().filter(|r| r.starts_with("📦 *Section")).count(), 7);
}
