//! Command handling end to end against a fake generative API

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{completion, echo_answer, requested_type};
use common::{BotBuilder, FakeApi, FixedClock, TestFixtures};
use orchestrator::core::UNAUTHORIZED_REPLY;
use generator::MockTopicSource;
use orchestrator::traits::{MockNewsSource, MockPublisher};
use orchestrator::{OrchestratorError, BUSY_REPLY};
use shared::{ApiFailure, BotError, CampaignPhase, ContentType, NewsArticle};

fn article_id(reply: &str) -> String {
    let start = reply.find("/publish tp ").expect("reply carries a publish hint") + "/publish tp ".len();
    reply[start..].chars().take_while(|c| c.is_ascii_alphanumeric()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_outsider_gets_private_reply_and_no_generation() {
    // Arrange
    let mut topics = MockTopicSource::new();
    topics.expect_suggest().times(0);
    let test = BotBuilder::new().with_topics(Arc::new(topics)).build().await;
    let command = TestFixtures::command("/tiktok5", TestFixtures::OUTSIDER);

    // Act
    let (notes, replies) = test.handle_noting(&command).await;

    // Assert
    assert!(notes.is_empty());
    assert_eq!(replies, vec![UNAUTHORIZED_REPLY.to_string()]);
    assert_eq!(test.api.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_command_points_to_help() {
    let test = BotBuilder::new().build().await;

    let reply = test.send("/podcast").await;

    assert_eq!(reply, "Unknown command /podcast. Type /help to see all commands.");
    assert_eq!(test.api.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_and_help() {
    let test = BotBuilder::new().build().await;

    assert!(test.send("/start").await.contains("Phase: *pre\\_boe*"));
    let help = test.send("/help").await;
    for group in ["Single Generation", "Batch Generation", "Mega Batch", "Tools"] {
        assert!(help.contains(group), "help is missing {group}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_generation_uses_the_given_topic() {
    let test = BotBuilder::new().build().await;

    let reply = test.send("/whatsapp plazos").await;

    assert!(reply.contains("📱 *WHATSAPP MESSAGE*"));
    assert!(reply.contains("plazos"));
    let request = test.api.last_request().unwrap();
    assert_eq!(request.user, "Generate a whatsapp about: plazos");
}

#[tokio::test(start_paused = true)]
async fn test_caption_platform_and_subtype_arguments() {
    let test = BotBuilder::new().build().await;

    test.send("/caption requisitos fb").await;
    assert_eq!(
        test.api.last_request().unwrap().user,
        "Generate a caption about: for facebook. requisitos"
    );

    test.send("/story quiz").await;
    assert_eq!(test.api.last_request().unwrap().user, "Generate a story about: type: quiz");
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_is_reported() {
    let api = FakeApi::new(|_, _| (Duration::ZERO, Err(ApiFailure::AuthenticationFailed)));
    let test = BotBuilder::new().with_api(api).build().await;

    let reply = test.send("/fbpost").await;

    assert!(reply.starts_with("❌ Error generating fbpost:"), "{reply}");
    assert_eq!(test.api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_phase_override_reaches_every_prompt() {
    let test = BotBuilder::new().build().await;

    test.send("/tiktok").await;
    assert!(test.api.last_request().unwrap().system.contains("CURRENT PHASE: PRE-BOE"));

    assert_eq!(test.send("/phase final_push").await, "Phase set to: *final\\_push*");
    test.send("/carousel3").await;
    let requests = test.api.requests();
    assert_eq!(requests.len(), 4);
    for request in &requests[1..] {
        assert!(request.system.contains("CURRENT PHASE: FINAL PUSH"));
    }

    assert_eq!(test.send("/phase").await, "Phase reset to auto-detect: *pre\\_boe*");
    assert!(test.send("/phase summer").await.starts_with("Invalid phase. Choose: pre\\_boe"));
    assert_eq!(test.bot.phase().current_phase().await, CampaignPhase::PreBoe);
}

#[tokio::test(start_paused = true)]
async fn test_initial_phase_applies_from_startup() {
    let test = BotBuilder::new().with_initial_phase(CampaignPhase::BoeWeek).build().await;

    test.send("/blog").await;

    assert!(test.api.last_request().unwrap().system.contains("CURRENT PHASE: BOE WEEK"));
}

#[tokio::test(start_paused = true)]
async fn test_batch_reply_lists_every_item_then_summary() {
    let api = FakeApi::new(|call, request| {
        let outcome = if call == 1 {
            Err(ApiFailure::ContentPolicyViolation("refused".to_string()))
        } else {
            Ok(completion(&echo_answer(request)))
        };
        (Duration::from_millis(10), outcome)
    });
    let test = BotBuilder::new().with_api(api).build().await;

    let replies = test.bot.handle(&TestFixtures::team_command("/tiktok5")).await;

    assert_eq!(replies.len(), 6);
    assert_eq!(replies.iter().filter(|r| r.starts_with("⚠️ Error on tiktok")).count(), 1);
    assert_eq!(
        replies.last().unwrap(),
        "✅ *TIKTOK BATCH DONE* — 4/5 generated (1 failed, partial)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_acknowledgement_only_for_generating_commands() {
    let test = BotBuilder::new().build().await;

    let (notes, _) = test.handle_noting(&TestFixtures::team_command("/tiktok5")).await;
    assert_eq!(notes, vec!["📦 Generating 5 tiktok...".to_string()]);

    for text in ["/stats", "/nope", "/help"] {
        let (notes, _) = test.handle_noting(&TestFixtures::team_command(text)).await;
        assert!(notes.is_empty(), "{text} sent a progress note");
    }
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_generations_get_one_progress_note() {
    let test = BotBuilder::new()
        .with_api(FakeApi::echo_with_delay(Duration::from_secs(5)))
        .build()
        .await;
    let first = TestFixtures::team_command("/tiktok");
    let second = TestFixtures::team_command("/caption");

    let ((first_notes, first_replies), (second_notes, second_replies)) =
        tokio::join!(test.handle_noting(&first), test.handle_noting(&second));

    assert_eq!(first_notes, vec!["⏳ Generating tiktok...".to_string()]);
    assert!(first_replies.join("\n").contains("TIKTOK"));
    assert!(second_notes.is_empty());
    assert_eq!(second_replies, vec![BUSY_REPLY.to_string()]);
    assert_eq!(test.api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_generation_is_refused_while_busy() {
    let test = BotBuilder::new()
        .with_api(FakeApi::echo_with_delay(Duration::from_secs(10)))
        .build()
        .await;
    let bot = test.bot.clone();
    let running = tokio::spawn(async move { bot.handle(&TestFixtures::team_command("/blog")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Act
    let (notes, refused) = test.handle_noting(&TestFixtures::team_command("/tiktok")).await;
    let stats = test.send("/stats").await;

    // Assert
    assert_eq!(refused, vec![BUSY_REPLY.to_string()]);
    assert!(notes.is_empty());
    assert!(stats.starts_with("📊 *GENERATION STATS*"));

    let finished = running.await.unwrap().join("\n");
    assert!(finished.contains("BLOG ARTICLE READY"));
    assert_eq!(test.api.calls(), 1);

    // gate is free again
    test.send("/tiktok").await;
    assert_eq!(test.api.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_weekly_cooldown_requires_confirmation() {
    let clock = Arc::new(FixedClock::new(TestFixtures::pre_boe_morning()));
    let test = BotBuilder::new().with_clock(clock.clone()).build().await;

    let first = test.send("/weekly").await;
    assert!(first.contains("✅ *WEEKLY PACK COMPLETE* — 46/46 pieces generated"));
    assert_eq!(test.api.calls(), 46);

    clock.advance(chrono::Duration::hours(2));
    let refused = test.send("/weekly").await;
    assert_eq!(
        refused,
        "⚠️ Last weekly was 2.0 hours ago. Send /weekly confirm to generate it again."
    );
    assert_eq!(test.api.calls(), 46);

    test.send("/weekly confirm").await;
    assert_eq!(test.api.calls(), 92);

    clock.advance(chrono::Duration::hours(25));
    test.send("/weekly").await;
    assert_eq!(test.api.calls(), 138);
}

#[tokio::test(start_paused = true)]
async fn test_stats_count_successes_and_failures() {
    let api = FakeApi::new(|_, request| {
        let outcome = match requested_type(request) {
            Some(ContentType::Caption) => Err(ApiFailure::InvalidRequest("bad".to_string())),
            _ => Ok(completion(&echo_answer(request))),
        };
        (Duration::ZERO, outcome)
    });
    let test = BotBuilder::new().with_api(api).build().await;

    test.send("/tiktok5").await;
    test.send("/caption").await;
    let stats = test.send("/stats").await;

    assert!(stats.contains("*Today:* 5"), "{stats}");
    assert!(stats.contains("*This week:* 5"));
    assert!(stats.contains("*Total:* 5"));
    assert!(stats.contains("*Failures:* 1"));
    assert!(stats.contains("tiktok: 5"));
    assert!(stats.contains("*Last /weekly:* Never"));
    assert!(stats.contains("*Phase:* pre\\_boe"));
    assert!(stats.contains("*Days to deadline:* 120"));
}

#[tokio::test(start_paused = true)]
async fn test_publish_generated_article() {
    // Arrange
    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish()
        .withf(|repo, path, content, message| {
            repo == "anacuero-bit/tus-papeles-2026"
                && path == "blog/requisitos-regularizacion.html"
                && content.contains("<p>requisitos</p>")
                && content.contains("Publicado el 02 de marzo de 2026")
                && message == "Publish blog: requisitos"
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    let test = BotBuilder::new().with_publisher(publisher).build().await;

    // Act
    let generated = test.send("/blog requisitos").await;
    let id = article_id(&generated);
    let reply = test.send(&format!("/publish tp {id}")).await;

    // Assert
    assert_eq!(id.len(), 8);
    assert_eq!(reply, "✅ Published to tuspapeles2026: blog/requisitos-regularizacion.html");
}

#[tokio::test(start_paused = true)]
async fn test_publish_errors_are_reported() {
    let mut publisher = MockPublisher::new();
    publisher.expect_publish().times(1).returning(|_, _, _, _| {
        Err(BotError::Publish {
            message: "GitHub publish failed: HTTP 409".to_string(),
        })
    });
    let test = BotBuilder::new().with_publisher(publisher).build().await;

    let unknown = test.send("/publish ph zz99zz99").await;
    assert!(unknown.starts_with("❌ Unknown article id"), "{unknown}");

    let bad_site = test.send("/publish xx zz99zz99").await;
    assert!(bad_site.starts_with("❌ "), "{bad_site}");

    let id = article_id(&test.send("/blog").await);
    let failed = test.send(&format!("/publish ph {id}")).await;
    assert!(failed.starts_with("❌ Publish to PH-Site failed:"), "{failed}");
    assert!(failed.contains("HTTP 409"));
}

#[tokio::test(start_paused = true)]
async fn test_news_lists_headlines_and_analysis() {
    let mut news = MockNewsSource::new();
    news.expect_latest().times(1).returning(|| {
        Ok(vec![NewsArticle {
            title: "El Gobierno aprueba la regularización".to_string(),
            link: "https://example.org/a".to_string(),
            source: "El País".to_string(),
            published: "Mon, 02 Mar 2026 08:00:00 GMT".to_string(),
            summary: String::new(),
        }])
    });
    let test = BotBuilder::new().with_news(news).build().await;

    let replies = test.bot.handle(&TestFixtures::team_command("/news")).await;

    assert_eq!(replies.len(), 2);
    assert!(replies[0].starts_with("📰 *LATEST NEWS*"));
    assert!(replies[0].contains("El Gobierno aprueba la regularización"));
    assert!(replies[1].starts_with("🧠 *CONTENT IDEAS FROM NEWS*"));
    let request = test.api.last_request().unwrap();
    assert!(request.user.starts_with("Generate a news_analysis about:"));
    assert!(request.user.contains("- El Gobierno aprueba la regularización (El País)"));
}

#[tokio::test(start_paused = true)]
async fn test_news_feed_failure() {
    let mut news = MockNewsSource::new();
    news.expect_latest().returning(|| {
        Err(OrchestratorError::NewsError {
            message: "feed unreachable".to_string(),
        })
    });
    let test = BotBuilder::new().with_news(news).build().await;

    let reply = test.send("/news").await;

    assert!(reply.starts_with("❌ Error fetching news"));
    assert_eq!(test.api.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_topic_suggestions() {
    let test = BotBuilder::new().build().await;

    let reply = test.send("/topics").await;

    assert!(reply.starts_with("💡 *2 TOPIC SUGGESTIONS* (Phase: pre\\_boe)"));
    assert!(reply.contains("Plazos clave"));
    // suggestions are not content and are not counted
    assert_eq!(test.bot.usage().stats_since(TestFixtures::pre_boe_morning().date()).await.successes, 0);
}
