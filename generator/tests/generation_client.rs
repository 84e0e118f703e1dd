//! Generation client behaviour under retryable, terminal and slow failures
//!
//! Time is paused so backoff sleeps complete instantly while the virtual
//! clock still advances.

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use fixtures::{completion, settings, ScriptedApi};
use generator::{GenerationClient, MockCompletionApi, Prompt};
use shared::{ApiFailure, BotError, ContentPayload, ContentType};
use tokio::time::Instant;

fn prompt() -> Prompt {
    Prompt {
        system: "system".to_string(),
        user: "Generate a caption about: plazos".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success() {
    // Arrange
    let api = Arc::new(ScriptedApi::new(vec![
        Err(ApiFailure::RateLimitExceeded { retry_after: None }),
        Err(ApiFailure::ServerError(503)),
        Ok(completion("{\"caption_text\": \"Ya puedes preparar tus papeles\"}")),
    ]));
    let client = GenerationClient::new(api.clone(), settings(4));
    let started = Instant::now();

    // Act
    let result = client.generate(&prompt(), Duration::from_secs(60)).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(api.calls(), 3);
    // 1s and 2s backoffs, each within ±10%
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(2700), "waited {waited:?}");
    assert!(waited <= Duration::from_millis(3300), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_terminal_failure_is_not_retried() {
    let mut api = MockCompletionApi::new();
    api.expect_complete()
        .times(1)
        .returning(|_, _| Err(ApiFailure::AuthenticationFailed));
    let client = GenerationClient::new(Arc::new(api), settings(4));

    let err = client.generate(&prompt(), Duration::from_secs(60)).await.unwrap_err();

    assert_eq!(
        err,
        BotError::Generation {
            reason: "authentication failed".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_escalate() {
    let api = Arc::new(ScriptedApi::new(vec![Err(ApiFailure::RateLimitExceeded { retry_after: None })]));
    let client = GenerationClient::new(api.clone(), settings(3));

    let err = client.generate(&prompt(), Duration::from_secs(60)).await.unwrap_err();

    assert_eq!(api.calls(), 3);
    assert!(matches!(err, BotError::Generation { ref reason } if reason.contains("rate limited")));
}

#[tokio::test(start_paused = true)]
async fn test_budget_covers_all_attempts() {
    // every attempt hangs longer than the whole budget
    let api = Arc::new(ScriptedApi::new(vec![Ok(completion("{}"))]).with_delay(Duration::from_secs(30)));
    let client = GenerationClient::new(api.clone(), settings(4));

    let err = client.generate(&prompt(), Duration::from_secs(5)).await.unwrap_err();

    assert_eq!(
        err,
        BotError::Timeout {
            budget: Duration::from_secs(5)
        }
    );
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_that_would_overrun_budget_times_out() {
    let api = Arc::new(ScriptedApi::new(vec![Err(ApiFailure::RateLimitExceeded {
        retry_after: Some(Duration::from_secs(20)),
    })]));
    let client = GenerationClient::new(api.clone(), settings(4));

    let err = client.generate(&prompt(), Duration::from_secs(10)).await.unwrap_err();

    assert!(matches!(err, BotError::Timeout { .. }));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn test_blank_completion_is_malformed_without_retry() {
    let mut api = MockCompletionApi::new();
    api.expect_complete().times(1).returning(|_, _| Ok(completion("  \n ")));
    let client = GenerationClient::new(Arc::new(api), settings(4));

    let err = client.generate(&prompt(), Duration::from_secs(60)).await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_generate_payload_parses_fenced_json() {
    let mut api = MockCompletionApi::new();
    api.expect_complete()
        .withf(|request, _| request.model == "test-model" && request.user.contains("plazos"))
        .returning(|_, _| {
            Ok(completion(
                "```json\n{\"type\": \"deadline\", \"message_text\": \"Quedan 30 días\"}\n```",
            ))
        });
    let client = GenerationClient::new(Arc::new(api), settings(4));

    let payload = client
        .generate_payload(ContentType::Whatsapp, &prompt(), Duration::from_secs(60))
        .await
        .unwrap();

    match payload {
        ContentPayload::Whatsapp(message) => {
            assert_eq!(message.kind, "deadline");
            assert_eq!(message.message_text, "Quedan 30 días");
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_payload_rejects_prose() {
    let mut api = MockCompletionApi::new();
    api.expect_complete()
        .returning(|_, _| Ok(completion("Lo siento, no puedo ayudar con eso.")));
    let client = GenerationClient::new(Arc::new(api), settings(4));

    let err = client
        .generate_payload(ContentType::Blog, &prompt(), Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(err.is_malformed());
}
