//! Integration tests for `PlanGenerator` against a scripted provider.
//!
//! Covers first-try success, retry on malformed output, the attempt bound,
//! and the credential check that happens before any provider call.

use std::sync::Arc;

use kiln_core::plan::prompt::SYSTEM_PROMPT;
use kiln_core::plan::{
    ExecutionPlan, GenerateError, GeneratorSettings, PlanGenerator, PlanParseError, Priority,
};
use kiln_core::provider::{ProviderError, Role};
use kiln_test_utils::{Reply, ScriptedProvider, chess_plan_json, chess_plan_normalized};

fn generator(provider: &Arc<ScriptedProvider>) -> PlanGenerator {
    PlanGenerator::new(provider.clone(), GeneratorSettings::default())
}

fn expected_plan() -> ExecutionPlan {
    serde_json::from_value(chess_plan_normalized()).expect("fixture should deserialize")
}

// ===========================================================================
// Success paths
// ===========================================================================

#[tokio::test]
async fn valid_first_response_calls_provider_once() {
    let provider = Arc::new(ScriptedProvider::always(chess_plan_json()));

    let plan = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect("generation should succeed");

    assert_eq!(plan, expected_plan());
    assert_eq!(plan.priority_level, Priority::Medium);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn request_carries_prompt_and_sampling_settings() {
    let provider = Arc::new(ScriptedProvider::always(chess_plan_json()));
    let settings = GeneratorSettings {
        model: "test/model".to_string(),
        temperature: 0.3,
        max_tokens: 2048,
        max_attempts: 3,
    };

    PlanGenerator::new(provider.clone(), settings)
        .generate("Learn to play chess")
        .await
        .expect("generation should succeed");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "test/model");
    assert_eq!(request.temperature, 0.3);
    assert_eq!(request.max_tokens, 2048);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
    assert_eq!(request.messages[1].role, Role::User);
    assert!(request.messages[1].content.contains("Goal: Learn to play chess"));
}

#[tokio::test]
async fn fenced_response_is_accepted() {
    let fenced = format!("```json\n{}\n```", chess_plan_json());
    let provider = Arc::new(ScriptedProvider::always(fenced));

    let plan = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect("fenced JSON should parse");

    assert_eq!(plan, expected_plan());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn succeeds_on_third_attempt_after_two_invalid() {
    let provider = Arc::new(ScriptedProvider::with_texts([
        "not json at all".to_string(),
        "{\"goal_summary\": \"truncated".to_string(),
        chess_plan_json(),
    ]));

    let plan = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect("third attempt should succeed");

    assert_eq!(plan, expected_plan());
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn provider_error_consumes_a_retry_slot() {
    let provider = Arc::new(ScriptedProvider::new([
        Reply::ApiError(503),
        Reply::Text(chess_plan_json()),
    ]));

    let plan = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect("second attempt should succeed");

    assert_eq!(plan, expected_plan());
    assert_eq!(provider.calls(), 2);
}

// ===========================================================================
// Failure paths
// ===========================================================================

#[tokio::test]
async fn invalid_json_on_every_attempt_stops_after_three() {
    let provider = Arc::new(ScriptedProvider::always("I'm sorry, I can't help with that."));

    let err = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect_err("generation should fail");

    assert_eq!(provider.calls(), 3);
    assert_eq!(err.attempts(), 3);
    assert!(matches!(
        err,
        GenerateError::InvalidOutput {
            source: PlanParseError::InvalidJson(_),
            ..
        }
    ));
}

#[tokio::test]
async fn empty_output_is_an_invalid_attempt() {
    let provider = Arc::new(ScriptedProvider::always("   \n  "));

    let err = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect_err("empty output should never succeed");

    assert_eq!(provider.calls(), 3);
    assert!(matches!(
        err,
        GenerateError::InvalidOutput {
            source: PlanParseError::Empty,
            ..
        }
    ));
}

#[tokio::test]
async fn unknown_priority_fails_schema_validation() {
    let bad = chess_plan_json().replace("\"medium\"", "\"urgent\"");
    let provider = Arc::new(ScriptedProvider::always(bad));

    let err = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect_err("unknown priority should not be coerced");

    assert!(matches!(
        err,
        GenerateError::InvalidOutput {
            source: PlanParseError::Schema(_),
            ..
        }
    ));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn last_error_is_surfaced() {
    let provider = Arc::new(ScriptedProvider::new([
        Reply::Text("garbage".to_string()),
        Reply::Text("more garbage".to_string()),
        Reply::ApiError(500),
    ]));

    let err = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect_err("all attempts fail");

    assert_eq!(provider.calls(), 3);
    assert!(matches!(
        err,
        GenerateError::Provider {
            attempts: 3,
            source: ProviderError::Api { status: 500, .. },
        }
    ));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn missing_credentials_makes_no_calls() {
    let provider = Arc::new(ScriptedProvider::always(chess_plan_json()).without_credentials());

    let err = generator(&provider)
        .generate("Learn to play chess")
        .await
        .expect_err("no credentials should fail");

    assert!(matches!(err, GenerateError::MissingCredentials));
    assert!(err.is_client_error());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn attempt_bound_is_configurable() {
    let provider = Arc::new(ScriptedProvider::always("nope"));
    let settings = GeneratorSettings {
        max_attempts: 5,
        ..GeneratorSettings::default()
    };

    let err = PlanGenerator::new(provider.clone(), settings)
        .generate("Learn to play chess")
        .await
        .expect_err("should fail");

    assert_eq!(err.attempts(), 5);
    assert_eq!(provider.calls(), 5);
}

#[tokio::test]
async fn zero_attempt_bound_still_calls_once() {
    let provider = Arc::new(ScriptedProvider::always(chess_plan_json()));
    let settings = GeneratorSettings {
        max_attempts: 0,
        ..GeneratorSettings::default()
    };

    let generator = PlanGenerator::new(provider.clone(), settings);
    assert_eq!(generator.settings().max_attempts, 1);
    generator
        .generate("Learn to play chess")
        .await
        .expect("single attempt should succeed");
    assert_eq!(provider.calls(), 1);
}
