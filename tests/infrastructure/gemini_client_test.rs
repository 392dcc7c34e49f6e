use std::sync::{Arc, Mutex};

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use bomatic::application::ports::{CompletionStatus, LlmClient, LlmClientError};
use bomatic::infrastructure::llm::GeminiClient;

use crate::helpers::start_mock_server;

#[derive(Default, Clone)]
struct Captured {
    call: String,
    api_key: Option<String>,
    body: Option<Value>,
}

async fn start_mock_gemini(
    status: StatusCode,
    response: Value,
) -> (String, Arc<Mutex<Captured>>, tokio::sync::oneshot::Sender<()>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let capture = captured.clone();

    let app = Router::new().route(
        "/v1beta/models/{call}",
        post(
            move |Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                let capture = capture.clone();
                let response = response.clone();
                async move {
                    *capture.lock().unwrap() = Captured {
                        call,
                        api_key: headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from),
                        body: Some(body),
                    };
                    (status, Json(response)).into_response()
                }
            },
        ),
    );

    let (base_url, shutdown_tx) = start_mock_server(app).await;
    (format!("{base_url}/v1beta"), captured, shutdown_tx)
}

fn candidate(parts: Value, finish_reason: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": finish_reason
        }]
    })
}

fn client(base_url: String) -> GeminiClient {
    GeminiClient::new("gemini-key".to_string(), Some(base_url), 2048, 0.1)
}

#[tokio::test]
async fn given_stop_finish_reason_when_completing_then_joins_parts() {
    let (base_url, captured, shutdown_tx) = start_mock_gemini(
        StatusCode::OK,
        candidate(json!([{ "text": "## Part one" }, { "text": " and two" }]), "STOP"),
    )
    .await;

    let completion = client(base_url)
        .complete("gemini-2.5-pro", "be precise", "transcript")
        .await
        .unwrap();

    assert_eq!(completion.status, CompletionStatus::Completed);
    assert_eq!(completion.text.as_deref(), Some("## Part one and two"));

    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.call, "gemini-2.5-pro:generateContent");
    assert_eq!(captured.api_key.as_deref(), Some("gemini-key"));
    let body = captured.body.unwrap();
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be precise");
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
    assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_max_tokens_finish_reason_when_completing_then_truncated() {
    let (base_url, _captured, shutdown_tx) = start_mock_gemini(
        StatusCode::OK,
        candidate(json!([{ "text": "partial" }]), "MAX_TOKENS"),
    )
    .await;

    let completion = client(base_url)
        .complete("gemini-2.5-flash", "system", "transcript")
        .await
        .unwrap();

    assert_eq!(completion.status, CompletionStatus::Truncated);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_safety_finish_reason_when_completing_then_safety_blocked() {
    let (base_url, _captured, shutdown_tx) =
        start_mock_gemini(StatusCode::OK, candidate(json!([]), "SAFETY")).await;

    let completion = client(base_url)
        .complete("gemini-2.5-pro", "system", "transcript")
        .await
        .unwrap();

    assert_eq!(completion.status, CompletionStatus::SafetyBlocked);
    assert!(completion.text.is_none());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_blocked_prompt_when_completing_then_safety_blocked_without_text() {
    let (base_url, _captured, shutdown_tx) = start_mock_gemini(
        StatusCode::OK,
        json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
    )
    .await;

    let completion = client(base_url)
        .complete("gemini-2.5-pro", "system", "transcript")
        .await
        .unwrap();

    assert_eq!(completion.status, CompletionStatus::SafetyBlocked);
    assert!(completion.text.is_none());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_no_candidates_when_completing_then_invalid_response() {
    let (base_url, _captured, shutdown_tx) =
        start_mock_gemini(StatusCode::OK, json!({ "candidates": [] })).await;

    let result = client(base_url)
        .complete("gemini-2.5-pro", "system", "transcript")
        .await;

    assert!(matches!(result, Err(LlmClientError::InvalidResponse(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_resource_exhausted_when_completing_then_rate_limited() {
    let (base_url, _captured, shutdown_tx) = start_mock_gemini(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "status": "RESOURCE_EXHAUSTED" } }),
    )
    .await;

    let result = client(base_url)
        .complete("gemini-2.5-pro", "system", "transcript")
        .await;

    match result {
        Err(LlmClientError::RateLimited(message)) => {
            assert!(message.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    shutdown_tx.send(()).ok();
}
