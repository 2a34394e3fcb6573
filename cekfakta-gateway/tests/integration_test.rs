//! Integration tests for the CekFakta gateway.
//!
//! Drives the full router: request parsing, analysis, and status mapping.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use cekfakta_common::config::{Config, HttpConfig};
use cekfakta_gateway::{
    build_analyzer, build_router,
    provider::{ChatRequest, ChatResponse, Provider, ProviderError, TokenUsage},
    text_analytics::{LanguageResult, SentimentLabel, SentimentResult, SentimentScores},
    Analyzer, CachedTextAnalytics, CategoryClassifier, TextAnalytics,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ─────────────────────────────────────────────────────────────────────────────
// Test doubles
// ─────────────────────────────────────────────────────────────────────────────

struct StubAnalytics {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextAnalytics for StubAnalytics {
    async fn analyze_sentiment(&self, _text: &str) -> Result<SentimentResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::new("text-analytics", "sentiment", "401 Unauthorized")
                .with_status(401));
        }
        Ok(SentimentResult {
            label: SentimentLabel::Positive,
            scores: SentimentScores {
                positive: 0.911,
                neutral: 0.077,
                negative: 0.012,
            },
        })
    }

    async fn detect_language(&self, _text: &str) -> Result<LanguageResult, ProviderError> {
        Ok(LanguageResult {
            iso_code: "id".into(),
            display_name: "Indonesian".into(),
            confidence: 1.0,
        })
    }
}

struct StubProvider {
    reply: &'static str,
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        Ok(ChatResponse {
            provider: "stub".into(),
            model: request.model,
            content: self.reply.into(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".into()),
            latency_ms: 1,
        })
    }
}

fn create_test_app(reply: &'static str, fail_analytics: bool) -> (axum::Router, Arc<AtomicUsize>) {
    create_test_app_with_http(reply, fail_analytics, &HttpConfig::default())
}

fn create_test_app_with_http(
    reply: &'static str,
    fail_analytics: bool,
    http: &HttpConfig,
) -> (axum::Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let analytics = StubAnalytics {
        fail: fail_analytics,
        calls: Arc::clone(&calls),
    };
    let analyzer = Analyzer::new(
        Arc::new(analytics),
        CategoryClassifier::new(Arc::new(StubProvider { reply }), "gpt-35"),
    );

    (build_router(Arc::new(analyzer), http), calls)
}

const GAMBLING_REPLY: &str = r#"{
    "kategori": "Online Gambling Promotion",
    "confidence": "high",
    "penjelasan": "Pesan mempromosikan situs slot.",
    "indikator_bahaya": ["slot gacor", "tautan mencurigakan"]
}"#;

/// Helper to make a request and get JSON response.
async fn request_json(app: &axum::Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(b) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

async fn analyze(app: &axum::Router, body: Value) -> (StatusCode, Value) {
    request_json(app, Method::POST, "/api/analyze", Some(&body.to_string())).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Health Check Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app(GAMBLING_REPLY, false);

    for uri in ["/api/health", "/health"] {
        let (status, json) = request_json(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "CekFakta AI");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analyze Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_analyze_success() {
    let (app, _) = create_test_app(GAMBLING_REPLY, false);

    let (status, json) = analyze(&app, json!({ "text": "Daftar sekarang, slot gacor maxwin!" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let result = &json["result"];
    assert_eq!(result["kategori"], "Online Gambling Promotion");
    assert_eq!(result["confidence"], "high");
    assert_eq!(result["indikator_bahaya"], json!(["slot gacor", "tautan mencurigakan"]));
    assert_eq!(result["sentiment"], "positive");
    assert_eq!(
        result["sentiment_score"],
        json!({ "positive": 0.91, "neutral": 0.08, "negative": 0.01 })
    );
    assert_eq!(result["detected_language"], "Indonesian");
    assert!(result.get("error").is_none());
}

#[tokio::test]
async fn test_analyze_rejects_missing_or_blank_text() {
    let (app, calls) = create_test_app(GAMBLING_REPLY, false);

    for body in [json!({}), json!({ "text": "" }), json!({ "text": "   " }), json!({ "text": 42 })] {
        let (status, json) = analyze(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Teks tidak boleh kosong");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_analyze_rejects_malformed_body() {
    let (app, _) = create_test_app(GAMBLING_REPLY, false);

    let (status, json) = request_json(&app, Method::POST, "/api/analyze", Some("{ not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Teks tidak boleh kosong");
}

#[tokio::test]
async fn test_analyze_over_length_text_is_failure() {
    let (app, calls) = create_test_app(GAMBLING_REPLY, false);

    let (status, json) = analyze(&app, json!({ "text": "x".repeat(1001) })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json.get("result").is_none());
    assert_eq!(json["error"], "Text is too long (max 1000 characters)");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_analyze_length_limit_counts_characters() {
    let (app, calls) = create_test_app(GAMBLING_REPLY, false);

    let (status, json) = analyze(&app, json!({ "text": "é".repeat(1000) })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_analyze_body_over_limit_is_rejected() {
    let http = HttpConfig {
        max_body_bytes: 64,
        ..HttpConfig::default()
    };
    let (app, calls) = create_test_app_with_http(GAMBLING_REPLY, false, &http);

    let (status, json) = analyze(&app, json!({ "text": "slot gacor ".repeat(20) })).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
    assert_ne!(json["error"], "Teks tidak boleh kosong");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Bodies under the limit still go through.
    let (status, _) = analyze(&app, json!({ "text": "Halo" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_partial_success_on_invalid_json() {
    let (app, _) = create_test_app("Maaf, saya tidak bisa membantu.", false);

    let (status, json) = analyze(&app, json!({ "text": "Halo" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["result"]["penjelasan"], "Maaf, saya tidak bisa membantu.");
    assert_eq!(json["result"]["error"], "Model did not respond in valid JSON format.");
    assert_eq!(json["result"]["kategori"], "Unknown");
}

#[tokio::test]
async fn test_analyze_partial_success_on_empty_reply() {
    let (app, _) = create_test_app("", false);

    let (status, json) = analyze(&app, json!({ "text": "Halo" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"]["confidence"], "low");
    assert_eq!(json["result"]["error"], "Model did not respond or returned empty result.");
}

#[tokio::test]
async fn test_analyze_failure_on_transport_error() {
    let (app, _) = create_test_app(GAMBLING_REPLY, true);

    let (status, json) = analyze(&app, json!({ "text": "Halo" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json.get("result").is_none());
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("An error occurred:"));
    assert!(error.contains("401 Unauthorized"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (app, _) = create_test_app(GAMBLING_REPLY, false);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .header(header::ORIGIN, "https://cekfakta.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// End-to-end against mocked Azure endpoints
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_end_to_end_with_azure_wire_format() {
    let language_server = MockServer::start().await;
    let openai_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/text/analytics/v3.1/sentiment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "id": "1",
                "sentiment": "negative",
                "confidenceScores": { "positive": 0.05, "neutral": 0.25, "negative": 0.7 }
            }],
            "errors": []
        })))
        .expect(1)
        .mount(&language_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/text/analytics/v3.1/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "id": "1",
                "detectedLanguage": { "name": "English", "iso6391Name": "en", "confidenceScore": 0.6 }
            }],
            "errors": []
        })))
        .expect(1)
        .mount(&language_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-35/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-35-turbo",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"kategori\":\"Potential Scam\",\"confidence\":\"high\",\"penjelasan\":\"Meminta nomor rekening.\",\"indikator_bahaya\":[\"rekening\"]}"
                },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 200, "completion_tokens": 40, "total_tokens": 240 }
        })))
        .expect(2)
        .mount(&openai_server)
        .await;

    let mut config = Config::default();
    config.apply_overrides(|key| match key {
        "AZURE_AI_ENDPOINT" => Some(language_server.uri()),
        "AZURE_AI_API_KEY" => Some("lang-key".into()),
        "AZURE_OPENAI_ENDPOINT" => Some(openai_server.uri()),
        "AZURE_OPENAI_API_KEY" => Some("oai-key".into()),
        "AZURE_OPENAI_DEPLOYMENT_NAME" => Some("gpt-35".into()),
        _ => None,
    });
    config.validate().unwrap();

    let analyzer = build_analyzer(&config).unwrap();
    let app = build_router(Arc::new(analyzer), &config.http);

    let body = json!({ "text": "Kirim nomor rekening anda sekarang" });
    for _ in 0..2 {
        let (status, json) = analyze(&app, body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"]["kategori"], "Potential Scam");
        assert_eq!(json["result"]["detected_language"], "Indonesian");
        assert_eq!(json["result"]["sentiment"], "negative");
    }
    // MockServer verifies the `expect` counts on drop: one lookup per
    // operation, two completions.
}

#[test]
fn test_cached_analytics_is_a_text_analytics() {
    fn assert_impl<T: TextAnalytics>() {}
    assert_impl::<CachedTextAnalytics<StubAnalytics>>();
}
