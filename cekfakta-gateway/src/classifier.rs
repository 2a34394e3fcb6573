//! Category classification through the chat-completion provider.
//!
//! The model is asked for a single JSON object:
//!
//! ```json
//! {
//!   "kategori": "Potential Scam",
//!   "confidence": "high",
//!   "penjelasan": "...",
//!   "indikator_bahaya": ["..."]
//! }
//! ```
//!
//! Replies are turned into a [`ClassificationOutcome`] right away so the
//! analyzer never looks at raw JSON.

use crate::provider::{ChatRequest, Message, Provider, ProviderError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Sampling temperature for classification.
pub const TEMPERATURE: f64 = 0.3;

/// Output token ceiling for classification.
pub const MAX_TOKENS: i64 = 500;

/// Verdict assigned to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Potential Scam")]
    PotentialScam,
    #[serde(rename = "Online Gambling Promotion")]
    OnlineGamblingPromotion,
    #[serde(rename = "Hoax")]
    Hoax,
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "Error")]
    Error,
}

impl Category {
    /// Case-insensitive match on the wire name; anything else is `Unknown`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "potential scam" => Self::PotentialScam,
            "online gambling promotion" => Self::OnlineGamblingPromotion,
            "hoax" => Self::Hoax,
            "safe" => Self::Safe,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Model confidence, always in English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive; unrecognised values are `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A successfully parsed classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: Confidence,
    pub explanation: String,
    pub risk_indicators: Vec<String>,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            category: Category::Unknown,
            confidence: Confidence::Medium,
            explanation: String::new(),
            risk_indicators: Vec::new(),
        }
    }
}

/// What the completion service gave back.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Parsed(ClassificationResult),
    /// Blank reply.
    EmptyResponse,
    /// Non-blank reply that is not a JSON object; kept verbatim.
    InvalidJson { raw: String },
}

/// System instruction asking for a JSON verdict written in `language_name`.
pub fn build_system_prompt(language_name: &str) -> String {
    format!(
        r#"You are an AI expert in detecting scam, fraud, hoaxes, and online gambling. Analyze the following text and classify it into one of the categories below:

1. "Potential Scam" - if the message offers a prize, an easy job, or asks for personal data.
2. "Online Gambling Promotion" - if the message promotes online gambling or mentions "slot gacor".
3. "Hoax" - if the message contains misleading or false information.
4. "Safe" - if the message is safe and not harmful.

Return your response in this JSON format:
{{
  "kategori": "category_result",
  "confidence": "high/medium/low",
  "penjelasan": "short explanation in the detected language",
  "indikator_bahaya": ["list of detected risk indicators"]
}}

The "confidence" value must always be in English: high, medium, or low.

Important: Your answer MUST be in language: **{language_name}**, and always in the JSON format above. Do not add any explanation outside the JSON.

Now analyze the following text:"#
    )
}

/// Parse a model reply into an outcome. Missing keys take defaults.
pub fn parse_reply(content: &str) -> ClassificationOutcome {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return ClassificationOutcome::EmptyResponse;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ClassificationOutcome::Parsed(from_object(&map)),
        _ => ClassificationOutcome::InvalidJson {
            raw: trimmed.to_string(),
        },
    }
}

fn from_object(map: &Map<String, Value>) -> ClassificationResult {
    let defaults = ClassificationResult::default();

    let category = map
        .get("kategori")
        .and_then(Value::as_str)
        .map_or(defaults.category, Category::parse_lenient);

    let confidence = map
        .get("confidence")
        .and_then(Value::as_str)
        .and_then(Confidence::parse)
        .unwrap_or(defaults.confidence);

    let explanation = map
        .get("penjelasan")
        .and_then(Value::as_str)
        .map_or(defaults.explanation, str::to_string);

    let risk_indicators = match map.get("indikator_bahaya") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => defaults.risk_indicators,
    };

    ClassificationResult {
        category,
        confidence,
        explanation,
        risk_indicators,
    }
}

/// Builds the language-aware prompt and asks the provider for a verdict.
pub struct CategoryClassifier {
    provider: Arc<dyn Provider>,
    model: String,
}

impl CategoryClassifier {
    /// `model` is the deployment/model name passed through to the provider.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Classify `text`, asking for prose in `language_name`.
    ///
    /// Transport failures are returned as `Err`; malformed replies are
    /// reported through the outcome.
    pub async fn classify(
        &self,
        text: &str,
        language_name: &str,
    ) -> Result<ClassificationOutcome, ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(text)],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
            system: Some(build_system_prompt(language_name)),
        };

        let response = self.provider.chat(request).await?;

        tracing::debug!(
            provider = %response.provider,
            latency_ms = response.latency_ms,
            total_tokens = response.usage.total_tokens,
            raw = %response.content,
            "Completion received"
        );

        Ok(parse_reply(&response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: Result<String, ProviderError>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            let model = request.model.clone();
            self.requests.lock().unwrap().push(request);
            let content = self.reply.clone()?;
            Ok(ChatResponse {
                provider: "scripted".into(),
                model,
                content,
                usage: TokenUsage::default(),
                finish_reason: Some("stop".into()),
                latency_ms: 1,
            })
        }
    }

    #[test]
    fn test_prompt_lists_categories_keys_and_language() {
        let prompt = build_system_prompt("Indonesian");

        for category in ["Potential Scam", "Online Gambling Promotion", "Hoax", "Safe"] {
            assert!(prompt.contains(category));
        }
        for key in ["kategori", "confidence", "penjelasan", "indikator_bahaya"] {
            assert!(prompt.contains(key));
        }
        assert!(prompt.contains("**Indonesian**"));
        assert!(prompt.contains("always be in English"));
    }

    #[test]
    fn test_parse_full_reply() {
        let outcome = parse_reply(
            r#"{"kategori":"Potential Scam","confidence":"high","penjelasan":"Meminta data rekening.","indikator_bahaya":["hadiah","data pribadi"]}"#,
        );

        assert_eq!(
            outcome,
            ClassificationOutcome::Parsed(ClassificationResult {
                category: Category::PotentialScam,
                confidence: Confidence::High,
                explanation: "Meminta data rekening.".into(),
                risk_indicators: vec!["hadiah".into(), "data pribadi".into()],
            })
        );
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let ClassificationOutcome::Parsed(result) = parse_reply(r#"{"kategori":"Safe"}"#) else {
            panic!("expected parsed outcome");
        };
        assert_eq!(result.category, Category::Safe);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.explanation, "");
        assert!(result.risk_indicators.is_empty());
    }

    #[test]
    fn test_lenient_labels() {
        let ClassificationOutcome::Parsed(result) =
            parse_reply(r#"{"kategori":"online gambling PROMOTION","confidence":"HIGH"}"#)
        else {
            panic!("expected parsed outcome");
        };
        assert_eq!(result.category, Category::OnlineGamblingPromotion);
        assert_eq!(result.confidence, Confidence::High);

        let ClassificationOutcome::Parsed(result) =
            parse_reply(r#"{"kategori":"Penipuan","confidence":"tinggi"}"#)
        else {
            panic!("expected parsed outcome");
        };
        assert_eq!(result.category, Category::Unknown);
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn test_blank_reply_is_empty_response() {
        assert_eq!(parse_reply(""), ClassificationOutcome::EmptyResponse);
        assert_eq!(parse_reply("  \n "), ClassificationOutcome::EmptyResponse);
    }

    #[test]
    fn test_non_json_reply_is_kept_verbatim() {
        assert_eq!(
            parse_reply("I cannot help"),
            ClassificationOutcome::InvalidJson {
                raw: "I cannot help".into()
            }
        );
    }

    #[test]
    fn test_json_that_is_not_an_object_is_invalid() {
        assert!(matches!(
            parse_reply(r#"["Safe"]"#),
            ClassificationOutcome::InvalidJson { .. }
        ));
    }

    #[tokio::test]
    async fn test_classify_sends_system_and_user_turns() {
        let provider = Arc::new(ScriptedProvider::replying(r#"{"kategori":"Hoax"}"#));
        let classifier = CategoryClassifier::new(provider.clone(), "gpt-35");

        let outcome = classifier
            .classify("Vaksin mengandung chip", "Indonesian")
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ClassificationOutcome::Parsed(ClassificationResult { category: Category::Hoax, .. })
        ));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "gpt-35");
        assert_eq!(request.temperature, Some(TEMPERATURE));
        assert_eq!(request.max_tokens, Some(MAX_TOKENS));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "Vaksin mengandung chip");
        assert!(request.system.as_deref().unwrap().contains("**Indonesian**"));
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let provider = Arc::new(ScriptedProvider {
            reply: Err(ProviderError::new("scripted", "gpt-35", "timeout")),
            requests: Mutex::new(Vec::new()),
        });
        let classifier = CategoryClassifier::new(provider, "gpt-35");

        let err = classifier.classify("hi", "English").await.unwrap_err();
        assert_eq!(err.message, "timeout");
    }
}
