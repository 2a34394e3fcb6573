//! Azure Text Analytics REST client (v3.x).

use super::{LanguageResult, SentimentLabel, SentimentResult, SentimentScores, TextAnalytics};
use crate::provider::ProviderError;
use async_trait::async_trait;
use cekfakta_common::config::TextAnalyticsConfig;
use cekfakta_common::Error;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER_NAME: &str = "text-analytics";

/// Client for the `sentiment` and `languages` endpoints.
///
/// Every call sends a single-document batch.
pub struct AzureTextAnalyticsClient {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl AzureTextAnalyticsClient {
    /// Create a client for API version `v3.1` with a 30s timeout.
    pub fn new(endpoint: impl Into<String>, api_key: impl AsRef<str>) -> Self {
        Self::with_options(endpoint, api_key, "v3.1", Duration::from_secs(30))
    }

    /// Create a client with an explicit API version and transport timeout.
    pub fn with_options(
        endpoint: impl Into<String>,
        api_key: impl AsRef<str>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        key.set_sensitive(true);
        headers.insert("Ocp-Apim-Subscription-Key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        }
    }

    /// Build from configuration; endpoint and key must be set.
    pub fn from_config(config: &TextAnalyticsConfig, timeout: Duration) -> cekfakta_common::Result<Self> {
        let missing = |field: &str| Error::Config(format!("text_analytics.{field} is not set"));

        let endpoint = config.endpoint.as_deref().ok_or_else(|| missing("endpoint"))?;
        let api_key = config.api_key.as_deref().ok_or_else(|| missing("api_key"))?;

        Ok(Self::with_options(
            endpoint,
            api_key,
            config.api_version.clone(),
            timeout,
        ))
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/text/analytics/{}/{}",
            self.endpoint, self.api_version, operation
        )
    }

    /// POST a one-document batch and return that document's entry.
    async fn post_single<D: DeserializeOwned>(
        &self,
        operation: &str,
        text: &str,
    ) -> Result<D, ProviderError> {
        let error = |message: String| ProviderError::new(PROVIDER_NAME, operation, message);

        let body = BatchRequest {
            documents: vec![RequestDocument { id: "1", text }],
        };

        let response = self
            .client
            .post(self.url(operation))
            .json(&body)
            .send()
            .await
            .map_err(|e| error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error(format!("API error: {}", body)).with_status(status.as_u16()));
        }

        let batch: BatchResponse<D> = response
            .json()
            .await
            .map_err(|e| error(format!("Failed to parse response: {}", e)))?;

        if let Some(doc_error) = batch.errors.into_iter().next() {
            return Err(error(format!(
                "Document error {}: {}",
                doc_error.error.code, doc_error.error.message
            )));
        }

        batch
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| error("Response contained no documents".into()))
    }
}

#[async_trait]
impl TextAnalytics for AzureTextAnalyticsClient {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ProviderError> {
        let doc: SentimentDocument = self.post_single("sentiment", text).await?;

        Ok(SentimentResult {
            label: doc.sentiment,
            scores: doc.confidence_scores,
        })
    }

    async fn detect_language(&self, text: &str) -> Result<LanguageResult, ProviderError> {
        let doc: LanguageDocument = self.post_single("languages", text).await?;

        Ok(LanguageResult {
            iso_code: doc.detected_language.iso6391_name.to_lowercase(),
            display_name: doc.detected_language.name,
            confidence: doc.detected_language.confidence_score,
        })
    }
}

// ============================================================================
// Text Analytics API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    documents: Vec<RequestDocument<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestDocument<'a> {
    id: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse<D> {
    #[serde(default = "Vec::new")]
    documents: Vec<D>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDocument {
    sentiment: SentimentLabel,
    confidence_scores: SentimentScores,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageDocument {
    detected_language: DetectedLanguage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedLanguage {
    name: String,
    iso6391_name: String,
    #[serde(default)]
    confidence_score: f64,
}
