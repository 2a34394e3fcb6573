//! Azure OpenAI chat-completion provider.

use super::{ChatRequest, ChatResponse, Provider, ProviderError, TokenUsage};
use async_trait::async_trait;
use cekfakta_common::config::AzureOpenAIConfig;
use cekfakta_common::Error;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER_NAME: &str = "azure-openai";

/// Azure OpenAI deployment provider.
///
/// Calls `{endpoint}/openai/deployments/{deployment}/chat/completions` with
/// the `api-key` header.
pub struct AzureOpenAIProvider {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
}

impl AzureOpenAIProvider {
    /// Create a provider with the default API version and a 30s timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl AsRef<str>,
        deployment: impl Into<String>,
    ) -> Self {
        Self::with_options(
            endpoint,
            api_key,
            deployment,
            "2023-05-15",
            Duration::from_secs(30),
        )
    }

    /// Create a provider with an explicit API version and transport timeout.
    pub fn with_options(
        endpoint: impl Into<String>,
        api_key: impl AsRef<str>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        key.set_sensitive(true);
        headers.insert("api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: api_version.into(),
        }
    }

    /// Build from configuration; every credential field must be set.
    pub fn from_config(config: &AzureOpenAIConfig, timeout: Duration) -> cekfakta_common::Result<Self> {
        let missing = |field: &str| Error::Config(format!("azure_openai.{field} is not set"));

        let endpoint = config.endpoint.as_deref().ok_or_else(|| missing("endpoint"))?;
        let api_key = config.api_key.as_deref().ok_or_else(|| missing("api_key"))?;
        let deployment = config.deployment.as_deref().ok_or_else(|| missing("deployment"))?;

        Ok(Self::with_options(
            endpoint,
            api_key,
            deployment,
            config.api_version.clone(),
            timeout,
        ))
    }

    /// Deployment the provider sends requests to.
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::new(PROVIDER_NAME, self.deployment.clone(), message)
    }
}

#[async_trait]
impl Provider for AzureOpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();

        let mut messages: Vec<AzureMessage> = request
            .messages
            .iter()
            .map(|m| AzureMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        if let Some(system) = &request.system {
            messages.insert(
                0,
                AzureMessage {
                    role: "system".into(),
                    content: system.clone(),
                },
            );
        }

        let body = AzureChatRequest {
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(format!("Request failed: {}", e)))?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self
                .error(format!("API error: {}", body))
                .with_status(status.as_u16()));
        }

        let azure_response: AzureChatResponse = response
            .json()
            .await
            .map_err(|e| self.error(format!("Failed to parse response: {}", e)))?;

        let first = azure_response.choices.into_iter().next();
        let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
        let content = first
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(ChatResponse {
            provider: PROVIDER_NAME.into(),
            model: azure_response.model.unwrap_or_else(|| self.deployment.clone()),
            content,
            usage: TokenUsage {
                input_tokens: azure_response.usage.prompt_tokens,
                output_tokens: azure_response.usage.completion_tokens,
                total_tokens: azure_response.usage.total_tokens,
            },
            finish_reason,
            latency_ms,
        })
    }
}

// ============================================================================
// Azure OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AzureChatRequest {
    messages: Vec<AzureMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AzureMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AzureChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: AzureUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    // Absent when the content filter blocks the completion
    #[serde(default)]
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AzureUsage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}
