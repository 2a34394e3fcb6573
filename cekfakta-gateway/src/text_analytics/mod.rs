//! Sentiment analysis and language detection.
//!
//! [`TextAnalytics`] is the seam between the analyzer and Azure Text
//! Analytics. [`CachedTextAnalytics`] memoises both operations per input text.

mod azure;
mod cache;

pub use azure::AzureTextAnalyticsClient;
pub use cache::{CachedTextAnalytics, DEFAULT_CACHE_CAPACITY};

use crate::provider::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sentiment and language lookups for a single document.
#[async_trait]
pub trait TextAnalytics: Send + Sync {
    /// Document-level sentiment of `text`.
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ProviderError>;

    /// Primary language of `text`.
    async fn detect_language(&self, text: &str) -> Result<LanguageResult, ProviderError>;
}

/// Document sentiment label.
///
/// `Mixed` is only produced by Azure when sentences disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

/// Per-channel confidence scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentScores {
    /// Scores rounded to two decimals, as returned to clients.
    pub fn rounded(&self) -> Self {
        Self {
            positive: round2(self.positive),
            neutral: round2(self.neutral),
            negative: round2(self.negative),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sentiment of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
}

/// Detected primary language of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResult {
    /// Lowercase ISO 639-1 code, e.g. `id`
    pub iso_code: String,
    /// Detector's display name, e.g. `Indonesian`
    pub display_name: String,
    pub confidence: f64,
}
