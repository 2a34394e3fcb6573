//! Text analysis: validation, lookups, classification, and reconciliation.
//!
//! ```text
//! Validating → Fetching(sentiment, language) → Classifying → Reconciling
//!                                                   ↓
//!                             Success | PartialSuccess | Failure
//! ```
//!
//! [`Analyzer::analyze`] never returns an error and never unwinds: every
//! failure is folded into an [`AnalysisResult`] whose [`Outcome`] tells the
//! HTTP layer how to answer.

use crate::classifier::{
    Category, CategoryClassifier, ClassificationOutcome, ClassificationResult, Confidence,
};
use crate::language;
use crate::provider::ProviderError;
use crate::text_analytics::{SentimentLabel, SentimentResult, SentimentScores, TextAnalytics};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

/// Longest accepted input, in characters.
pub const MAX_TEXT_CHARS: usize = 1000;

const EMPTY_RESPONSE_EXPLANATION: &str = "Model did not return any response for this input.";
const FAILURE_EXPLANATION: &str = "Unable to analyze text";

// ============================================================================
// Error taxonomy
// ============================================================================

/// External dependency a transport failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalService {
    Sentiment,
    LanguageDetection,
    Completion,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sentiment => "sentiment analysis",
            Self::LanguageDetection => "language detection",
            Self::Completion => "completion",
        })
    }
}

/// Why input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Empty,
    TooLong,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Text must not be empty"),
            Self::TooLong => write!(f, "Text is too long (max {} characters)", MAX_TEXT_CHARS),
        }
    }
}

/// Every way an analysis can fall short of a full result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Input rejected before any external call.
    #[error("{reason}")]
    Validation {
        reason: ValidationReason,
        /// Input length in characters
        length: usize,
    },

    /// An external call failed.
    #[error("An error occurred: {message}")]
    Transport {
        service: ExternalService,
        message: String,
        status_code: Option<u16>,
    },

    /// The completion service returned no content.
    #[error("Model did not respond or returned empty result.")]
    EmptyResponse,

    /// The completion content was not a JSON object.
    #[error("Model did not respond in valid JSON format.")]
    InvalidJson,

    /// Anything else, including panics during orchestration.
    #[error("An error occurred: {0}")]
    Unexpected(String),
}

impl AnalysisError {
    fn transport(service: ExternalService, err: ProviderError) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
            status_code: err.status_code,
        }
    }

    /// Terminal state this error leads to.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::EmptyResponse | Self::InvalidJson => Outcome::PartialSuccess,
            _ => Outcome::Failure,
        }
    }
}

/// Terminal state of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Classification could not be parsed but an explanation is returned.
    PartialSuccess,
    Failure,
}

// ============================================================================
// Result
// ============================================================================

/// Response payload. Wire keys follow the public API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "kategori", skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,

    #[serde(rename = "penjelasan", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(rename = "indikator_bahaya", skip_serializing_if = "Option::is_none")]
    pub risk_indicators: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentLabel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<SentimentScores>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub failure: Option<AnalysisError>,
}

/// Sentiment and language attached to every post-fetch result.
struct Enrichment {
    sentiment: SentimentResult,
    language: String,
}

impl AnalysisResult {
    fn empty() -> Self {
        Self {
            category: None,
            confidence: None,
            explanation: None,
            risk_indicators: None,
            sentiment: None,
            sentiment_score: None,
            detected_language: None,
            error: None,
            failure: None,
        }
    }

    fn rejected(err: AnalysisError) -> Self {
        Self {
            error: Some(err.to_string()),
            failure: Some(err),
            ..Self::empty()
        }
    }

    fn classified(result: ClassificationResult, enrichment: &Enrichment) -> Self {
        Self {
            category: Some(result.category),
            confidence: Some(result.confidence),
            explanation: Some(result.explanation),
            risk_indicators: Some(result.risk_indicators),
            ..Self::empty()
        }
        .enriched(enrichment)
    }

    /// Unparseable classification with a fallback explanation.
    fn partial(err: AnalysisError, explanation: String, enrichment: &Enrichment) -> Self {
        Self {
            category: Some(Category::Unknown),
            confidence: Some(Confidence::Low),
            explanation: Some(explanation),
            risk_indicators: Some(Vec::new()),
            error: Some(err.to_string()),
            failure: Some(err),
            ..Self::empty()
        }
        .enriched(enrichment)
    }

    fn failed(err: AnalysisError, enrichment: Option<&Enrichment>) -> Self {
        let result = Self {
            category: Some(Category::Error),
            explanation: Some(FAILURE_EXPLANATION.to_string()),
            risk_indicators: Some(Vec::new()),
            error: Some(err.to_string()),
            failure: Some(err),
            ..Self::empty()
        };

        match enrichment {
            Some(enrichment) => result.enriched(enrichment),
            None => result,
        }
    }

    fn enriched(mut self, enrichment: &Enrichment) -> Self {
        self.sentiment = Some(enrichment.sentiment.label);
        self.sentiment_score = Some(enrichment.sentiment.scores.rounded());
        self.detected_language = Some(enrichment.language.clone());
        self
    }

    /// Terminal state of the analysis that produced this result.
    pub fn outcome(&self) -> Outcome {
        self.failure
            .as_ref()
            .map_or(Outcome::Success, AnalysisError::outcome)
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Reject blank or oversized input.
pub fn validate_text(text: &str) -> Result<(), AnalysisError> {
    let length = text.chars().count();

    if text.trim().is_empty() {
        return Err(AnalysisError::Validation {
            reason: ValidationReason::Empty,
            length,
        });
    }

    if length > MAX_TEXT_CHARS {
        return Err(AnalysisError::Validation {
            reason: ValidationReason::TooLong,
            length,
        });
    }

    Ok(())
}

/// Orchestrates the lookups and the classifier for one request at a time.
///
/// Shareable across requests; the only shared state lives in the
/// `TextAnalytics` cache.
pub struct Analyzer {
    analytics: Arc<dyn TextAnalytics>,
    classifier: CategoryClassifier,
}

impl Analyzer {
    pub fn new(analytics: Arc<dyn TextAnalytics>, classifier: CategoryClassifier) -> Self {
        Self {
            analytics,
            classifier,
        }
    }

    /// Analyze `text`. Never fails; see [`AnalysisResult::outcome`].
    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        if let Err(err) = validate_text(text) {
            tracing::warn!(error = %err, "Rejected input");
            return AnalysisResult::rejected(err);
        }

        match AssertUnwindSafe(self.run(text)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(error = %message, "Analysis panicked");
                AnalysisResult::failed(AnalysisError::Unexpected(message), None)
            }
        }
    }

    async fn run(&self, text: &str) -> AnalysisResult {
        let sentiment = async {
            self.analytics
                .analyze_sentiment(text)
                .await
                .map_err(|e| AnalysisError::transport(ExternalService::Sentiment, e))
        };
        let detected = async {
            self.analytics
                .detect_language(text)
                .await
                .map_err(|e| AnalysisError::transport(ExternalService::LanguageDetection, e))
        };

        let (sentiment, detected) = match tokio::try_join!(sentiment, detected) {
            Ok(pair) => pair,
            Err(err) => {
                tracing::error!(error = %err, "Text analytics lookup failed");
                return AnalysisResult::failed(err, None);
            }
        };

        let resolved = language::resolve(&detected, text);
        if resolved.corrected {
            tracing::debug!(
                detected = %detected.iso_code,
                "Overriding detected language to Indonesian"
            );
        }

        let enrichment = Enrichment {
            sentiment,
            language: resolved.name,
        };

        let outcome = match self.classifier.classify(text, &enrichment.language).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = AnalysisError::transport(ExternalService::Completion, e);
                tracing::error!(error = %err, "Classification failed");
                return AnalysisResult::failed(err, Some(&enrichment));
            }
        };

        let result = match outcome {
            ClassificationOutcome::Parsed(classification) => {
                AnalysisResult::classified(classification, &enrichment)
            }
            ClassificationOutcome::EmptyResponse => AnalysisResult::partial(
                AnalysisError::EmptyResponse,
                EMPTY_RESPONSE_EXPLANATION.to_string(),
                &enrichment,
            ),
            ClassificationOutcome::InvalidJson { raw } => {
                AnalysisResult::partial(AnalysisError::InvalidJson, raw, &enrichment)
            }
        };

        tracing::info!(
            chars = text.chars().count(),
            language = %enrichment.language,
            category = ?result.category,
            outcome = ?result.outcome(),
            "Analysis complete"
        );

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "analysis panicked".to_string()
    }
}
