//! Configuration validation for CekFakta services.
//!
//! Checks that every credential the gateway needs is present and that
//! endpoints, ports and logging options are usable before the server starts.

use thiserror::Error;
use url::Url;

use crate::config::{
    AzureOpenAIConfig, Config, HttpConfig, ObservabilityConfig, ServerConfig,
    TextAnalyticsConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port} for {field}")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

/// Fold a list of errors into a single result.
fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn require(value: &Option<String>, field: &str, errors: &mut Vec<ValidationError>) {
    if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
        errors.push(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
}

fn check_endpoint(value: &Option<String>, field: &str, errors: &mut Vec<ValidationError>) {
    let Some(raw) = value.as_deref().filter(|v| !v.trim().is_empty()) else {
        errors.push(ValidationError::MissingField {
            field: field.to_string(),
        });
        return;
    };

    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        }),
    }
}

impl Config {
    /// Validate the entire configuration, reporting every failing field.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let sections: [&dyn Validate; 5] = [
            &self.server,
            &self.azure_openai,
            &self.text_analytics,
            &self.http,
            &self.observability,
        ];

        for section in sections {
            match section.validate() {
                Ok(()) => {}
                Err(ValidationError::Multiple(inner)) => errors.extend(inner),
                Err(e) => errors.push(e),
            }
        }

        collect(errors)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }

        if self.host.parse::<std::net::IpAddr>().is_err() {
            errors.push(ValidationError::InvalidValue {
                field: "server.host".into(),
                reason: format!("'{}' is not an IP address", self.host),
            });
        }

        collect(errors)
    }
}

impl Validate for AzureOpenAIConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        check_endpoint(&self.endpoint, "azure_openai.endpoint", &mut errors);
        require(&self.api_key, "azure_openai.api_key", &mut errors);
        require(&self.deployment, "azure_openai.deployment", &mut errors);

        if self.api_version.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "azure_openai.api_version".into(),
            });
        }

        collect(errors)
    }
}

impl Validate for TextAnalyticsConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        check_endpoint(&self.endpoint, "text_analytics.endpoint", &mut errors);
        require(&self.api_key, "text_analytics.api_key", &mut errors);

        if self.api_version.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "text_analytics.api_version".into(),
            });
        }

        collect(errors)
    }
}

impl Validate for HttpConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "http.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_body_bytes == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "http.max_body_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!(
                    "'{}' is not valid. Expected one of: {}",
                    self.log_level,
                    valid_levels.join(", ")
                ),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            errors.push(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!(
                    "'{}' is not valid. Expected one of: {}",
                    self.log_format,
                    valid_formats.join(", ")
                ),
            });
        }

        collect(errors)
    }
}
