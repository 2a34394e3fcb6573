//! Configuration management for CekFakta services.
//!
//! The service reads `~/.cekfakta/config.json`, deep-merged with an optional
//! `~/.cekfakta/secrets.json` (see [`crate::config_loader`]).
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values (`secrets.json` over `config.json`)
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! ## Azure OpenAI
//! - `AZURE_OPENAI_ENDPOINT` → azure_openai.endpoint
//! - `AZURE_OPENAI_API_KEY` → azure_openai.api_key
//! - `AZURE_OPENAI_DEPLOYMENT_NAME` → azure_openai.deployment
//! - `AZURE_OPENAI_API_VERSION` → azure_openai.api_version
//!
//! ## Azure Text Analytics
//! - `AZURE_AI_ENDPOINT` → text_analytics.endpoint
//! - `AZURE_AI_API_KEY` → text_analytics.api_key
//!
//! ## Server / Logging
//! - `CEKFAKTA_HOST` → server.host
//! - `CEKFAKTA_PORT` → server.port
//! - `LOG_LEVEL` → observability.log_level
//! - `CEKFAKTA_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::config_loader::load_modular_config;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".cekfakta"),
        |dirs| dirs.home_dir().join(".cekfakta"),
    )
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the CekFakta gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Azure OpenAI chat-completion deployment
    #[serde(default)]
    pub azure_openai: AzureOpenAIConfig,

    /// Azure Text Analytics (sentiment + language detection)
    #[serde(default)]
    pub text_analytics: TextAnalyticsConfig,

    /// Outbound/inbound HTTP limits
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default directory.
    ///
    /// Missing files are not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&config_dir())
    }

    /// Load `config.json` and `secrets.json` from a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let value = load_modular_config(Some(dir.to_path_buf()))?;
        serde_json::from_value(value)
            .with_context(|| format!("Failed to parse config from {}", dir.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// `apply_env_overrides` delegates here with `std::env::var`; tests pass
    /// a map instead of mutating the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            self.azure_openai.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("AZURE_OPENAI_API_KEY") {
            self.azure_openai.api_key = Some(key);
        }
        if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT_NAME") {
            self.azure_openai.deployment = Some(deployment);
        }
        if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
            self.azure_openai.api_version = version;
        }

        if let Some(endpoint) = lookup("AZURE_AI_ENDPOINT") {
            self.text_analytics.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("AZURE_AI_API_KEY") {
            self.text_analytics.api_key = Some(key);
        }

        if let Some(host) = lookup("CEKFAKTA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CEKFAKTA_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid CEKFAKTA_PORT"),
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.observability.log_level = level.to_lowercase();
        }
        if let Some(format) = lookup("CEKFAKTA_LOG_FORMAT") {
            self.observability.log_format = format.to_lowercase();
        }
    }

    /// Socket address the server binds to.
    pub fn bind_address(&self) -> std::result::Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.server.host.parse()?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port. Default: 5000
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Azure OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com/`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Resource API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model deployment name
    #[serde(default, alias = "deployment_name")]
    pub deployment: Option<String>,

    /// REST API version
    #[serde(default = "default_openai_api_version")]
    pub api_version: String,
}

impl Default for AzureOpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: None,
            api_version: default_openai_api_version(),
        }
    }
}

/// Azure Text Analytics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalyticsConfig {
    /// Cognitive Services endpoint, e.g. `https://my-lang.cognitiveservices.azure.com/`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Subscription key
    #[serde(default)]
    pub api_key: Option<String>,

    /// REST API version segment
    #[serde(default = "default_text_analytics_api_version")]
    pub api_version: String,
}

impl Default for TextAnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: default_text_analytics_api_version(),
        }
    }
}

/// HTTP limits for both the listener and the outbound clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound call to Azure
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to pin at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_openai_api_version() -> String {
    "2023-05-15".into()
}

fn default_text_analytics_api_version() -> String {
    "v3.1".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}
