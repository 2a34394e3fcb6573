//! CekFakta Common - Shared configuration, errors, and logging for CekFakta services.
//!
//! This crate provides:
//! - Configuration types and loading (`config.json` + `secrets.json` + env)
//! - Configuration validation
//! - The service-wide error type
//! - Logging setup with noise filtering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    AzureOpenAIConfig, Config, HttpConfig, ObservabilityConfig, ServerConfig,
    TextAnalyticsConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

