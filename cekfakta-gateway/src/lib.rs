//! CekFakta Gateway - scam, hoax, and gambling-promotion detection relay.
//!
//! Each request flows through:
//! ```text
//! POST /api/analyze → validate → sentiment + language (cached)
//!                   → language correction → classifier (Azure OpenAI)
//!                   → reconcile → JSON verdict
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analyzer;
pub mod classifier;
pub mod language;
pub mod provider;
pub mod routes;
pub mod text_analytics;

pub use analyzer::{AnalysisError, AnalysisResult, Analyzer, ExternalService, Outcome};
pub use classifier::{Category, CategoryClassifier, ClassificationOutcome, Confidence};
pub use provider::{AzureOpenAIProvider, ChatRequest, ChatResponse, Provider, ProviderError};
pub use routes::AppState;
pub use text_analytics::{AzureTextAnalyticsClient, CachedTextAnalytics, TextAnalytics};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use cekfakta_common::config::{Config, HttpConfig};
use cekfakta_common::error::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Wire the Azure clients, cache, and classifier from configuration.
pub fn build_analyzer(config: &Config) -> cekfakta_common::Result<Analyzer> {
    let timeout = Duration::from_secs(config.http.request_timeout_secs);

    let text_analytics = AzureTextAnalyticsClient::from_config(&config.text_analytics, timeout)
        .context("building text analytics client")?;
    let provider = AzureOpenAIProvider::from_config(&config.azure_openai, timeout)
        .context("building Azure OpenAI provider")?;

    let model = provider.deployment().to_string();
    let classifier = CategoryClassifier::new(Arc::new(provider), model);

    Ok(Analyzer::new(
        Arc::new(CachedTextAnalytics::new(text_analytics)),
        classifier,
    ))
}

/// Build the gateway router with all routes and middleware.
pub fn build_router(analyzer: Arc<Analyzer>, http: &HttpConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::analyze_routes(AppState { analyzer }))
        .merge(routes::health_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(http.max_body_bytes)),
        )
}

/// Start the gateway server and run until Ctrl-C.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.bind_address()?;

    let analyzer = Arc::new(build_analyzer(config)?);
    let router = build_router(analyzer, &config.http);

    tracing::info!("Starting CekFakta Gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CekFakta Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
