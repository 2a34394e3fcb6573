//! CekFakta Gateway - Main entry point.

use anyhow::Result;
use cekfakta_common::config::Config;
use cekfakta_common::config_loader::check_config_files;
use cekfakta_common::error::ResultExt;
use cekfakta_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (files, then environment)
    let config = Config::load_with_env()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("CekFakta Gateway v{}", env!("CARGO_PKG_VERSION"));

    for (file, found) in check_config_files(None) {
        tracing::debug!(file = %file, found, "Config file");
    }

    if let Err(e) = config.validate().context("validating configuration") {
        tracing::error!(error = %e, "Refusing to start");
        return Err(e.into());
    }

    cekfakta_gateway::start_server(&config).await
}
