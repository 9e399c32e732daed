use anyhow::Result;
use clap::Parser;
use wikiwerk_ingest::{logging, Config, Ingestor};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    logging::init_tracing(&config.log_level, config.log_format)?;
    config.log_config();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting wikiwerk");

    let ingestor = Ingestor::new(config);

    if !ingestor.config().dry_run {
        match ingestor.ksql_client()?.server_info().await {
            Ok(info) => tracing::info!(
                version = %info.version,
                status = ?info.server_status,
                "connected to ksqlDB"
            ),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "ksqlDB server info unavailable"),
        }
    }

    tokio::select! {
        result = ingestor.run() => {
            if let Err(e) = &result {
                tracing::error!(error = %format!("{e:#}"), "ingestion failed");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
        }
    }

    tracing::info!("wikiwerk shutdown complete");
    Ok(())
}
