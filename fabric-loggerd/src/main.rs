use anyhow::{Context, Result};
use fabric_client::LogSink;
use shared::types::LogRecord;
use tokio_util::sync::CancellationToken;

use fabric_loggerd::config::Config;
use fabric_loggerd::server::LogServer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fabric_loggerd=info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let config = Config::resolve(config_path.as_deref())?;
    tracing::info!(
        "starting fabric-loggerd on {} (logs in {})",
        config.logger.listen,
        config.logger.log_dir.display()
    );

    let sink = LogSink::spawn(config.logger.log_dir.clone()).context("open log directory")?;

    let server = LogServer::bind(&config.logger.listen, sink.clone())
        .await
        .context("bind log listener")?;

    let startup = LogRecord::new(
        config.logger.instance_id.clone(),
        format!("logger listening at {}", config.logger.listen),
    );
    sink.append(startup.to_string())
        .await
        .context("record startup")?;

    let cancel = CancellationToken::new();
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(server_cancel).await {
            tracing::error!("log server error: {e}");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("listen for ctrl-c")?;
    tracing::info!("shutdown signal received");

    cancel.cancel();
    let _ = server_handle.await;

    if let Err(e) = sink.shutdown().await {
        tracing::error!("failed to shut down log sink: {e}");
    }

    tracing::info!("shutdown complete");
    Ok(())
}
