use anyhow::{Context, Result};
use fabric_client::resolve::discover_self_address;
use fabric_client::{LogShipper, LogSink, RetryPolicy};
use shared::addr::strip_port;
use shared::types::LogRecord;
use tokio_util::sync::CancellationToken;

use fabric_directoryd::config::Config;
use fabric_directoryd::registry::RegistryHandle;
use fabric_directoryd::server::DirectoryServer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fabric_directoryd=info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let config = Config::resolve(config_path.as_deref())?;
    tracing::info!("starting fabric-directoryd on {}", config.directory.listen);

    let audit = LogSink::spawn(config.audit.log_dir.clone()).context("open audit log")?;
    let registry = RegistryHandle::spawn();

    // bind failure is fatal and exits non-zero
    let server = DirectoryServer::bind(
        &config.directory.listen,
        config.directory.service_port,
        registry.clone(),
        audit.clone(),
    )
    .await
    .context("bind directory listener")?;

    let cancel = CancellationToken::new();

    // announce startup to the logger when one is configured; an
    // unreachable logger at this point is fatal
    if let Some(logger_addr) = &config.directory.logger_addr {
        let probe_policy = RetryPolicy::default().with_max_attempts(10);
        let self_addr =
            discover_self_address(&config.directory.probe_addr, &probe_policy, &cancel)
                .await
                .context("discover own address")?;
        let host = strip_port(&self_addr)
            .context("strip probe port")?
            .to_string();

        let record = LogRecord::new(
            config.directory.instance_id.clone(),
            format!(
                "directory server started at {host}:{}",
                config.directory.service_port
            ),
        );
        LogShipper::new(logger_addr.clone())
            .send_with_tee(&record, &audit)
            .await
            .with_context(|| format!("ship startup record to {logger_addr}"))?;
    }

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(server_cancel).await {
            tracing::error!("directory server error: {e}");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("listen for ctrl-c")?;
    tracing::info!("shutdown signal received");

    cancel.cancel();
    let _ = server_handle.await;

    if let Err(e) = registry.shutdown().await {
        tracing::error!("failed to shut down registry: {e}");
    }
    if let Err(e) = audit.shutdown().await {
        tracing::error!("failed to shut down audit log: {e}");
    }

    tracing::info!("shutdown complete");
    Ok(())
}
