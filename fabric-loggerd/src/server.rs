//! Accept loop for the log collector: one record per connection, appended
//! to the dated file and echoed back.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use fabric_client::frame::{read_frame, write_frame};
use fabric_client::LogSink;
use shared::FabricError;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const IO_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LogServer {
    listener: TcpListener,
    sink: LogSink,
}

impl LogServer {
    /// Bind the listening endpoint. Failure here is fatal to the process.
    pub async fn bind(listen: &str, sink: LogSink) -> Result<Self, FabricError> {
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|source| FabricError::Bind {
                addr: listen.to_string(),
                source,
            })?;
        debug!("logger listening on {listen}");
        Ok(Self { listener, sink })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, FabricError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until `cancel` fires.
    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.context("accept connection")?;
                    let sink = self.sink.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, sink).await;
                    });
                }
                _ = cancel.cancelled() => {
                    info!("log server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, sink: LogSink) {
    let line = match timeout(IO_TIMEOUT, read_frame(&mut stream)).await {
        Ok(Ok(line)) => line,
        Ok(Err(err)) => {
            warn!(%peer, "failed to read record: {err}");
            return;
        }
        Err(_) => {
            warn!(%peer, "record read timed out");
            return;
        }
    };

    if line.is_empty() {
        debug!(%peer, "dropped empty record");
        return;
    }

    info!("{line}");
    if let Err(err) = sink.append(line.clone()).await {
        warn!("failed to persist record: {err}");
    }

    // echo receipt; the peer may already be gone
    match timeout(IO_TIMEOUT, write_frame(&mut stream, &line)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(%peer, "failed to echo record: {err}"),
        Err(_) => debug!(%peer, "echo write timed out"),
    }
    let _ = stream.shutdown().await;
}
