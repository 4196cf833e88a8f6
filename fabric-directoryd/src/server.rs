//! Accept loop and request dispatch for the directory protocol.
//!
//! One request/response exchange per connection: read → dispatch → reply →
//! close. Connections are handled on their own tasks; the shared map lives
//! behind the registry actor.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use fabric_client::frame::{read_frame, write_frame};
use fabric_client::LogSink;
use shared::addr::strip_port;
use shared::protocol::{parse_request, Request, REPLY_BAD_REQUEST};
use shared::FabricError;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::RegistryHandle;

const IO_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DirectoryServer {
    listener: TcpListener,
    registry: RegistryHandle,
    audit: LogSink,
    service_port: u16,
}

impl DirectoryServer {
    /// Bind the listening endpoint. Failure here is fatal to the process.
    pub async fn bind(
        listen: &str,
        service_port: u16,
        registry: RegistryHandle,
        audit: LogSink,
    ) -> Result<Self, FabricError> {
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|source| FabricError::Bind {
                addr: listen.to_string(),
                source,
            })?;
        debug!("directory listening on {listen}");
        Ok(Self {
            listener,
            registry,
            audit,
            service_port,
        })
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
                    let registry = self.registry.clone();
                    let audit = self.audit.clone();
                    let service_port = self.service_port;
                    tokio::spawn(async move {
                        handle_connection(stream, peer, registry, audit, service_port).await;
                    });
                }
                _ = cancel.cancelled() => {
                    info!("directory server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    registry: RegistryHandle,
    audit: LogSink,
    service_port: u16,
) {
    // an unreadable, timed-out, or oversized frame dispatches as an empty
    // request and earns a 400
    let text = match timeout(IO_TIMEOUT, read_frame(&mut stream)).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!(%peer, "failed to read request: {err}");
            String::new()
        }
        Err(_) => {
            warn!(%peer, "request read timed out");
            String::new()
        }
    };

    let reply = dispatch(&text, peer, &registry, &audit, service_port).await;

    match timeout(IO_TIMEOUT, write_frame(&mut stream, &reply)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(%peer, "failed to write reply: {err}"),
        Err(_) => warn!(%peer, "reply write timed out"),
    }
    let _ = stream.shutdown().await;
}

async fn dispatch(
    text: &str,
    peer: SocketAddr,
    registry: &RegistryHandle,
    audit: &LogSink,
    service_port: u16,
) -> String {
    match parse_request(text) {
        Request::Record { service } => {
            // the address is derived from the observed peer, never from
            // client input
            let peer_string = peer.to_string();
            let host = match strip_port(&peer_string) {
                Ok(host) => host,
                Err(err) => {
                    warn!(%peer, "unusable peer address: {err}");
                    return REPLY_BAD_REQUEST.to_string();
                }
            };
            let address = format!("{host}:{service_port}");

            if let Err(err) = registry.record(service.clone(), address.clone()).await {
                tracing::error!("registry unavailable: {err}");
                return REPLY_BAD_REQUEST.to_string();
            }

            info!(%service, %address, "registered");
            audit_line(audit, format!("{service} started at {address}")).await;
            service
        }
        Request::Lookup { service } => {
            let found = match registry.lookup(service.clone()).await {
                Ok(found) => found,
                Err(err) => {
                    tracing::error!("registry unavailable: {err}");
                    return REPLY_BAD_REQUEST.to_string();
                }
            };

            let peer_string = peer.to_string();
            let peer_host = strip_port(&peer_string).unwrap_or("unknown");
            info!(%service, %peer_host, "lookup");
            audit_line(
                audit,
                format!("{peer_host} requested the address for {service}"),
            )
            .await;

            format!("{service}={}", found.unwrap_or_default())
        }
        Request::Unknown { raw } => {
            debug!(%peer, %raw, "rejected request");
            REPLY_BAD_REQUEST.to_string()
        }
    }
}

async fn audit_line(audit: &LogSink, line: String) {
    if let Err(err) = audit.append(line).await {
        warn!("audit write failed: {err}");
    }
}
