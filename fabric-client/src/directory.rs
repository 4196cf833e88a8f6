//! Client for the directory protocol: registration and lookup, one
//! connection per request.

use shared::protocol::{self, parse_lookup_reply};
use shared::FabricError;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::frame::{read_frame, write_frame};
use crate::retry::{retry_dial, RetryPolicy};

/// Dials the directory under a retry policy and issues one request per
/// connection.
///
/// The default policy keeps retrying until the directory exists; bound it
/// with [`RetryPolicy::with_max_attempts`] or cancel it through the token
/// when the caller cannot block.
pub struct DirectoryClient {
    addr: String,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl DirectoryClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            policy: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn dial(&self) -> Result<TcpStream, FabricError> {
        retry_dial(&self.addr, &self.policy, &self.cancel, || {
            let addr = self.addr.clone();
            async move { TcpStream::connect(&addr).await }
        })
        .await
    }

    /// Register `service` under this connection's observed address.
    ///
    /// Returns the local endpoint the OS assigned to the outbound
    /// connection — the server records its own view of the peer, so the
    /// reply carries no address worth parsing. The name echo is still
    /// awaited: the server sends it only after the entry is recorded, so
    /// a lookup issued after `register` returns is guaranteed to see it.
    pub async fn register(&self, service: &str) -> Result<String, FabricError> {
        let mut stream = self.dial().await?;
        write_frame(&mut stream, &protocol::encode_record(service)).await?;
        let local = stream.local_addr().map_err(FabricError::Transport)?;

        let reply = read_frame(&mut stream).await?;
        if reply != service {
            return Err(FabricError::UnexpectedReply { got: reply });
        }
        Ok(local.to_string())
    }

    /// Resolve `service`, returning the raw reply text
    /// (`"<name>=<address>"`, or `"<name>="` when unregistered).
    pub async fn lookup_raw(&self, service: &str) -> Result<String, FabricError> {
        let mut stream = self.dial().await?;
        write_frame(&mut stream, &protocol::encode_lookup(service)).await?;
        read_frame(&mut stream).await
    }

    /// Resolve `service` to its registered address, `None` when the name is
    /// not registered.
    pub async fn lookup(&self, service: &str) -> Result<Option<String>, FabricError> {
        let raw = self.lookup_raw(service).await?;
        Ok(parse_lookup_reply(&raw)
            .and_then(|(_, address)| address)
            .map(str::to_string))
    }
}
