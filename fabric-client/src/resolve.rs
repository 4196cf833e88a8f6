//! Self-address discovery via an outbound UDP probe.
//!
//! Connecting a UDP socket to a routable endpoint makes the network stack
//! pick the local address a peer would reach us on; nothing is ever sent.

use shared::FabricError;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::retry::{retry_dial, RetryPolicy};

/// Default probe endpoint (a public DNS resolver; no traffic reaches it).
pub const DEFAULT_PROBE_ADDR: &str = "8.8.8.8:80";

/// Learn this host's routable address, ephemeral port intact.
pub async fn discover_self_address(
    probe_addr: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<String, FabricError> {
    let socket = retry_dial(probe_addr, policy, cancel, move || async move {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(probe_addr).await?;
        Ok(socket)
    })
    .await?;

    let local = socket.local_addr().map_err(FabricError::Transport)?;
    Ok(local.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discovers_a_host_and_port() {
        let cancel = CancellationToken::new();
        // loopback probe keeps the test independent of routing tables
        let addr = discover_self_address("127.0.0.1:9", &RetryPolicy::default(), &cancel)
            .await
            .unwrap();

        let (host, port) = addr.split_once(':').expect("host:port form");
        assert_eq!(host, "127.0.0.1");
        assert!(port.parse::<u16>().unwrap() > 0);
    }
}
