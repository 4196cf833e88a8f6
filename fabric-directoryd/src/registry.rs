//! The Directory: a name→address map owned by a single task.
//!
//! Connections are handled concurrently, so all map access goes through
//! this actor's command channel. Commands are processed in channel order,
//! which keeps a registration visible to every lookup that completes after
//! it.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

enum RegistryCommand {
    Record {
        service: String,
        address: String,
        reply: oneshot::Sender<()>,
    },
    Lookup {
        service: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Cloneable handle to the registry task.
#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Spawn the owning task with an empty map.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel::<RegistryCommand>(256);

        tokio::spawn(async move {
            let mut entries: HashMap<String, String> = HashMap::new();
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    RegistryCommand::Record {
                        service,
                        address,
                        reply,
                    } => {
                        // last write wins, no versioning
                        entries.insert(service, address);
                        let _ = reply.send(());
                    }
                    RegistryCommand::Lookup { service, reply } => {
                        let _ = reply.send(entries.get(&service).cloned());
                    }
                    RegistryCommand::Len { reply } => {
                        let _ = reply.send(entries.len());
                    }
                    RegistryCommand::Shutdown => {
                        tracing::debug!("registry shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx }
    }

    pub async fn record(&self, service: String, address: String) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RegistryCommand::Record {
                service,
                address,
                reply,
            })
            .await?;
        rx.await?;
        Ok(())
    }

    pub async fn lookup(&self, service: String) -> Result<Option<String>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RegistryCommand::Lookup { service, reply })
            .await?;
        Ok(rx.await?)
    }

    pub async fn len(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Len { reply }).await?;
        Ok(rx.await?)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(RegistryCommand::Shutdown).await?;
        Ok(())
    }
}
