//! Fire-and-forget log shipping.
//!
//! Unlike the directory client, the shipper dials exactly once: the logger
//! is best-effort, not a dependency to wait for. Failures come back as
//! errors and the caller decides whether they are fatal.

use shared::types::LogRecord;
use shared::FabricError;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::frame::write_frame;
use crate::sink::LogSink;

pub struct LogShipper {
    addr: String,
}

impl LogShipper {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Ship one record. The logger's echo is not awaited.
    pub async fn send(&self, record: &LogRecord) -> Result<(), FabricError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(FabricError::Transport)?;
        write_frame(&mut stream, &record.to_string()).await?;
        stream.shutdown().await.ok();
        Ok(())
    }

    /// Ship one record, appending the same rendered line to a local sink
    /// first so the sender keeps its own copy.
    pub async fn send_with_tee(
        &self,
        record: &LogRecord,
        sink: &LogSink,
    ) -> Result<(), FabricError> {
        sink.append(record.to_string()).await?;
        self.send(record).await
    }
}
