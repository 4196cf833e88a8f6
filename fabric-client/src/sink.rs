//! Dated-file log sink.
//!
//! One writer thread owns the open file; everyone else appends through a
//! cloneable handle. Lines land in `<dir>/<YYYY-MM-DD>.txt`, and the file
//! rolls over when the local date changes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::thread;

use chrono::{Local, NaiveDate};
use shared::FabricError;
use tokio::sync::{mpsc, oneshot};

enum SinkCommand {
    Append(String, oneshot::Sender<Result<(), FabricError>>),
    Shutdown,
}

/// Handle to the sink's writer thread.
#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::Sender<SinkCommand>,
}

impl LogSink {
    /// Spawn the writer thread for `dir`, creating the directory if needed.
    pub fn spawn(dir: PathBuf) -> Result<Self, FabricError> {
        std::fs::create_dir_all(&dir).map_err(FabricError::LogFile)?;

        let (tx, mut rx) = mpsc::channel::<SinkCommand>(256);

        thread::spawn(move || {
            let mut file = DatedFile::new(dir);
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    SinkCommand::Append(line, reply) => {
                        let _ = reply.send(file.append(&line));
                    }
                    SinkCommand::Shutdown => {
                        tracing::debug!("log sink shutting down");
                        break;
                    }
                }
            }
        });

        Ok(Self { tx })
    }

    /// Append one line to today's file.
    pub async fn append(&self, line: impl Into<String>) -> Result<(), FabricError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SinkCommand::Append(line.into(), reply))
            .await
            .map_err(|_| FabricError::SinkClosed)?;
        rx.await.map_err(|_| FabricError::SinkClosed)?
    }

    pub async fn shutdown(&self) -> Result<(), FabricError> {
        self.tx
            .send(SinkCommand::Shutdown)
            .await
            .map_err(|_| FabricError::SinkClosed)
    }
}

struct DatedFile {
    dir: PathBuf,
    open: Option<(NaiveDate, File)>,
}

impl DatedFile {
    fn new(dir: PathBuf) -> Self {
        Self { dir, open: None }
    }

    fn append(&mut self, line: &str) -> Result<(), FabricError> {
        let today = Local::now().date_naive();

        if !matches!(&self.open, Some((date, _)) if *date == today) {
            let path = self.dir.join(format!("{}.txt", today.format("%Y-%m-%d")));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(FabricError::LogFile)?;
            self.open = Some((today, file));
        }

        let (_, file) = self.open.as_mut().expect("file opened above");
        writeln!(file, "{line}").map_err(FabricError::LogFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_lines_to_a_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LogSink::spawn(dir.path().to_path_buf()).unwrap();

        sink.append("first line").await.unwrap();
        sink.append("second line").await.unwrap();

        let name = format!("{}.txt", Local::now().date_naive().format("%Y-%m-%d"));
        let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(contents, "first line\nsecond line\n");

        sink.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn creates_the_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");
        let sink = LogSink::spawn(nested.clone()).unwrap();

        sink.append("hello").await.unwrap();
        assert!(nested.is_dir());
    }
}
