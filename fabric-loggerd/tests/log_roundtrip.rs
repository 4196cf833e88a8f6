//! End-to-end tests for the log collector over real sockets.

use std::time::Duration;

use chrono::Local;
use fabric_client::frame::{read_frame, write_frame};
use fabric_client::{LogShipper, LogSink};
use fabric_loggerd::server::LogServer;
use shared::types::LogRecord;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

struct TestLogger {
    addr: String,
    cancel: CancellationToken,
    log_dir: tempfile::TempDir,
}

impl Drop for TestLogger {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn spawn_logger() -> TestLogger {
    let log_dir = tempfile::tempdir().unwrap();
    let sink = LogSink::spawn(log_dir.path().to_path_buf()).unwrap();

    let server = LogServer::bind("127.0.0.1:0", sink).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let cancel = CancellationToken::new();
    let serve_cancel = cancel.clone();
    tokio::spawn(async move {
        server.serve(serve_cancel).await.ok();
    });

    TestLogger {
        addr,
        cancel,
        log_dir,
    }
}

fn dated_file_name() -> String {
    format!("{}.txt", Local::now().date_naive().format("%Y-%m-%d"))
}

#[tokio::test]
async fn echoes_and_persists_a_record() {
    let logger = spawn_logger().await;
    let line = "auth [Aug 7 2026 14:03:05 UTC] service started";

    let mut stream = TcpStream::connect(&logger.addr).await.unwrap();
    write_frame(&mut stream, line).await.unwrap();
    let echo = read_frame(&mut stream).await.unwrap();
    assert_eq!(echo, line);

    // the record is persisted before the echo goes out
    let contents =
        std::fs::read_to_string(logger.log_dir.path().join(dated_file_name())).unwrap();
    assert_eq!(contents, format!("{line}\n"));
}

#[tokio::test]
async fn shipped_records_land_in_the_dated_file() {
    let logger = spawn_logger().await;
    let record = LogRecord::new("auth@test", "service started");
    let rendered = record.to_string();

    LogShipper::new(logger.addr.clone())
        .send(&record)
        .await
        .unwrap();

    // fire-and-forget: poll for the write to land
    let path = logger.log_dir.path().join(dated_file_name());
    let mut contents = String::new();
    for _ in 0..50 {
        if let Ok(text) = std::fs::read_to_string(&path) {
            if text.contains(&rendered) {
                contents = text;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(contents, format!("{rendered}\n"));
}

#[tokio::test]
async fn empty_connections_are_dropped() {
    let logger = spawn_logger().await;

    // a peer that connects and says nothing leaves no trace
    let stream = TcpStream::connect(&logger.addr).await.unwrap();
    drop(stream);

    let line = "auth [Aug 7 2026 14:03:05 UTC] still serving";
    let mut stream = TcpStream::connect(&logger.addr).await.unwrap();
    write_frame(&mut stream, line).await.unwrap();
    assert_eq!(read_frame(&mut stream).await.unwrap(), line);

    let contents =
        std::fs::read_to_string(logger.log_dir.path().join(dated_file_name())).unwrap();
    assert_eq!(contents, format!("{line}\n"));
}
