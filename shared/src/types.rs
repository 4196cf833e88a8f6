use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout used inside shipped log lines, e.g. `Aug 7 2026 14:03:05 UTC`.
pub const TIMESTAMP_FORMAT: &str = "%b %-d %Y %H:%M:%S %Z";

/// One log record as shipped over the wire and written to the dated file.
///
/// Renders as `"<id> [<timestamp>] <message>"`. The `id` names the sending
/// process (e.g. `directory@buildhost`); the logger stores the rendered
/// line verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogRecord {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.id,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_id_timestamp_and_message() {
        let record = LogRecord {
            id: "directory".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 14, 3, 5).unwrap(),
            message: "auth started at 10.0.0.5:6060".to_string(),
        };
        assert_eq!(
            record.to_string(),
            "directory [Aug 7 2026 14:03:05 UTC] auth started at 10.0.0.5:6060"
        );
    }
}
