use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::protocol::UNIVERSAL_PORT;

/// Environment variable naming the logger endpoint. A bare host gets the
/// universal port appended.
pub const LOGGER_ENV: &str = "FABRIC_LOGGER";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Fixed port recorded for every registered service; the peer host is
    /// observed, this port is policy.
    #[serde(default = "default_service_port")]
    pub service_port: u16,
    /// Logger endpoint for the startup record. Shipping is skipped when
    /// unset.
    #[serde(default)]
    pub logger_addr: Option<String>,
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,
    /// Identity stamped into shipped log records.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_listen() -> String {
    format!("0.0.0.0:{UNIVERSAL_PORT}")
}

fn default_service_port() -> u16 {
    UNIVERSAL_PORT
}

fn default_probe_addr() -> String {
    fabric_client::resolve::DEFAULT_PROBE_ADDR.to_string()
}

fn default_instance_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| format!("directory@{h}"))
        .unwrap_or_else(|| "directory".to_string())
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            service_port: default_service_port(),
            logger_addr: None,
            probe_addr: default_probe_addr(),
            instance_id: default_instance_id(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to built-in
    /// defaults. The environment override applies either way.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(LOGGER_ENV) {
            if !value.is_empty() {
                let addr = if value.contains(':') {
                    value
                } else {
                    format!("{value}:{UNIVERSAL_PORT}")
                };
                self.directory.logger_addr = Some(addr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_listen_on_the_universal_port() {
        let config = Config::default();
        assert_eq!(config.directory.listen, "0.0.0.0:6060");
        assert_eq!(config.directory.service_port, UNIVERSAL_PORT);
        assert!(config.directory.logger_addr.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[directory]\nlisten = \"127.0.0.1:7070\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.directory.listen, "127.0.0.1:7070");
        assert_eq!(config.directory.service_port, UNIVERSAL_PORT);
        assert_eq!(config.audit.log_dir, PathBuf::from("./logs"));
    }
}
