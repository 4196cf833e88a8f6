use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::protocol::UNIVERSAL_PORT;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_instance_id")]
    pub instance_id: String,
}

fn default_listen() -> String {
    format!("0.0.0.0:{UNIVERSAL_PORT}")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_instance_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| format!("logger@{h}"))
        .unwrap_or_else(|| "logger".to_string())
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_dir: default_log_dir(),
            instance_id: default_instance_id(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
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
        assert_eq!(config.logger.listen, "0.0.0.0:6060");
        assert_eq!(config.logger.log_dir, PathBuf::from("./logs"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logger]\nlog_dir = \"/var/log/fabric\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logger.log_dir, PathBuf::from("/var/log/fabric"));
        assert_eq!(config.logger.listen, "0.0.0.0:6060");
    }
}
