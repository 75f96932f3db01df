//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Server under test
    #[serde(default)]
    pub server: ServerConfig,

    /// Client invocation settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Corpus source settings
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Console output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// How to launch and stop the server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Shell-style command line that starts the server
    #[serde(default = "default_server_command")]
    pub command: String,

    /// Fixed pause after spawning, before the first case runs
    #[serde(default = "default_warmup")]
    pub warmup_ms: u64,

    /// How long to wait after SIGTERM before force-killing
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,

    /// Working directory for the server process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: default_server_command(),
            warmup_ms: default_warmup(),
            shutdown_grace_ms: default_shutdown_grace(),
            working_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_server_command() -> String {
    "bazel run //server:server".to_string()
}
fn default_warmup() -> u64 {
    1000
}
fn default_shutdown_grace() -> u64 {
    2000
}

/// Settings applied to every client subprocess
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ClientConfig {
    /// Working directory for client commands
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for client commands
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Where the corpus comes from and how it is read
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Marker that starts a command line
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Corpus file; the embedded corpus is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            path: None,
        }
    }
}

fn default_prompt() -> String {
    crate::corpus::DEFAULT_PROMPT.to_string()
}

/// Console output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Show a progress bar on stderr
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Colorize pass/fail lines
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress: true,
            color: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.command, "bazel run //server:server");
        assert_eq!(config.server.warmup(), Duration::from_secs(1));
        assert_eq!(config.corpus.prompt, "$ ");
        assert!(config.corpus.path.is_none());
        assert!(config.output.progress);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[server]
command = "./target/debug/server --port 1234"
warmup_ms = 250

[client.env]
ZSET_PORT = "1234"
"#,
        )
        .unwrap();

        assert_eq!(config.server.command, "./target/debug/server --port 1234");
        assert_eq!(config.server.warmup_ms, 250);
        assert_eq!(config.server.shutdown_grace_ms, 2000);
        assert_eq!(config.client.env.get("ZSET_PORT").map(String::as_str), Some("1234"));
        assert_eq!(config.corpus.prompt, "$ ");
        assert!(config.output.color);
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("[server\ncommand = 1").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_read_error() {
        let err = Config::load_from(Path::new("/nonexistent/replay/config.toml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
