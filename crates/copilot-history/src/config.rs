//! Configuration file support for copilot-history.
//!
//! Loads `config.toml` from `<config dir>/copilot-history/`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use copilot_history_sessions::{
    default_session_dir, DEFAULT_LIST_LIMIT, DEFAULT_MAX_RESULTS, SESSION_DIR_ENV,
};

/// Default port of the `serve` command.
pub const DEFAULT_PORT: u16 = 3200;

/// User-level configuration loaded from `config.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Directory holding the session logs
    pub session_dir: Option<PathBuf>,
    /// Default cap for search results
    pub max_results: Option<usize>,
    /// Default number of sessions shown by `list`
    pub list_limit: Option<usize>,
    /// Default tracing level (overridden by `RUST_LOG`)
    pub log_level: Option<String>,
    /// Port of the HTTP API
    pub port: Option<u16>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

impl HistoryConfig {
    /// Default location of the config file, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("copilot-history").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: HistoryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Get the effective session directory.
    /// Priority: CLI flag > `SESSION_STATE_DIR` > config file > default
    pub fn session_dir(&self, flag: Option<&Path>) -> PathBuf {
        let env = std::env::var_os(SESSION_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.resolve_session_dir(flag, env)
    }

    fn resolve_session_dir(&self, flag: Option<&Path>, env: Option<PathBuf>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or(env)
            .or_else(|| self.session_dir.clone())
            .unwrap_or_else(default_session_dir)
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = HistoryConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
session_dir = "/data/sessions"
max_results = 10
list_limit = 5
log_level = "debug"
port = 8080
"#,
        )
        .unwrap();

        let config = HistoryConfig::load(&path).unwrap().unwrap();

        assert_eq!(config.session_dir, Some(PathBuf::from("/data/sessions")));
        assert_eq!(config.max_results(), 10);
        assert_eq!(config.list_limit(), 5);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.port(), 8080);
    }

    #[test]
    fn test_unknown_key_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "colour = \"blue\"\n").unwrap();

        assert!(HistoryConfig::load(&path).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_results(), DEFAULT_MAX_RESULTS);
        assert_eq!(config.list_limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_session_dir_priority() {
        let config = HistoryConfig {
            session_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let flag = PathBuf::from("/from/flag");
        let env = Some(PathBuf::from("/from/env"));

        assert_eq!(
            config.resolve_session_dir(Some(&flag), env.clone()),
            PathBuf::from("/from/flag")
        );
        assert_eq!(
            config.resolve_session_dir(None, env),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            config.resolve_session_dir(None, None),
            PathBuf::from("/from/config")
        );
        assert_eq!(
            HistoryConfig::default().resolve_session_dir(None, None),
            default_session_dir()
        );
    }
}
