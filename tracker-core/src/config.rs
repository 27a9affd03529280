//! Client configuration
//!
//! Priority: environment variables > config file > defaults.

use crate::error::{Result, TrackerError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service endpoint for plain requests
pub const DEFAULT_BASE_URL: &str = "http://www.pivotaltracker.com/services/v3";

/// Service endpoint for credential exchange
pub const DEFAULT_SECURE_BASE_URL: &str = "https://www.pivotaltracker.com/services/v3";

/// Tracker client configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for API requests
    pub base_url: String,
    /// Base URL used when exchanging a login for a token
    pub secure_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API token, if already known
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secure_base_url: DEFAULT_SECURE_BASE_URL.to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

impl ClientConfig {
    /// Load from `path` (or the default location) and apply environment
    /// overrides. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                TrackerError::Config(format!("failed to read {}: {}", path.display(), e))
            })?;
            toml::from_str(&contents).map_err(|e| {
                TrackerError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TRACKER_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("TRACKER_BASE_URL") {
            self.base_url = url;
        }
        if let Some(url) = lookup("TRACKER_SECURE_BASE_URL") {
            self.secure_base_url = url;
        }
        if let Some(secs) = lookup("TRACKER_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| {
                TrackerError::Config(format!("TRACKER_TIMEOUT_SECS is not a number: {:?}", secs))
            })?;
        }
        if let Some(token) = lookup("TRACKER_TOKEN") {
            self.token = Some(token);
        }
        Ok(())
    }

    /// `~/.config/tracker/config.toml`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("tracker")
            .join("config.toml")
    }

    pub(crate) fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn secure_base(&self) -> &str {
        self.secure_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.secure_base_url.starts_with("https://"));
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let mut config = ClientConfig::default();
        let loaded = ClientConfig::load(Some(&tmp.path().join("absent.toml"))).unwrap();
        // environment may carry overrides; compare only what it cannot touch
        config.token = loaded.token.clone();
        config.base_url = loaded.base_url.clone();
        config.secure_base_url = loaded.secure_base_url.clone();
        config.timeout_secs = loaded.timeout_secs;
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "base_url = \"http://localhost:3000/services/v3/\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();
        drop(file);

        let contents = std::fs::read_to_string(&path).unwrap();
        let config: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(config.base(), "http://localhost:3000/services/v3");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.secure_base_url, DEFAULT_SECURE_BASE_URL);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = [").unwrap();

        let err = ClientConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRACKER_BASE_URL", "http://example.test/v3"),
            ("TRACKER_TOKEN", "abc123"),
            ("TRACKER_TIMEOUT_SECS", "9"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://example.test/v3");
        assert_eq!(config.token.as_deref(), Some("abc123"));
        assert_eq!(config.timeout_secs, 9);
    }

    #[test]
    fn test_env_bad_timeout() {
        let mut config = ClientConfig::default();
        let result = config.apply_env(|k| (k == "TRACKER_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert!(result.is_err());
    }
}
