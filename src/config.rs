//! Runtime configuration for the atelier client.
//!
//! Settings come from three layers, later layers winning:
//! defaults → `atelier.toml` (explicit path, working directory, or the user
//! config directory) → `ATELIER_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Fixed quiet window for the outbound draft publisher.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Fixed delay before a reconnect attempt after an abnormal close.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// On-disk shape of `atelier.toml`. All fields optional; missing values fall
/// back to defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    ws_url: Option<String>,
    token: Option<String>,
    user_id: Option<String>,
    timing: Option<TimingConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct TimingConfig {
    debounce_ms: Option<u64>,
    reconnect_delay_ms: Option<u64>,
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the request/response API, e.g. `http://127.0.0.1:4710`.
    pub api_url: String,
    /// Base URL of the draft relay, e.g. `ws://127.0.0.1:4710`.
    pub ws_url: String,
    /// Auth token attached to API requests and the relay handshake.
    pub token: String,
    /// Durable identity of the local user; used for self-echo filtering.
    pub user_id: String,
    /// Quiet window for the debounced publisher.
    pub debounce: Duration,
    /// Delay before reconnecting after an abnormal close.
    pub reconnect_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:4710".to_string(),
            ws_url: "ws://127.0.0.1:4710".to_string(),
            token: String::new(),
            user_id: String::new(),
            debounce: DEFAULT_DEBOUNCE,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl Config {
    /// Load configuration, optionally from an explicit file path.
    ///
    /// Without an explicit path, `./atelier.toml` is tried first, then
    /// `<config dir>/atelier/atelier.toml`. A missing file is not an error;
    /// a file that exists but fails to parse is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(Self::read_file(p)?),
            None => Self::discover_file()?,
        };
        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file);
        }
        config.apply_env();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn discover_file() -> Result<Option<FileConfig>> {
        let local = PathBuf::from("atelier.toml");
        if local.exists() {
            return Ok(Some(Self::read_file(&local)?));
        }
        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("atelier").join("atelier.toml");
            if user.exists() {
                return Ok(Some(Self::read_file(&user)?));
            }
        }
        Ok(None)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.ws_url {
            self.ws_url = v;
        }
        if let Some(v) = file.token {
            self.token = v;
        }
        if let Some(v) = file.user_id {
            self.user_id = v;
        }
        if let Some(timing) = file.timing {
            if let Some(ms) = timing.debounce_ms {
                self.debounce = Duration::from_millis(ms);
            }
            if let Some(ms) = timing.reconnect_delay_ms {
                self.reconnect_delay = Duration::from_millis(ms);
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ATELIER_API_URL") {
            self.api_url = v;
        }
        if let Ok(v) = std::env::var("ATELIER_WS_URL") {
            self.ws_url = v;
        }
        if let Ok(v) = std::env::var("ATELIER_TOKEN") {
            self.token = v;
        }
        if let Ok(v) = std::env::var("ATELIER_USER_ID") {
            self.user_id = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.debounce, Duration::from_secs(2));
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        fs::write(
            &path,
            r#"
api_url = "https://tracker.example.com"
token = "abc123"
user_id = "reviewer-7"

[timing]
debounce_ms = 250
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api_url, "https://tracker.example.com");
        assert_eq!(config.token, "abc123");
        assert_eq!(config.user_id, "reviewer-7");
        assert_eq!(config.debounce, Duration::from_millis(250));
        // Unset timing values keep their defaults
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atelier.toml");
        fs::write(&path, "api_url = [not valid").unwrap();
        let result = Config::load(Some(&path));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse config file")
        );
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
