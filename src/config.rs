//! Punchcard configuration.
//!
//! Loaded from `~/.punchcard/config.toml`. Every field has a default;
//! a missing file means a default config, while an unreadable or
//! invalid file is a startup error.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Service origin used when the config file does not override it.
const DEFAULT_BASE_URL: &str = "https://app.woffu.com/api";

/// Pause between dispatched requests, in milliseconds.
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

/// Punchcard configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Base URL of the time-tracking API.
    pub base_url: String,

    /// Fixed delay between successive request executions.
    pub request_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

impl Config {
    /// Load config from `~/.punchcard/config.toml`.
    /// Falls back to defaults when the file does not exist.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The config file path: `~/.punchcard/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".punchcard").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            "base-url = \"https://tracker.example.test/api\"\nrequest-delay-ms = 250\n",
        )
        .unwrap();

        assert_eq!(config.base_url, "https://tracker.example.test/api");
        assert_eq!(config.request_delay_ms, 250);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::parse("request-delay-ms = 50\n").unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_delay_ms, 50);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_delay_ms, DEFAULT_REQUEST_DELAY_MS);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::parse("base-url = [not toml").is_err());
    }
}
