use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::quota::DEFAULT_DAILY_CALL_LIMIT;

pub const DEFAULT_DARKSKY_URL: &str = "https://api.darksky.net/forecast";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

pub const ENV_API_KEY: &str = "RAINING_DARKSKY_API_KEY";
pub const ENV_API_URL: &str = "RAINING_DARKSKY_API_URL";

/// Credentials and endpoint for the Dark Sky forecast API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DarkSkyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; the key and coordinates are appended as path segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// daily_call_limit = 1000
/// cache_ttl_secs = 60
///
/// [darksky]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub darksky: DarkSkyConfig,

    #[serde(default = "default_daily_call_limit")]
    pub daily_call_limit: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_daily_call_limit() -> u64 {
    DEFAULT_DAILY_CALL_LIMIT
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            darksky: DarkSkyConfig::default(),
            daily_call_limit: DEFAULT_DAILY_CALL_LIMIT,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Load the config file (or defaults if there is none yet) and apply
    /// environment overrides on top.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_from(&Self::config_file_path()?)?;
        cfg.apply_overrides(|key| env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("se", "phooey", "raining")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.darksky.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.darksky.api_url = Some(url);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.darksky.api_key = Some(api_key);
    }

    pub fn set_api_url(&mut self, api_url: String) {
        self.darksky.api_url = Some(api_url);
    }

    /// Returns the API key, if one is configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.darksky.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Like [`Config::api_key`], but a missing key is an error with a hint.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No Dark Sky API key configured.\n\
                 Hint: run `raining configure` or set {ENV_API_KEY}."
            )
        })
    }

    pub fn api_url(&self) -> &str {
        self.darksky
            .api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_DARKSKY_URL)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        // chrono panics above i64::MAX milliseconds
        let secs = self.cache_ttl_secs.min(i64::MAX as u64 / 1000) as i64;
        chrono::Duration::seconds(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_free_tier() {
        let cfg = Config::default();

        assert_eq!(cfg.daily_call_limit, 1000);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.api_url(), DEFAULT_DARKSKY_URL);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn require_api_key_errors_with_hint() {
        let err = Config::default().require_api_key().unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("No Dark Sky API key configured"));
        assert!(msg.contains("Hint: run `raining configure`"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key(String::new());

        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("[darksky]\napi_key = \"KEY\"\n").unwrap();

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.api_url(), DEFAULT_DARKSKY_URL);
        assert_eq!(cfg.daily_call_limit, 1000);
        assert_eq!(cfg.cache_ttl(), chrono::Duration::seconds(60));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_KEY, "ENV_KEY"),
            (ENV_API_URL, "http://localhost:9999/forecast"),
        ]);
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.api_key(), Some("ENV_KEY"));
        assert_eq!(cfg.api_url(), "http://localhost:9999/forecast");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        cfg.apply_overrides(|_| Some(String::new()));

        assert_eq!(cfg.api_key(), Some("FILE_KEY"));
        assert_eq!(cfg.api_url(), DEFAULT_DARKSKY_URL);
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SECRET".into());
        cfg.set_api_url("http://example.test/forecast".into());
        cfg.daily_call_limit = 50;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("SECRET"));
        assert_eq!(loaded.api_url(), "http://example.test/forecast");
        assert_eq!(loaded.daily_call_limit, 50);
        assert_eq!(loaded.cache_ttl_secs, 60);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "daily_call_limit = \"lots\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
