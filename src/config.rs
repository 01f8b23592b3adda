use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::StaleTimes;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding `api.url`.
pub const API_URL_ENV: &str = "MPADMIN_API_URL";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Rows per page for list commands
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiConfig {
  /// Base URL of the marketplace REST API, including the `/api` prefix
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Request timeout; unset means the transport default
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CacheConfig {
  #[serde(default = "default_list_stale")]
  pub list_stale_secs: u64,
  #[serde(default = "default_stats_stale")]
  pub stats_stale_secs: u64,
  #[serde(default = "default_identity_stale")]
  pub identity_stale_secs: u64,
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
  crate::api::DEFAULT_LIMIT
}

fn default_list_stale() -> u64 {
  300
}

fn default_stats_stale() -> u64 {
  30
}

fn default_identity_stale() -> u64 {
  300
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheConfig::default(),
      page_size: default_page_size(),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      timeout_secs: None,
    }
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      list_stale_secs: default_list_stale(),
      stats_stale_secs: default_stats_stale(),
      identity_stale_secs: default_identity_stale(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./mpadmin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mpadmin/config.yaml
  ///
  /// Built-in defaults apply when none exists. `MPADMIN_API_URL` overrides
  /// the API url in every case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.with_env_overrides(std::env::var(API_URL_ENV).ok())
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("mpadmin.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mpadmin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes as null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn with_env_overrides(mut self, api_url: Option<String>) -> Result<Self> {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
      self.api.url = url;
    }
    self.validate()?;
    Ok(self)
  }

  fn validate(&self) -> Result<()> {
    if self.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    url::Url::parse(&self.api.url).map_err(|e| eyre!("Invalid api.url {}: {}", self.api.url, e))?;
    Ok(())
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.api.timeout_secs.map(Duration::from_secs)
  }

  pub fn stale_times(&self) -> StaleTimes {
    StaleTimes {
      resources: secs(self.cache.list_stale_secs),
      dashboard: secs(self.cache.stats_stale_secs),
      identity: secs(self.cache.identity_stale_secs),
    }
  }

  /// Get the login password from the environment.
  ///
  /// Checks MPADMIN_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("MPADMIN_PASSWORD")
      .map_err(|_| eyre!("Password not found. Pass --password or set MPADMIN_PASSWORD."))
  }
}

fn secs(value: u64) -> chrono::Duration {
  chrono::Duration::seconds(i64::from(value.min(u64::from(u32::MAX)) as u32))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_when_empty() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.url, DEFAULT_API_URL);
    assert_eq!(config.page_size, 10);
    assert_eq!(config.timeout(), None);
    assert_eq!(config.stale_times(), StaleTimes::default());
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse(
      "api:\n  url: https://market.example.com/api\n  timeout_secs: 15\ncache:\n  stats_stale_secs: 5\n",
    )
    .unwrap();

    assert_eq!(config.api.url, "https://market.example.com/api");
    assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.stale_times().dashboard, chrono::Duration::seconds(5));
    assert_eq!(config.stale_times().resources, chrono::Duration::minutes(5));
    assert_eq!(config.page_size, 10);
  }

  #[test]
  fn test_rejects_bad_values() {
    assert!(Config::parse("page_size: 0\n").is_err());
    assert!(Config::parse("api:\n  url: not a url\n").is_err());
  }

  #[test]
  fn test_env_override() {
    let config = Config::parse("")
      .unwrap()
      .with_env_overrides(Some("http://10.0.0.2:5000/api".to_string()))
      .unwrap();
    assert_eq!(config.api.url, "http://10.0.0.2:5000/api");

    let untouched = Config::parse("")
      .unwrap()
      .with_env_overrides(Some("  ".to_string()))
      .unwrap();
    assert_eq!(untouched.api.url, DEFAULT_API_URL);
  }

  #[test]
  fn test_load_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpadmin.yaml");
    std::fs::write(&path, "page_size: 25\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.page_size, 25);

    assert!(Config::load(Some(&dir.path().join("missing.yaml"))).is_err());
  }
}
