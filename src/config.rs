use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub logging: LoggingConfig,
  /// Sport used when a command doesn't name one (e.g. "football", "tennis")
  pub default_sport: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL every request path is appended to
  pub base: String,
  /// Per-attempt request timeout, in seconds
  pub timeout: u64,
  /// Maximum number of attempts per request (1 = no retries)
  pub retries: u32,
  /// Fixed delay between attempts, in milliseconds
  pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base: "https://api.sofascore.com/api/v1".to_string(),
      timeout: 10,
      retries: 3,
      retry_delay_ms: 1000,
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout)
  }

  pub fn retry_delay(&self) -> Duration {
    Duration::from_millis(self.retry_delay_ms)
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// One JSON file per cached response
  #[default]
  File,
  /// A single SQLite database in the cache directory
  Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  pub dir: PathBuf,
  pub backend: CacheBackend,
  pub max_age: MaxAgeConfig,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      dir: default_cache_dir(),
      backend: CacheBackend::default(),
      max_age: MaxAgeConfig::default(),
    }
  }
}

/// Freshness windows per operation, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MaxAgeConfig {
  pub events_for_day: u64,
  pub live_events: u64,
  pub event: u64,
  pub event_stats: u64,
}

impl Default for MaxAgeConfig {
  fn default() -> Self {
    Self {
      events_for_day: 3600,
      live_events: 60,
      event: 600,
      event_stats: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter directive, e.g. "info" or "sofascore=debug"
  pub level: String,
  /// Also write logs to this file when set
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheConfig::default(),
      logging: LoggingConfig::default(),
      default_sport: "football".to_string(),
    }
  }
}

/// `$XDG_CACHE_HOME/sofascore`, or `~/.sofascore/cache` when that is unknown.
fn default_cache_dir() -> PathBuf {
  dirs::cache_dir()
    .map(|p| p.join("sofascore"))
    .or_else(|| dirs::home_dir().map(|p| p.join(".sofascore").join("cache")))
    .unwrap_or_else(|| PathBuf::from(".sofascore").join("cache"))
}

impl Config {
  /// Load configuration from file and the environment.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sofascore.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sofascore/config.yaml
  ///
  /// Without a file every setting takes its default. `SOFASCORE_*`
  /// environment variables override whatever the file says.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sofascore.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sofascore").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Apply `SOFASCORE_*` overrides, reading variables through `lookup`.
  pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(v) = lookup("SOFASCORE_API_BASE") {
      self.api.base = v;
    }
    if let Some(v) = lookup("SOFASCORE_API_TIMEOUT") {
      self.api.timeout = parse_number("SOFASCORE_API_TIMEOUT", &v)?;
    }
    if let Some(v) = lookup("SOFASCORE_API_RETRIES") {
      self.api.retries = parse_number("SOFASCORE_API_RETRIES", &v)?;
    }
    if let Some(v) = lookup("SOFASCORE_API_RETRY_DELAY_MS") {
      self.api.retry_delay_ms = parse_number("SOFASCORE_API_RETRY_DELAY_MS", &v)?;
    }
    if let Some(v) = lookup("SOFASCORE_CACHE_ENABLED") {
      self.cache.enabled = parse_flag(&v);
    }
    if let Some(v) = lookup("SOFASCORE_CACHE_DIR") {
      self.cache.dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("SOFASCORE_CACHE_BACKEND") {
      self.cache.backend = match v.to_lowercase().as_str() {
        "file" => CacheBackend::File,
        "sqlite" => CacheBackend::Sqlite,
        other => {
          return Err(eyre!(
            "Invalid SOFASCORE_CACHE_BACKEND '{}': expected 'file' or 'sqlite'",
            other
          ))
        }
      };
    }
    if let Some(v) = lookup("SOFASCORE_DEFAULT_SPORT") {
      self.default_sport = v;
    }
    if let Some(v) = lookup("SOFASCORE_LOG_LEVEL") {
      self.logging.level = v.to_lowercase();
    }
    if let Some(v) = lookup("SOFASCORE_LOG_FILE") {
      self.logging.file = (!v.is_empty()).then(|| PathBuf::from(v));
    }

    Ok(())
  }

  /// Reject settings the client cannot run with.
  pub fn validate(&self) -> Result<()> {
    if self.api.retries == 0 {
      return Err(eyre!("api.retries must be at least 1"));
    }
    if self.api.timeout == 0 {
      return Err(eyre!("api.timeout must be at least 1 second"));
    }

    url::Url::parse(&self.api.base)
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", self.api.base, e))?;

    Ok(())
  }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  value
    .trim()
    .parse()
    .map_err(|e| eyre!("Invalid value '{}' for {}: {}", value, name, e))
}

fn parse_flag(value: &str) -> bool {
  matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
