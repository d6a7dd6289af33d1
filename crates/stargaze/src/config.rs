//! Configuration management for Stargaze
//!
//! Settings come from a JSON file (explicit path, working directory, or the
//! user config directory), then environment variables, then CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::DEFAULT_CONTEXT_WINDOW;
use crate::error::ConfigError;
use crate::reveal::RevealConfig;

pub const SERVER_URL_ENV: &str = "STARGAZE_SERVER_URL";
pub const TIMEOUT_SECS_ENV: &str = "STARGAZE_TIMEOUT_SECS";

const LOCAL_CONFIG_FILE: &str = ".stargaze.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Base URL of the reasoning service
  #[serde(default = "default_server_url")]
  pub server_url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Trailing messages resent with each request
  #[serde(default = "default_context_window")]
  pub context_window: usize,
  /// First bot message of every conversation
  #[serde(default = "default_greeting")]
  pub greeting: String,
  #[serde(default)]
  pub reveal: RevealSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSettings {
  #[serde(default = "default_chars_per_tick")]
  pub chars_per_tick: usize,
  #[serde(default = "default_tick_ms")]
  pub tick_ms: u64,
}

fn default_server_url() -> String {
  "http://127.0.0.1:8000".to_string()
}
fn default_timeout_secs() -> u64 {
  30
}
fn default_context_window() -> usize {
  DEFAULT_CONTEXT_WINDOW
}
fn default_greeting() -> String {
  "Hello! I am your Medicare Analytics AI. Ask me about star ratings.".to_string()
}
fn default_chars_per_tick() -> usize {
  1
}
fn default_tick_ms() -> u64 {
  5
}

impl Default for RevealSettings {
  fn default() -> Self {
    Self { chars_per_tick: default_chars_per_tick(), tick_ms: default_tick_ms() }
  }
}

impl From<&RevealSettings> for RevealConfig {
  fn from(settings: &RevealSettings) -> Self {
    RevealConfig {
      chars_per_tick: settings.chars_per_tick,
      tick: Duration::from_millis(settings.tick_ms),
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      server_url: default_server_url(),
      timeout_secs: default_timeout_secs(),
      context_window: default_context_window(),
      greeting: default_greeting(),
      reveal: RevealSettings::default(),
    }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
  }

  /// Load from `explicit`, else the first config file found, else defaults,
  /// then apply environment overrides. Call [`Config::validate`] once every
  /// override (including CLI flags) is in place.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => match Self::discover() {
        Some(path) => {
          tracing::debug!(path = %path.display(), "loading config");
          Self::load_from_file(path)?
        }
        None => Config::default(),
      },
    };

    config.apply_env()?;
    Ok(config)
  }

  fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
      return Some(local);
    }

    dirs::config_dir().map(|dir| dir.join("stargaze").join("config.json")).filter(|p| p.exists())
  }

  /// Apply `STARGAZE_*` environment overrides
  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
      self.server_url = url;
    }

    if let Ok(secs) = std::env::var(TIMEOUT_SECS_ENV) {
      self.timeout_secs = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: TIMEOUT_SECS_ENV,
        message: format!("'{secs}' is not a number of seconds"),
      })?;
    }

    Ok(())
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let url = url::Url::parse(&self.server_url).map_err(|e| ConfigError::InvalidUrl {
      url: self.server_url.clone(),
      message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(ConfigError::InvalidUrl {
        url: self.server_url.clone(),
        message: "scheme must be http or https".to_string(),
      });
    }

    let non_zero = [
      ("context_window", self.context_window as u64),
      ("reveal.chars_per_tick", self.reveal.chars_per_tick as u64),
      ("reveal.tick_ms", self.reveal.tick_ms),
      ("timeout_secs", self.timeout_secs),
    ];
    for (field, value) in non_zero {
      if value == 0 {
        return Err(ConfigError::InvalidValue { field, message: "must be greater than 0".to_string() });
      }
    }

    Ok(())
  }

  pub fn reveal_config(&self) -> RevealConfig {
    RevealConfig::from(&self.reveal)
  }

  /// Server URL without a trailing slash
  pub fn base_url(&self) -> &str {
    self.server_url.trim_end_matches('/')
  }
}
