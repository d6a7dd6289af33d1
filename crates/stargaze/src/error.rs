//! Error types for the chart engine, the reasoning service, and configuration

use thiserror::Error;

/// Errors raised while pivoting records into a chart
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartError {
  #[error("Records contain more than one value for measure '{measure}' and entity '{entity}'")]
  DuplicateCell { measure: String, entity: String },
}

/// Errors raised while talking to the reasoning service
#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("Request to reasoning service failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Reasoning service returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Reasoning service did not answer within {secs}s")]
  Timeout { secs: u64 },

  #[error("Could not decode reasoning service reply: {message}")]
  Decode { message: String },
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read config file: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to parse config file: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Invalid server url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("Invalid value for {field}: {message}")]
  InvalidValue { field: &'static str, message: String },
}
