//! HTTP client for the reasoning service
//!
//! Thin reqwest wrapper: posts the bounded-context prompt to `/chat` and
//! decodes the reply and any records that came with it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Config;
use crate::conversation::{ReasoningService, ServiceReply};
use crate::error::ServiceError;

/// Configuration for the reasoning service client
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the service (e.g., "http://127.0.0.1:8000")
  pub base_url: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: "http://127.0.0.1:8000".to_string(), timeout_secs: 30 }
  }
}

impl From<&Config> for ClientConfig {
  fn from(config: &Config) -> Self {
    Self { base_url: config.base_url().to_string(), timeout_secs: config.timeout_secs }
  }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  prompt: &'a str,
}

/// HTTP client for the reasoning service
pub struct ChatClient {
  client: Client,
  config: ClientConfig,
}

impl ChatClient {
  /// Create a new client with custom configuration
  pub fn with_config(config: ClientConfig) -> Result<Self, ServiceError> {
    let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  async fn post_chat(&self, prompt: &str) -> Result<ServiceReply, ServiceError> {
    let url = format!("{}/chat", self.config.base_url);
    let response = self.client.post(&url).json(&ChatRequest { prompt }).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ServiceError::Status { status: status.as_u16(), body });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Decode { message: e.to_string() })
  }
}

#[async_trait]
impl ReasoningService for ChatClient {
  async fn ask(&self, prompt: &str) -> Result<ServiceReply, ServiceError> {
    let secs = self.config.timeout_secs;
    let reply = timeout(Duration::from_secs(secs), self.post_chat(prompt))
      .await
      .map_err(|_| ServiceError::Timeout { secs })??;

    tracing::debug!(
      reply_bytes = reply.reply.len(),
      records = reply.data.as_ref().map_or(0, Vec::len),
      "received reply"
    );
    Ok(reply)
  }
}
