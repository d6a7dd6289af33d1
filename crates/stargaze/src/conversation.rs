//! Conversation state
//!
//! Owns the ordered message history, builds the bounded-context prompt sent to
//! the reasoning service, and enforces that at most one request is in flight.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::error::ServiceError;
use crate::records::{Record, RecordBatch};

/// Number of trailing messages resent with each request
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;

/// Bot text appended when the reasoning service cannot be reached
pub const CONNECTION_ERROR_TEXT: &str = "Error connecting to server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Bot,
}

impl Role {
  /// Speaker name used in the outbound prompt
  pub fn speaker(&self) -> &'static str {
    match self {
      Role::User => "User",
      Role::Bot => "Assistant",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.speaker())
  }
}

#[derive(Debug, Clone)]
pub struct Message {
  pub id: Uuid,
  pub role: Role,
  pub text: String,
  pub records: Option<RecordBatch>,
  pub created_at: DateTime<Utc>,
}

impl Message {
  pub fn user(text: &str) -> Self {
    Self::new(Role::User, text, None)
  }

  pub fn bot(text: &str, records: Option<RecordBatch>) -> Self {
    Self::new(Role::Bot, text, records)
  }

  fn new(role: Role, text: &str, records: Option<RecordBatch>) -> Self {
    Self { id: Uuid::new_v4(), role, text: text.to_string(), records, created_at: Utc::now() }
  }

  pub fn has_data(&self) -> bool {
    self.records.is_some()
  }
}

/// Reply body returned by the reasoning service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceReply {
  pub reply: String,

  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Vec<Record>>,
}

impl ServiceReply {
  pub fn text(reply: &str) -> Self {
    Self { reply: reply.to_string(), kind: Some("text".to_string()), data: None }
  }

  pub fn with_data(reply: &str, data: Vec<Record>) -> Self {
    Self { reply: reply.to_string(), kind: Some("data".to_string()), data: Some(data) }
  }

  /// Records are only honoured for `"data"` replies, and an empty list is no data
  pub fn into_message(self) -> Message {
    let records = match self.kind.as_deref() {
      Some("data") => self.data.and_then(RecordBatch::new),
      _ => None,
    };
    Message::bot(&self.reply, records)
  }
}

/// The remote question-answering service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReasoningService: Send + Sync {
  async fn ask(&self, prompt: &str) -> Result<ServiceReply, ServiceError>;
}

/// Why a submission was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  EmptyInput,
  RequestInFlight,
}

/// Result of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
  Rejected(Rejection),
  Replied(Uuid),
  Failed(Uuid),
}

#[derive(Debug, Clone)]
pub struct Conversation {
  messages: Vec<Message>,
  sending: bool,
  context_window: usize,
}

impl Default for Conversation {
  fn default() -> Self {
    Self::new()
  }
}

impl Conversation {
  pub fn new() -> Self {
    Self::with_context_window(DEFAULT_CONTEXT_WINDOW)
  }

  pub fn with_context_window(context_window: usize) -> Self {
    Self { messages: Vec::new(), sending: false, context_window: context_window.max(1) }
  }

  pub fn messages(&self) -> &[Message] {
    &self.messages
  }

  pub fn last(&self) -> Option<&Message> {
    self.messages.last()
  }

  pub fn get(&self, id: Uuid) -> Option<&Message> {
    self.messages.iter().find(|m| m.id == id)
  }

  pub fn len(&self) -> usize {
    self.messages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }

  pub fn is_sending(&self) -> bool {
    self.sending
  }

  pub fn context_window(&self) -> usize {
    self.context_window
  }

  /// Drop all history and any in-flight state
  pub fn reset(&mut self) {
    self.messages.clear();
    self.sending = false;
  }

  pub fn append(&mut self, message: Message) {
    self.messages.push(message);
  }

  /// Build the prompt for `new_user_text` as if it had just been appended.
  ///
  /// The trailing window counts the new message, so only `context_window - 1`
  /// earlier messages are included.
  pub fn build_outbound_prompt(&self, new_user_text: &str) -> String {
    let earlier = self.context_window - 1;
    let skip = self.messages.len().saturating_sub(earlier);

    let history = self.messages[skip..]
      .iter()
      .map(|m| (m.role, m.text.as_str()))
      .chain(std::iter::once((Role::User, new_user_text)))
      .map(|(role, text)| format!("{}: {}", role.speaker(), text))
      .collect::<Vec<_>>()
      .join("\n");

    format!("PREVIOUS CONVERSATION:\n{history}\n\nCURRENT REQUEST: {new_user_text}")
  }

  /// Move to `sending` and record the user message.
  ///
  /// Returns the outbound prompt, or why nothing was sent.
  pub fn begin_submit(&mut self, text: &str) -> Result<String, Rejection> {
    if text.trim().is_empty() {
      return Err(Rejection::EmptyInput);
    }
    if self.sending {
      return Err(Rejection::RequestInFlight);
    }

    let prompt = self.build_outbound_prompt(text);
    self.append(Message::user(text));
    self.sending = true;
    Ok(prompt)
  }

  /// Append the bot reply and return to idle
  pub fn receive_reply(&mut self, reply: ServiceReply) -> Uuid {
    let message = reply.into_message();
    let id = message.id;
    self.append(message);
    self.sending = false;
    id
  }

  /// Append the fixed connection error and return to idle
  pub fn receive_failure(&mut self) -> Uuid {
    let message = Message::bot(CONNECTION_ERROR_TEXT, None);
    let id = message.id;
    self.append(message);
    self.sending = false;
    id
  }

  /// Send `text` to the service and record the outcome.
  ///
  /// The `sending` flag is cleared on every exit path, including when this
  /// future is dropped mid-request.
  pub async fn submit(&mut self, service: &dyn ReasoningService, text: &str) -> SubmitOutcome {
    let prompt = match self.begin_submit(text) {
      Ok(prompt) => prompt,
      Err(rejection) => {
        tracing::debug!(?rejection, "submission rejected");
        return SubmitOutcome::Rejected(rejection);
      }
    };

    tracing::debug!(prompt_bytes = prompt.len(), "sending prompt");
    let in_flight = InFlight { conversation: self };

    match service.ask(&prompt).await {
      Ok(reply) => SubmitOutcome::Replied(in_flight.conversation.receive_reply(reply)),
      Err(e) => {
        tracing::warn!(error = %e, "reasoning service request failed");
        SubmitOutcome::Failed(in_flight.conversation.receive_failure())
      }
    }
  }
}

struct InFlight<'a> {
  conversation: &'a mut Conversation,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.conversation.sending = false;
  }
}
