//! Typewriter-style reveal of bot text
//!
//! A [`Reveal`] owns one timer task that emits ever-longer prefixes of a text
//! and stops after the full text. Dropping a reveal aborts its task, so a
//! restarted or removed message never leaves a timer running.

use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
  pub chars_per_tick: usize,
  pub tick: Duration,
}

impl Default for RevealConfig {
  fn default() -> Self {
    Self { chars_per_tick: 1, tick: Duration::from_millis(5) }
  }
}

/// A running reveal. Yields prefixes of its text, one per tick.
///
/// At most one prefix waits in the channel; the timer pauses until the
/// consumer catches up.
#[derive(Debug)]
pub struct Reveal {
  prefixes: mpsc::Receiver<String>,
  task: JoinHandle<()>,
}

impl Reveal {
  /// Start revealing `text`. Must be called inside a tokio runtime.
  pub fn start(text: &str, config: RevealConfig) -> Self {
    let (tx, rx) = mpsc::channel(1);
    let task = tokio::spawn(drive(text.to_string(), config, tx));
    Self { prefixes: rx, task }
  }

  /// Wait for the next prefix; `None` once the full text has been emitted
  pub async fn next_prefix(&mut self) -> Option<String> {
    self.prefixes.recv().await
  }

  pub fn cancel(&mut self) {
    self.task.abort();
    self.prefixes.close();
  }

  /// Whether the timer task has stopped
  pub fn is_finished(&self) -> bool {
    self.task.is_finished()
  }
}

impl Drop for Reveal {
  fn drop(&mut self) {
    self.task.abort();
  }
}

impl Stream for Reveal {
  type Item = String;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
    self.get_mut().prefixes.poll_recv(cx)
  }
}

async fn drive(text: String, config: RevealConfig, tx: mpsc::Sender<String>) {
  let mut ticker = interval_at(Instant::now() + config.tick, config.tick);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  for end in stops(&text, config.chars_per_tick) {
    ticker.tick().await;
    if tx.send(text[..end].to_string()).await.is_err() {
      return;
    }
  }
}

/// Byte offsets where each emitted prefix ends. The last stop is always the
/// full text; an empty text has a single empty stop.
fn stops(text: &str, chars_per_tick: usize) -> Vec<usize> {
  let step = chars_per_tick.max(1);
  let ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();

  let mut stops: Vec<usize> = ends.into_iter().skip(step - 1).step_by(step).collect();
  if stops.last() != Some(&text.len()) {
    stops.push(text.len());
  }
  stops
}

/// Reveal state for one message; restarting discards the previous text
#[derive(Debug)]
pub struct Typewriter {
  config: RevealConfig,
  shown: String,
  reveal: Option<Reveal>,
}

impl Typewriter {
  pub fn new(config: RevealConfig) -> Self {
    Self { config, shown: String::new(), reveal: None }
  }

  /// Abandon any running reveal and start over from an empty prefix
  pub fn restart(&mut self, text: &str) {
    self.cancel();
    self.shown.clear();
    self.reveal = Some(Reveal::start(text, self.config));
  }

  /// Advance to the next prefix. Returns `None` when nothing is animating.
  pub async fn next(&mut self) -> Option<String> {
    let reveal = self.reveal.as_mut()?;
    match reveal.next_prefix().await {
      Some(prefix) => {
        self.shown.clone_from(&prefix);
        Some(prefix)
      }
      None => {
        self.reveal = None;
        None
      }
    }
  }

  /// Text revealed so far
  pub fn shown(&self) -> &str {
    &self.shown
  }

  pub fn is_animating(&self) -> bool {
    self.reveal.is_some()
  }

  pub fn cancel(&mut self) {
    if let Some(mut reveal) = self.reveal.take() {
      reveal.cancel();
    }
  }
}

/// One independent typewriter per message
#[derive(Debug, Default)]
pub struct RevealScheduler {
  config: RevealConfig,
  typewriters: HashMap<Uuid, Typewriter>,
}

impl RevealScheduler {
  pub fn new(config: RevealConfig) -> Self {
    Self { config, typewriters: HashMap::new() }
  }

  /// Start (or restart) the reveal of a message's text
  pub fn start(&mut self, message: Uuid, text: &str) {
    let config = self.config;
    self.typewriters.entry(message).or_insert_with(|| Typewriter::new(config)).restart(text);
  }

  /// Next prefix for a message; the typewriter stops once its text is complete
  pub async fn next(&mut self, message: Uuid) -> Option<String> {
    self.typewriters.get_mut(&message)?.next().await
  }

  pub fn shown(&self, message: Uuid) -> Option<&str> {
    self.typewriters.get(&message).map(Typewriter::shown)
  }

  /// Forget a message, cancelling its reveal if still running
  pub fn cancel(&mut self, message: Uuid) {
    if let Some(mut typewriter) = self.typewriters.remove(&message) {
      typewriter.cancel();
    }
  }

  pub fn cancel_all(&mut self) {
    for (_, mut typewriter) in self.typewriters.drain() {
      typewriter.cancel();
    }
  }

  /// Messages whose reveal has not finished yet
  pub fn active(&self) -> usize {
    self.typewriters.values().filter(|t| t.is_animating()).count()
  }
}
