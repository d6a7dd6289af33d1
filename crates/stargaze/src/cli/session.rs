//! Interactive chat session
//!
//! Glues the conversation, the per-message views and the typewriter together
//! for the terminal. Slash commands act on the latest reply that carried
//! records.

use anyhow::Result;
use colored::*;
use console::Term;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chart::{Archetype, RenderRequest};
use crate::cli::display::{help_text, history_line, render_chart, speaker_tag};
use crate::config::Config;
use crate::conversation::{Conversation, Message, ReasoningService, Rejection, SubmitOutcome};
use crate::log;
use crate::reveal::RevealScheduler;
use crate::view::{MessageView, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
  View,
  Chart(Option<Archetype>),
  Expand,
  Export(PathBuf),
  History,
  Reset,
  Help,
  Quit,
}

impl SlashCommand {
  /// Parse a `/command`. Returns `Ok(None)` for lines that are not commands.
  pub fn parse(line: &str) -> Result<Option<Self>, String> {
    let Some(rest) = line.trim().strip_prefix('/') else {
      return Ok(None);
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    let command = match (name.as_str(), arg) {
      ("view", None) => SlashCommand::View,
      ("chart", Some("auto")) => SlashCommand::Chart(None),
      ("chart", Some(kind)) => SlashCommand::Chart(Some(kind.parse()?)),
      ("chart", None) => return Err("usage: /chart <bar|line|heatmap|pie|auto>".to_string()),
      ("expand", None) => SlashCommand::Expand,
      ("export", Some(path)) => SlashCommand::Export(PathBuf::from(path)),
      ("export", None) => return Err("usage: /export <path>".to_string()),
      ("history", None) => SlashCommand::History,
      ("reset", None) => SlashCommand::Reset,
      ("help", None) => SlashCommand::Help,
      ("quit" | "exit", None) => SlashCommand::Quit,
      _ => return Err(format!("unknown command '/{rest}' (try /help)")),
    };

    Ok(Some(command))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

pub struct ChatSession {
  conversation: Conversation,
  service: Box<dyn ReasoningService>,
  reveals: RevealScheduler,
  views: HashMap<Uuid, MessageView>,
  greeting: String,
  context_window: usize,
}

impl ChatSession {
  pub fn new(config: &Config, service: Box<dyn ReasoningService>) -> Self {
    Self {
      conversation: Conversation::with_context_window(config.context_window),
      service,
      reveals: RevealScheduler::new(config.reveal_config()),
      views: HashMap::new(),
      greeting: config.greeting.clone(),
      context_window: config.context_window,
    }
  }

  pub fn conversation(&self) -> &Conversation {
    &self.conversation
  }

  pub fn view(&self, message: Uuid) -> Option<&MessageView> {
    self.views.get(&message)
  }

  /// Post the greeting as the first bot message
  pub async fn greet(&mut self) -> Result<()> {
    let message = Message::bot(&self.greeting, None);
    let id = message.id;
    self.conversation.append(message);
    self.reveal(id).await
  }

  /// Handle input lines until `/quit` or the sender closes.
  ///
  /// Lines that arrive while a reply is being fetched or revealed are
  /// discarded, not queued as the next question.
  pub async fn run(&mut self, lines: &mut mpsc::UnboundedReceiver<String>) -> Result<()> {
    loop {
      print!("{} ", ">".cyan().bold());
      std::io::stdout().flush()?;

      let Some(line) = lines.recv().await else {
        println!();
        return Ok(());
      };

      if self.handle_line(&line).await? == Flow::Quit {
        return Ok(());
      }

      let mut dropped = 0;
      while lines.try_recv().is_ok() {
        dropped += 1;
      }
      if dropped > 0 {
        log::warn(&format!("Ignored {dropped} line(s) typed while waiting for the answer"));
      }
    }
  }

  /// Handle one line of user input
  pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
    match SlashCommand::parse(line) {
      Ok(Some(command)) => self.apply(command).await,
      Ok(None) => {
        self.ask(line).await?;
        Ok(Flow::Continue)
      }
      Err(message) => {
        log::warn(&message);
        Ok(Flow::Continue)
      }
    }
  }

  /// Submit a question and reveal the reply. Returns the reply's id.
  pub async fn ask(&mut self, text: &str) -> Result<Option<Uuid>> {
    let term = Term::stderr();
    let thinking = term.is_term();
    if thinking {
      term.write_str(&format!("{}", "thinking...".dimmed()))?;
    }

    let outcome = self.conversation.submit(self.service.as_ref(), text).await;

    if thinking {
      term.clear_line()?;
    }

    let id = match outcome {
      SubmitOutcome::Rejected(Rejection::EmptyInput) => return Ok(None),
      SubmitOutcome::Rejected(Rejection::RequestInFlight) => {
        log::warn("Still waiting for the previous answer");
        return Ok(None);
      }
      SubmitOutcome::Replied(id) | SubmitOutcome::Failed(id) => id,
    };

    if let Some(batch) = self.conversation.get(id).and_then(|m| m.records.clone()) {
      self.views.insert(id, MessageView::new(batch));
    }

    self.reveal(id).await?;

    if let Some(view) = self.views.get(&id) {
      println!(
        "  {} {} records, {} chart ready (/view to switch)",
        "▤".cyan(),
        view.records().len(),
        view.archetype().to_string().cyan()
      );
    }

    Ok(Some(id))
  }

  async fn reveal(&mut self, id: Uuid) -> Result<()> {
    let Some(message) = self.conversation.get(id) else {
      return Ok(());
    };
    let role = message.role;
    let text = message.text.clone();

    let mut out = std::io::stdout();
    write!(out, "{} ", speaker_tag(role))?;
    out.flush()?;

    self.reveals.start(id, &text);
    let mut printed = 0;
    while let Some(prefix) = self.reveals.next(id).await {
      out.write_all(prefix[printed..].as_bytes())?;
      out.flush()?;
      printed = prefix.len();
    }
    writeln!(out)?;
    Ok(())
  }

  async fn apply(&mut self, command: SlashCommand) -> Result<Flow> {
    match command {
      SlashCommand::Quit => return Ok(Flow::Quit),
      SlashCommand::Help => println!("{}", help_text()),
      SlashCommand::History => {
        for (index, message) in self.conversation.messages().iter().enumerate() {
          println!("{}", history_line(index, message));
        }
      }
      SlashCommand::Reset => {
        self.reveals.cancel_all();
        self.views.clear();
        self.conversation = Conversation::with_context_window(self.context_window);
        log::info("Started a new conversation");
        self.greet().await?;
      }
      SlashCommand::View => self.with_latest_view(|view| {
        view.toggle_mode();
      })?,
      SlashCommand::Chart(Some(archetype)) => self.with_latest_view(|view| {
        view.set_archetype(archetype);
      })?,
      SlashCommand::Chart(None) => self.with_latest_view(MessageView::clear_override)?,
      SlashCommand::Expand => self.with_latest_view(|view| {
        view.toggle_expanded();
      })?,
      SlashCommand::Export(path) => self.export(path)?,
    }

    Ok(Flow::Continue)
  }

  /// Id of the most recent message that has a view
  pub fn latest_data_message(&self) -> Option<Uuid> {
    self.conversation.messages().iter().rev().map(|m| m.id).find(|id| self.views.contains_key(id))
  }

  fn with_latest_view(&mut self, change: impl FnOnce(&mut MessageView)) -> Result<()> {
    let Some(id) = self.latest_data_message() else {
      log::warn("No reply with data yet");
      return Ok(());
    };

    let text = self.conversation.get(id).map(|m| m.text.clone()).unwrap_or_default();
    if let Some(view) = self.views.get_mut(&id) {
      change(view);
      show(view, &text);
    }
    Ok(())
  }

  fn export(&mut self, path: PathBuf) -> Result<()> {
    let Some(view) = self.latest_data_message().and_then(|id| self.views.get_mut(&id)) else {
      log::warn("No reply with data yet");
      return Ok(());
    };

    match view.chart() {
      Ok(spec) => {
        let request = RenderRequest::from(spec.clone());
        std::fs::write(&path, serde_json::to_string_pretty(&request)?)?;
        log::success(&format!("Wrote {} chart to {}", request.spec.archetype, path.display()));
      }
      Err(e) => log::error(&e.to_string()),
    }
    Ok(())
  }
}

fn show(view: &mut MessageView, text: &str) {
  if view.shows_text() {
    println!("{} {}", "Report".bold(), text);
  }

  if view.shows_chart() {
    let label = match view.mode() {
      ViewMode::Visuals => "Visuals",
      ViewMode::Report => "Expanded",
    };
    let source = if view.is_overridden() { "chosen" } else { "inferred" };
    println!("{} {}", label.bold(), format!("({source})").dimmed());
    match view.chart() {
      Ok(spec) => print!("{}", render_chart(spec)),
      Err(e) => log::error(&e.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_plain_text_is_not_a_command() {
    assert_eq!(SlashCommand::parse("how is Humana doing?"), Ok(None));
  }

  #[test]
  fn test_parse_commands() {
    assert_eq!(SlashCommand::parse("/view"), Ok(Some(SlashCommand::View)));
    assert_eq!(
      SlashCommand::parse("/chart Pie"),
      Ok(Some(SlashCommand::Chart(Some(Archetype::Pie))))
    );
    assert_eq!(SlashCommand::parse("/chart auto"), Ok(Some(SlashCommand::Chart(None))));
    assert_eq!(
      SlashCommand::parse("  /export  out/chart.json "),
      Ok(Some(SlashCommand::Export(PathBuf::from("out/chart.json"))))
    );
    assert_eq!(SlashCommand::parse("/exit"), Ok(Some(SlashCommand::Quit)));
  }

  #[test]
  fn test_parse_errors() {
    assert!(SlashCommand::parse("/chart").is_err());
    assert!(SlashCommand::parse("/chart scatter").is_err());
    assert!(SlashCommand::parse("/export").is_err());
    assert!(SlashCommand::parse("/dance").is_err());
  }
}
