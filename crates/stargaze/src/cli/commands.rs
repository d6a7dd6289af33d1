use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tokio::sync::mpsc;

use crate::chart::{infer_archetype, pivot, Archetype, Presentation, RenderRequest};
use crate::cli::display::render_chart;
use crate::cli::session::ChatSession;
use crate::client::{ChatClient, ClientConfig};
use crate::config::Config;
use crate::conversation::{Conversation, SubmitOutcome};
use crate::log;
use crate::records::{classify, Record, RecordBatch};
use crate::reveal::Typewriter;
use crate::view::MessageView;

fn client_for(config: &Config) -> Result<ChatClient> {
  ChatClient::with_config(ClientConfig::from(config)).context("Failed to create HTTP client")
}

/// Run the interactive chat until EOF or `/quit`
pub async fn chat(config: &Config) -> Result<()> {
  let client = client_for(config)?;
  log::info(&format!("Connected to reasoning service at {}", client.base_url()));

  let mut session = ChatSession::new(config, Box::new(client));
  session.greet().await?;

  let (tx, mut lines) = mpsc::unbounded_channel();
  std::thread::spawn(move || {
    for line in std::io::stdin().lock().lines() {
      let Ok(line) = line else { break };
      if tx.send(line).is_err() {
        break;
      }
    }
  });

  session.run(&mut lines).await
}

/// Ask a single question and print the reply
pub async fn ask(config: &Config, question: &str) -> Result<()> {
  let client = client_for(config)?;
  let mut conversation = Conversation::with_context_window(config.context_window);

  let id = match conversation.submit(&client, question).await {
    SubmitOutcome::Replied(id) => id,
    SubmitOutcome::Failed(id) => {
      let text = conversation.get(id).map(|m| m.text.clone()).unwrap_or_default();
      log::error(&text);
      return Err(anyhow!("No answer from {}", client.base_url()));
    }
    SubmitOutcome::Rejected(_) => return Err(anyhow!("Question must not be empty")),
  };

  let message = conversation.get(id).ok_or_else(|| anyhow!("Reply missing from conversation"))?;

  let mut typewriter = Typewriter::new(config.reveal_config());
  typewriter.restart(&message.text);
  let mut out = std::io::stdout();
  let mut printed = 0;
  while let Some(prefix) = typewriter.next().await {
    out.write_all(prefix[printed..].as_bytes())?;
    out.flush()?;
    printed = prefix.len();
  }
  writeln!(out)?;

  if let Some(batch) = message.records.clone() {
    let mut view = MessageView::new(batch);
    match view.chart() {
      Ok(spec) => print!("\n{}", render_chart(spec)),
      Err(e) => log::error(&e.to_string()),
    }
  }

  Ok(())
}

/// Pivot a JSON record file offline and print the renderer request
pub fn chart(file: &Path, archetype: Option<Archetype>, expanded: bool) -> Result<()> {
  let content = std::fs::read_to_string(file)
    .with_context(|| format!("Failed to read records from {}", file.display()))?;
  let records: Vec<Record> = serde_json::from_str(&content)
    .with_context(|| format!("Failed to parse records in {}", file.display()))?;

  let batch = RecordBatch::new(records).ok_or_else(|| anyhow!("No records in {}", file.display()))?;

  let archetype = archetype.unwrap_or_else(|| infer_archetype(&classify(&batch)));
  let presentation = if expanded { Presentation::Expanded } else { Presentation::Inline };

  let spec = pivot(&batch, archetype, presentation)?;
  println!("{}", serde_json::to_string_pretty(&RenderRequest::from(spec))?);
  Ok(())
}
