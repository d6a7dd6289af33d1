//! Console status lines and tracing setup
//!
//! User-facing status goes to stderr with a colored level prefix, so stdout
//! stays clean for replies and chart JSON. Library diagnostics go through
//! `tracing`.

use colored::*;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Install the tracing subscriber. `RUST_LOG` wins over the defaults.
pub fn init_tracing(verbose: bool) {
  let default = if verbose { "stargaze=debug,info" } else { "stargaze=info,warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  // A second init (tests, embedding) is harmless
  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .try_init();
}

fn format_prefix(color: Color, prefix: &str) -> String {
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = 7 - prefix.len() - 2)
}

fn log_with(color: Color, prefix: &str, message: &str) {
  let prefix = format_prefix(color, prefix);
  for line in message.lines() {
    eprintln!("{prefix} {line}");
  }
}

pub fn info(message: &str) {
  log_with(Color::Blue, "info", message);
}

pub fn warn(message: &str) {
  log_with(Color::Yellow, "warn", message);
}

pub fn error(message: &str) {
  log_with(Color::Red, "error", message);
}

pub fn success(message: &str) {
  log_with(Color::Green, "sccs", message);
}
