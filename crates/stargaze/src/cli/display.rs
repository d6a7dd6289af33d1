//! Display formatting utilities for CLI output

use chrono::Local;
use colored::*;

use crate::chart::{ChartData, ChartSpec, Matrix, Series};
use crate::conversation::{Message, Role};

/// Render a chart as a compact text summary
pub fn render_chart(spec: &ChartSpec) -> String {
  let mut out = format!(
    "{} {} ({}, {}px)\n",
    "▤".cyan(),
    spec.title.bold(),
    spec.archetype.to_string().cyan(),
    spec.height
  );

  match &spec.data {
    ChartData::Series { series } => {
      for s in series {
        out.push_str(&render_series(s));
      }
    }
    ChartData::Matrix(matrix) => out.push_str(&render_matrix(matrix)),
  }

  out
}

fn render_series(series: &Series) -> String {
  let points = series
    .x
    .iter()
    .zip(&series.y)
    .map(|(x, y)| format!("{}={}", x, format_value(*y)))
    .collect::<Vec<_>>()
    .join(", ");

  format!("  {}: {}\n", series.label.blue(), points)
}

fn render_matrix(matrix: &Matrix) -> String {
  let label_width = matrix.y.iter().map(|y| y.chars().count()).max().unwrap_or(0);
  let column_widths: Vec<usize> = matrix.x.iter().map(|x| x.chars().count().max(4)).collect();

  let mut out = format!("  {:label_width$}", "");
  for (x, width) in matrix.x.iter().zip(&column_widths) {
    out.push_str(&format!(" | {x:>width$}"));
  }
  out.push('\n');

  for y in &matrix.y {
    out.push_str(&format!("  {y:label_width$}"));
    for (x, width) in matrix.x.iter().zip(&column_widths) {
      out.push_str(&format!(" | {:>width$}", format_value(matrix.cell(y, x).flatten())));
    }
    out.push('\n');
  }

  out
}

/// Gaps print as `-` so they never read as a zero rating
pub fn format_value(value: Option<f64>) -> String {
  match value {
    Some(v) => format!("{v:.2}").trim_end_matches('0').trim_end_matches('.').to_string(),
    None => "-".to_string(),
  }
}

/// Speaker tag shown before a message
pub fn speaker_tag(role: Role) -> ColoredString {
  match role {
    Role::User => "You".green().bold(),
    Role::Bot => "Medicare AI".magenta().bold(),
  }
}

/// One-line history entry, stamped with the local time it was sent
pub fn history_line(index: usize, message: &Message) -> String {
  let data = match &message.records {
    Some(batch) => format!(" {}", format!("[{} records]", batch.len()).dimmed()),
    None => String::new(),
  };
  let sent = message.created_at.with_timezone(&Local).format("%H:%M");
  format!(
    "{:>3}. {} {} {}{}",
    index + 1,
    sent.to_string().dimmed(),
    speaker_tag(message.role),
    message.text.replace('\n', " "),
    data
  )
}

pub fn help_text() -> String {
  [
    "Commands (act on the latest reply with data):",
    "  /view                          toggle report / visuals",
    "  /chart <bar|line|heatmap|pie>  override the chart type",
    "  /chart auto                    go back to the inferred chart type",
    "  /expand                        toggle expanded chart view",
    "  /export <path>                 write the chart for the renderer as JSON",
    "  /history                       show the whole conversation",
    "  /reset                         start a new conversation",
    "  /help                          show this help",
    "  /quit                          leave",
  ]
  .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chart::{Archetype, AxisValue};
  use crate::records::{Record, RecordBatch};
  use chrono::{TimeZone, Utc};

  #[test]
  fn test_format_value_marks_gaps() {
    assert_eq!(format_value(None), "-");
    assert_eq!(format_value(Some(0.0)), "0");
    assert_eq!(format_value(Some(4.5)), "4.5");
    assert_eq!(format_value(Some(3.25)), "3.25");
    assert_eq!(format_value(Some(12.0)), "12");
  }

  #[test]
  fn test_format_value_rounding_to_whole_drops_dot() {
    assert_eq!(format_value(Some(4.999)), "5");
    assert_eq!(format_value(Some(0.001)), "0");
    assert_eq!(format_value(Some(10.004)), "10");
  }

  #[test]
  fn test_history_line_shows_send_time_and_records() {
    colored::control::set_override(false);
    let mut message = Message::bot(
      "Humana leads",
      RecordBatch::new(vec![Record::new(2024, "Humana", "Overall", Some(4.5))]),
    );
    message.created_at = Utc.with_ymd_and_hms(2024, 10, 1, 14, 5, 0).unwrap();
    let expected_time = message.created_at.with_timezone(&Local).format("%H:%M").to_string();

    assert_eq!(
      history_line(1, &message),
      format!("  2. {expected_time} Medicare AI Humana leads [1 records]")
    );
  }

  #[test]
  fn test_render_matrix_shows_gap_cells() {
    colored::control::set_override(false);
    let spec = ChartSpec {
      archetype: Archetype::Heatmap,
      title: "Heatmap Overview".to_string(),
      height: 400,
      data: ChartData::Matrix(Matrix {
        x: vec!["A".to_string(), "B".to_string()],
        y: vec!["M1".to_string(), "M2".to_string()],
        z: vec![vec![Some(4.0), Some(3.0)], vec![Some(5.0), None]],
      }),
    };

    let rendered = render_chart(&spec);

    assert!(rendered.contains("Heatmap Overview (heatmap, 400px)"));
    assert!(rendered.contains("  M2 |    5 |    -"));
  }

  #[test]
  fn test_render_series_lists_points() {
    colored::control::set_override(false);
    let spec = ChartSpec {
      archetype: Archetype::Line,
      title: "Performance Trend".to_string(),
      height: 400,
      data: ChartData::Series {
        series: vec![Series {
          label: "Humana".to_string(),
          x: vec![AxisValue::Year(2023), AxisValue::Year(2024)],
          y: vec![Some(4.0), None],
        }],
      },
    };

    let rendered = render_chart(&spec);

    assert!(rendered.contains("Humana: 2023=4, 2024=-"));
  }
}
