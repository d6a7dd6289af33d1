//! Per-message presentation state
//!
//! A bot message with records can be read as prose or as a chart. The chart
//! archetype starts out inferred from the record shape and can be overridden;
//! the pivot is memoized and only recomputed when its inputs change.

use crate::chart::{infer_archetype, pivot, Archetype, ChartSpec, Presentation};
use crate::error::ChartError;
use crate::records::{classify, RecordBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
  /// Prose reply
  #[default]
  Report,
  /// Chart of the records
  Visuals,
}

#[derive(Debug, Clone)]
struct Memo {
  batch: RecordBatch,
  archetype: Archetype,
  presentation: Presentation,
  chart: Result<ChartSpec, ChartError>,
}

#[derive(Debug, Clone)]
pub struct MessageView {
  batch: RecordBatch,
  mode: ViewMode,
  inferred: Archetype,
  chosen: Option<Archetype>,
  presentation: Presentation,
  memo: Option<Memo>,
}

impl MessageView {
  pub fn new(batch: RecordBatch) -> Self {
    let inferred = infer_archetype(&classify(&batch));
    Self {
      batch,
      mode: ViewMode::default(),
      inferred,
      chosen: None,
      presentation: Presentation::default(),
      memo: None,
    }
  }

  pub fn records(&self) -> &RecordBatch {
    &self.batch
  }

  pub fn mode(&self) -> ViewMode {
    self.mode
  }

  pub fn toggle_mode(&mut self) -> ViewMode {
    self.mode = match self.mode {
      ViewMode::Report => ViewMode::Visuals,
      ViewMode::Visuals => ViewMode::Report,
    };
    self.mode
  }

  /// Archetype picked from the record shape
  pub fn inferred_archetype(&self) -> Archetype {
    self.inferred
  }

  /// Archetype currently in use
  pub fn archetype(&self) -> Archetype {
    self.chosen.unwrap_or(self.inferred)
  }

  /// Whether the user picked the archetype, even if it matches the inferred one
  pub fn is_overridden(&self) -> bool {
    self.chosen.is_some()
  }

  pub fn set_archetype(&mut self, archetype: Archetype) {
    self.chosen = Some(archetype);
  }

  /// Drop any override and go back to the inferred archetype
  pub fn clear_override(&mut self) {
    self.chosen = None;
  }

  pub fn presentation(&self) -> Presentation {
    self.presentation
  }

  pub fn toggle_expanded(&mut self) -> Presentation {
    self.presentation = self.presentation.toggled();
    self.presentation
  }

  /// Whether the chart should be on screen; expanded view always shows it
  pub fn shows_chart(&self) -> bool {
    self.mode == ViewMode::Visuals || self.presentation == Presentation::Expanded
  }

  /// Whether the prose should be on screen
  pub fn shows_text(&self) -> bool {
    self.mode == ViewMode::Report && self.presentation == Presentation::Inline
  }

  /// Chart for the current archetype and presentation
  pub fn chart(&mut self) -> Result<&ChartSpec, ChartError> {
    let memo = match self.memo.take() {
      Some(memo) if self.is_current(&memo) => memo,
      _ => {
        let archetype = self.archetype();
        tracing::debug!(%archetype, "pivoting records");
        Memo {
          batch: self.batch.clone(),
          archetype,
          presentation: self.presentation,
          chart: pivot(&self.batch, archetype, self.presentation),
        }
      }
    };

    let memo = self.memo.insert(memo);
    memo.chart.as_ref().map_err(Clone::clone)
  }

  fn is_current(&self, memo: &Memo) -> bool {
    memo.batch.same_batch(&self.batch)
      && memo.archetype == self.archetype()
      && memo.presentation == self.presentation
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chart::{BASE_HEIGHT, EXPANDED_HEIGHT};
  use crate::records::Record;

  fn trend_batch() -> RecordBatch {
    RecordBatch::new(vec![
      Record::new(2023, "Humana", "Overall", Some(4.0)),
      Record::new(2024, "Humana", "Overall", Some(4.5)),
    ])
    .unwrap()
  }

  #[test]
  fn test_view_starts_with_inferred_archetype_in_report_mode() {
    let view = MessageView::new(trend_batch());
    assert_eq!(view.archetype(), Archetype::Line);
    assert_eq!(view.mode(), ViewMode::Report);
    assert!(view.shows_text());
    assert!(!view.shows_chart());
    assert!(!view.is_overridden());
  }

  #[test]
  fn test_override_recomputes_chart() {
    let mut view = MessageView::new(trend_batch());
    assert_eq!(view.chart().unwrap().archetype, Archetype::Line);

    view.set_archetype(Archetype::Pie);
    assert!(view.is_overridden());
    assert_eq!(view.chart().unwrap().archetype, Archetype::Pie);

    view.clear_override();
    assert_eq!(view.chart().unwrap().archetype, Archetype::Line);
  }

  #[test]
  fn test_expanded_view_uses_expanded_height_and_hides_text() {
    let mut view = MessageView::new(trend_batch());
    assert_eq!(view.chart().unwrap().height, BASE_HEIGHT);

    view.toggle_expanded();
    assert_eq!(view.chart().unwrap().height, EXPANDED_HEIGHT);
    assert!(view.shows_chart());
    assert!(!view.shows_text());
  }

  #[test]
  fn test_picking_the_inferred_archetype_counts_as_override() {
    let mut view = MessageView::new(trend_batch());
    view.set_archetype(Archetype::Line);
    assert_eq!(view.archetype(), view.inferred_archetype());
    assert!(view.is_overridden());

    view.clear_override();
    assert!(!view.is_overridden());
  }

  #[test]
  fn test_duplicate_cells_surface_as_chart_error() {
    let mut view = MessageView::new(trend_batch());
    view.set_archetype(Archetype::Heatmap);
    assert!(matches!(view.chart(), Err(ChartError::DuplicateCell { .. })));
  }
}
