use super::Archetype;
use crate::records::ShapeClassification;

/// Pick the default chart for a record shape.
///
/// Temporal spread wins over everything else; wide grids become heatmaps;
/// the rest are grouped bars. `Pie` is only reachable through an override.
pub fn infer_archetype(shape: &ShapeClassification) -> Archetype {
  let archetype = if shape.distinct_years > 1 {
    Archetype::Line
  } else if shape.distinct_entities > 2 && shape.distinct_measures > 2 {
    Archetype::Heatmap
  } else {
    Archetype::Bar
  };

  tracing::debug!(
    years = shape.distinct_years,
    entities = shape.distinct_entities,
    measures = shape.distinct_measures,
    %archetype,
    "inferred chart archetype"
  );

  archetype
}

#[cfg(test)]
mod tests {
  use super::*;

  fn shape(years: usize, entities: usize, measures: usize) -> ShapeClassification {
    ShapeClassification {
      distinct_years: years,
      distinct_entities: entities,
      distinct_measures: measures,
    }
  }

  #[test]
  fn test_multiple_years_always_trend() {
    for entities in 1..15 {
      for measures in 1..15 {
        assert_eq!(infer_archetype(&shape(2, entities, measures)), Archetype::Line);
        assert_eq!(infer_archetype(&shape(7, entities, measures)), Archetype::Line);
      }
    }
  }

  #[test]
  fn test_wide_single_year_is_heatmap() {
    for years in 0..=1 {
      for entities in 3..15 {
        for measures in 3..15 {
          assert_eq!(infer_archetype(&shape(years, entities, measures)), Archetype::Heatmap);
        }
      }
    }
  }

  #[test]
  fn test_narrow_single_year_is_bar() {
    assert_eq!(infer_archetype(&shape(1, 2, 20)), Archetype::Bar);
    assert_eq!(infer_archetype(&shape(1, 20, 2)), Archetype::Bar);
    assert_eq!(infer_archetype(&shape(1, 1, 1)), Archetype::Bar);
    assert_eq!(infer_archetype(&shape(1, 3, 1)), Archetype::Bar);
  }

  #[test]
  fn test_pie_is_never_inferred() {
    for years in 0..5 {
      for entities in 0..15 {
        for measures in 0..15 {
          assert_ne!(infer_archetype(&shape(years, entities, measures)), Archetype::Pie);
        }
      }
    }
  }
}
