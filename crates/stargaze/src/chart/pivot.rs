use std::collections::{BTreeMap, HashMap};

use super::{
  Archetype, AxisValue, ChartData, ChartSpec, Matrix, Presentation, Series, BASE_HEIGHT,
  EXPANDED_HEIGHT, TALL_AXIS_THRESHOLD, TALL_HEIGHT,
};
use crate::error::ChartError;
use crate::records::{classify, RecordBatch, ShapeClassification};

/// Pivot a batch into the chart a given archetype needs.
///
/// Heatmaps require at most one record per (measure, entity) pair; a batch
/// that breaks this is rejected with [`ChartError::DuplicateCell`].
pub fn pivot(
  batch: &RecordBatch,
  archetype: Archetype,
  presentation: Presentation,
) -> Result<ChartSpec, ChartError> {
  let data = match archetype {
    Archetype::Line => ChartData::Series { series: trend_series(batch) },
    Archetype::Bar => ChartData::Series { series: comparison_series(batch) },
    Archetype::Heatmap => ChartData::Matrix(heatmap_matrix(batch)?),
    Archetype::Pie => ChartData::Series { series: vec![star_distribution(batch)] },
  };

  Ok(ChartSpec {
    archetype,
    title: archetype.title().to_string(),
    height: chart_height(&classify(batch), presentation),
    data,
  })
}

/// Height follows the data: wide axes get more room, expanded view gets the most
pub fn chart_height(shape: &ShapeClassification, presentation: Presentation) -> u32 {
  if presentation == Presentation::Expanded {
    return EXPANDED_HEIGHT;
  }

  if shape.distinct_entities > TALL_AXIS_THRESHOLD || shape.distinct_measures > TALL_AXIS_THRESHOLD
  {
    TALL_HEIGHT
  } else {
    BASE_HEIGHT
  }
}

fn trend_series(batch: &RecordBatch) -> Vec<Series> {
  batch
    .entities()
    .into_iter()
    .map(|entity| {
      let (x, y) = batch.for_entity(entity).map(|r| (AxisValue::Year(r.year), r.value)).unzip();
      Series { label: entity.to_string(), x, y }
    })
    .collect()
}

fn comparison_series(batch: &RecordBatch) -> Vec<Series> {
  batch
    .entities()
    .into_iter()
    .map(|entity| {
      let (x, y) =
        batch.for_entity(entity).map(|r| (AxisValue::Label(r.measure.clone()), r.value)).unzip();
      Series { label: entity.to_string(), x, y }
    })
    .collect()
}

fn heatmap_matrix(batch: &RecordBatch) -> Result<Matrix, ChartError> {
  let mut cells: HashMap<(&str, &str), Option<f64>> = HashMap::new();
  for record in batch.iter() {
    let key = (record.measure.as_str(), record.entity.as_str());
    if cells.insert(key, record.value).is_some() {
      return Err(ChartError::DuplicateCell {
        measure: record.measure.clone(),
        entity: record.entity.clone(),
      });
    }
  }

  let entities = batch.entities();
  let measures = batch.measures();

  let z = measures
    .iter()
    .map(|measure| {
      entities.iter().map(|entity| cells.get(&(*measure, *entity)).copied().flatten()).collect()
    })
    .collect();

  Ok(Matrix {
    x: entities.into_iter().map(String::from).collect(),
    y: measures.into_iter().map(String::from).collect(),
    z,
  })
}

fn star_distribution(batch: &RecordBatch) -> Series {
  let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
  for value in batch.iter().filter_map(|r| r.value) {
    *buckets.entry(round_to_star(value)).or_insert(0) += 1;
  }

  let (x, y) = buckets
    .into_iter()
    .map(|(stars, count)| (AxisValue::Label(format!("{stars} Stars")), Some(count as f64)))
    .unzip();

  Series { label: "Stars".to_string(), x, y }
}

// Halves round up, so 3.5 lands in the 4-star bucket.
fn round_to_star(value: f64) -> i64 {
  (value + 0.5).floor() as i64
}
