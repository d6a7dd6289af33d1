//! Rating records and their shape
//!
//! A record is one observed fact: a plan (entity) scored on a quality measure
//! in a given year. Records arrive in batches attached to bot replies; a batch
//! is immutable and never empty, so "no data" is always `None`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

/// One observational fact returned by the reasoning service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub year: i32,

  /// Plan or company name
  #[serde(alias = "marketing_name")]
  pub entity: String,

  /// Metric name
  #[serde(alias = "measure_name")]
  pub measure: String,

  /// Rating, absent when the source had no score
  #[serde(default, alias = "star_rating_numeric")]
  pub value: Option<f64>,
}

impl Record {
  pub fn new(year: i32, entity: &str, measure: &str, value: Option<f64>) -> Self {
    Self { year, entity: entity.to_string(), measure: measure.to_string(), value }
  }
}

/// Immutable, shared, non-empty batch of records owned by one message
#[derive(Debug, Clone)]
pub struct RecordBatch {
  records: Arc<[Record]>,
}

impl RecordBatch {
  /// Wrap records into a batch. Returns `None` for an empty input.
  pub fn new(records: Vec<Record>) -> Option<Self> {
    if records.is_empty() {
      return None;
    }
    Some(Self { records: records.into() })
  }

  /// Whether two handles point at the same batch allocation
  pub fn same_batch(&self, other: &RecordBatch) -> bool {
    Arc::ptr_eq(&self.records, &other.records)
  }

  /// Distinct entities in first-occurrence order
  pub fn entities(&self) -> Vec<&str> {
    distinct_in_order(self.records.iter().map(|r| r.entity.as_str()))
  }

  /// Distinct measures in first-occurrence order
  pub fn measures(&self) -> Vec<&str> {
    distinct_in_order(self.records.iter().map(|r| r.measure.as_str()))
  }

  /// Distinct years in first-occurrence order
  pub fn years(&self) -> Vec<i32> {
    distinct_in_order(self.records.iter().map(|r| r.year))
  }

  /// Records belonging to one entity, in batch order
  pub fn for_entity<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
    self.records.iter().filter(move |r| r.entity == entity)
  }
}

impl Deref for RecordBatch {
  type Target = [Record];

  fn deref(&self) -> &[Record] {
    &self.records
  }
}

impl PartialEq for RecordBatch {
  fn eq(&self, other: &Self) -> bool {
    self.records == other.records
  }
}

fn distinct_in_order<T: Eq + Hash + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
  let mut seen = HashSet::new();
  values.filter(|value| seen.insert(*value)).collect()
}

/// Dimensional cardinality of a record batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeClassification {
  pub distinct_years: usize,
  pub distinct_entities: usize,
  pub distinct_measures: usize,
}

/// Count distinct years, entities and measures in a batch
pub fn classify(batch: &RecordBatch) -> ShapeClassification {
  let mut years = HashSet::new();
  let mut entities = HashSet::new();
  let mut measures = HashSet::new();

  for record in batch.iter() {
    years.insert(record.year);
    entities.insert(record.entity.as_str());
    measures.insert(record.measure.as_str());
  }

  ShapeClassification {
    distinct_years: years.len(),
    distinct_entities: entities.len(),
    distinct_measures: measures.len(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn batch(records: Vec<Record>) -> RecordBatch {
    RecordBatch::new(records).unwrap()
  }

  #[test]
  fn test_empty_batch_is_no_data() {
    assert!(RecordBatch::new(Vec::new()).is_none());
  }

  #[test]
  fn test_classify_counts_distinct_dimensions() {
    let batch = batch(vec![
      Record::new(2023, "Humana", "Diabetes Care", Some(4.0)),
      Record::new(2024, "Humana", "Diabetes Care", Some(4.5)),
      Record::new(2024, "Aetna", "Diabetes Care", Some(3.0)),
      Record::new(2024, "Aetna", "Flu Vaccine", None),
    ]);

    let shape = classify(&batch);
    assert_eq!(shape.distinct_years, 2);
    assert_eq!(shape.distinct_entities, 2);
    assert_eq!(shape.distinct_measures, 2);
  }

  #[test]
  fn test_distinct_values_keep_first_occurrence_order() {
    let batch = batch(vec![
      Record::new(2024, "CVS", "B", Some(1.0)),
      Record::new(2022, "Humana", "A", Some(2.0)),
      Record::new(2024, "CVS", "A", Some(3.0)),
    ]);

    assert_eq!(batch.entities(), vec!["CVS", "Humana"]);
    assert_eq!(batch.measures(), vec!["B", "A"]);
    assert_eq!(batch.years(), vec![2024, 2022]);
  }

  #[test]
  fn test_record_accepts_dataset_column_names() {
    let json = r#"[
      {"year": 2024, "marketing_name": "Humana", "measure_name": "Breast Cancer Screening", "star_rating_numeric": 4.0},
      {"year": 2024, "entity": "CVS", "measure": "Breast Cancer Screening"}
    ]"#;

    let records: Vec<Record> = serde_json::from_str(json).unwrap();
    assert_eq!(records[0].entity, "Humana");
    assert_eq!(records[0].measure, "Breast Cancer Screening");
    assert_eq!(records[0].value, Some(4.0));
    assert_eq!(records[1].value, None);
  }

  #[test]
  fn test_same_batch_tracks_allocation_identity() {
    let first = batch(vec![Record::new(2024, "A", "M", Some(1.0))]);
    let shared = first.clone();
    let copy = batch(vec![Record::new(2024, "A", "M", Some(1.0))]);

    assert!(first.same_batch(&shared));
    assert!(!first.same_batch(&copy));
    assert_eq!(first, copy);
  }
}
