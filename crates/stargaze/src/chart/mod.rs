//! Adaptive chart engine
//!
//! Picks a chart archetype from the shape of a record batch and pivots the
//! records into the arrays that archetype needs. Everything here is pure: a
//! chart can be recomputed on every render without coordination.

mod infer;
mod pivot;

pub use infer::infer_archetype;
pub use pivot::{chart_height, pivot};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BASE_HEIGHT: u32 = 400;
pub const TALL_HEIGHT: u32 = 550;
pub const EXPANDED_HEIGHT: u32 = 600;

/// Axis cardinality above which the chart switches to the tall height
pub const TALL_AXIS_THRESHOLD: usize = 10;

/// The four supported chart shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
  /// Trend over years, one line per entity
  Line,
  /// Grouped bars, one group per measure
  Bar,
  /// Measure x entity grid
  Heatmap,
  /// Distribution of star buckets
  Pie,
}

impl Archetype {
  pub const ALL: [Archetype; 4] =
    [Archetype::Bar, Archetype::Line, Archetype::Heatmap, Archetype::Pie];

  pub fn as_str(&self) -> &'static str {
    match self {
      Archetype::Line => "line",
      Archetype::Bar => "bar",
      Archetype::Heatmap => "heatmap",
      Archetype::Pie => "pie",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      Archetype::Line => "Performance Trend",
      Archetype::Bar => "Rating Comparison",
      Archetype::Heatmap => "Heatmap Overview",
      Archetype::Pie => "Rating Distribution",
    }
  }
}

impl fmt::Display for Archetype {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Archetype {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "line" => Ok(Archetype::Line),
      "bar" => Ok(Archetype::Bar),
      "heatmap" => Ok(Archetype::Heatmap),
      "pie" => Ok(Archetype::Pie),
      other => Err(format!("unknown chart type '{other}' (expected bar, line, heatmap or pie)")),
    }
  }
}

/// How the consumer is presenting the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
  #[default]
  Inline,
  Expanded,
}

impl Presentation {
  pub fn toggled(self) -> Self {
    match self {
      Presentation::Inline => Presentation::Expanded,
      Presentation::Expanded => Presentation::Inline,
    }
  }
}

/// An x-axis position: a year for trends, a name everywhere else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
  Year(i32),
  Label(String),
}

impl fmt::Display for AxisValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AxisValue::Year(year) => write!(f, "{year}"),
      AxisValue::Label(label) => f.write_str(label),
    }
  }
}

/// One named series of points; `None` y-values are gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
  pub label: String,
  pub x: Vec<AxisValue>,
  pub y: Vec<Option<f64>>,
}

/// Grid of values indexed `z[row][column]`, rows are `y`, columns are `x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
  pub x: Vec<String>,
  pub y: Vec<String>,
  pub z: Vec<Vec<Option<f64>>>,
}

impl Matrix {
  /// Value at a named row and column; `Some(None)` is a gap
  pub fn cell(&self, row: &str, column: &str) -> Option<Option<f64>> {
    let r = self.y.iter().position(|y| y == row)?;
    let c = self.x.iter().position(|x| x == column)?;
    Some(self.z[r][c])
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
  Series { series: Vec<Series> },
  Matrix(Matrix),
}

/// Declarative chart handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
  pub archetype: Archetype,
  pub title: String,
  pub height: u32,
  pub data: ChartData,
}

impl ChartSpec {
  pub fn series(&self) -> &[Series] {
    match &self.data {
      ChartData::Series { series } => series,
      ChartData::Matrix(_) => &[],
    }
  }

  pub fn matrix(&self) -> Option<&Matrix> {
    match &self.data {
      ChartData::Matrix(matrix) => Some(matrix),
      ChartData::Series { .. } => None,
    }
  }
}

/// Fixed renderer options: interactive toolbar with image export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
  pub display_mode_bar: bool,
  pub responsive: bool,
  pub display_logo: bool,
  pub image_export: bool,
}

impl Default for RendererConfig {
  fn default() -> Self {
    Self { display_mode_bar: true, responsive: true, display_logo: false, image_export: true }
  }
}

/// Everything the external renderer consumes for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
  pub spec: ChartSpec,
  pub config: RendererConfig,
}

impl From<ChartSpec> for RenderRequest {
  fn from(spec: ChartSpec) -> Self {
    Self { spec, config: RendererConfig::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_archetype_parses_case_insensitively() {
    assert_eq!("Heatmap".parse::<Archetype>(), Ok(Archetype::Heatmap));
    assert_eq!(" pie ".parse::<Archetype>(), Ok(Archetype::Pie));
    assert!("scatter".parse::<Archetype>().is_err());
  }

  #[test]
  fn test_render_request_enables_image_export() {
    let spec = ChartSpec {
      archetype: Archetype::Bar,
      title: Archetype::Bar.title().to_string(),
      height: BASE_HEIGHT,
      data: ChartData::Series { series: Vec::new() },
    };

    let request = RenderRequest::from(spec);
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["config"]["image_export"], true);
    assert_eq!(json["config"]["display_logo"], false);
    assert_eq!(json["spec"]["archetype"], "bar");
    assert_eq!(json["spec"]["data"]["kind"], "series");
  }
}
