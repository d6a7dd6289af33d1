//! Stargaze - conversational analytics over plan star ratings
//!
//! Keeps a bounded-context conversation with a remote reasoning service,
//! reveals replies incrementally, and turns any records that come back into
//! a chart specification without the user naming a chart type.

pub mod chart;
pub mod cli;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod log;
pub mod records;
pub mod reveal;
pub mod view;

pub use chart::{infer_archetype, pivot, Archetype, ChartSpec, Presentation};
pub use conversation::{Conversation, Message, ReasoningService, Role, ServiceReply};
pub use records::{classify, Record, RecordBatch, ShapeClassification};
