//! Terminal front-end: commands, the interactive session, and text rendering

pub mod commands;
pub mod display;
pub mod session;
