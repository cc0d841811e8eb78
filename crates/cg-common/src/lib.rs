//! Shared types for the cvar-grid workspace.
//!
//! This crate provides the vocabulary every other crate speaks:
//! - Grid coordinates (`State`) and the four grid moves (`Action`)
//! - Environment outcomes (`Transition`)
//! - Output format selection for the CLI
//! - Persisted schema versioning

pub mod grid;
pub mod output;

pub use grid::{Action, State, Transition};
pub use output::OutputFormat;

/// Schema version for persisted value functions and configuration files.
pub const SCHEMA_VERSION: &str = "1.0.0";
