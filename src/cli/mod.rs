//! CLI support for ogel-lang
//!
//! Provides programmatic access to the `ogel` commands so they can be
//! embedded in other tools. Expressions are read as JSON-serialised
//! [`Node`](crate::Node) trees.

mod convert;
mod eval;

pub use convert::{json_to_value, value_to_json};
pub use eval::{EvalOptions, SourceOptions, SourceOutput, execute_eval, execute_source};

use std::io;

/// Errors that can occur during CLI operations
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Generation error: {0}")]
    Generation(#[from] crate::GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A `--var` argument not of the form `name=json`.
    #[error("Invalid variable binding: '{0}' (expected name=<json>)")]
    InvalidVariable(String),
}
