//! Error types for the mining pipeline.
//!
//! Schema problems and mining problems are kept apart so that callers can tell
//! a malformed input table from an unsatisfiable mining request.
use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

use crate::types::{Itemset, ReportKey};

/// The shape of an input table does not match what the pipeline needs.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("table '{table}' contains key {key} more than once")]
    DuplicateKey { table: String, key: ReportKey },
    #[error("table '{table}' has a key that is not an integer: '{value}'")]
    InvalidKey { table: String, value: String },
}

/// The mining request cannot be satisfied.
#[derive(Debug, Error, PartialEq)]
pub enum MiningError {
    #[error("minimum support must be in (0, 1], got {0}")]
    InvalidMinSupport(f64),
    #[error("no frequent itemset has two or more items, so no rule can be formed")]
    NoRuleCandidates,
    #[error("support of itemset {0:?} is unknown")]
    MissingSupport(Itemset),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Mining(#[from] MiningError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::ResourceLimit(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
