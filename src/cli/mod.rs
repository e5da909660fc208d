//! CLI support for fuzzyq
//!
//! The binary is a thin shell over these functions so the same behavior can
//! be driven from tests or embedded in other tools.

mod convert;
mod pipeline;
mod query;

pub use convert::{pair_to_record, read_pairs, record_to_pair};
pub use pipeline::{Operation, OutputFormat, PipelineOptions, build_pipeline, write_results};
pub use query::{execute_format, execute_parse, parse_map_arg, parse_query_arg};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Query syntax error
    Parse(crate::ParseError),
    /// Evaluation, stream or domain error
    Query(crate::FuzzyError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// Input record whose membership is outside [0, 1] (1-based record number)
    InvalidRecord {
        record: usize,
        error: crate::DomainError,
    },
    /// No input provided
    NoInput,
    /// Query argument is neither an S-expression, a JSON array nor a field reference
    InvalidQuery(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::Query(e) => write!(f, "Query error: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::InvalidRecord { record, error } => {
                write!(f, "Invalid input record {}: {}", record, error)
            }
            CliError::NoInput => write!(f, "No input provided. Pass a file or pipe JSON to stdin."),
            CliError::InvalidQuery(q) => write!(
                f,
                "Invalid query: '{}'\nExpected an S-expression, a JSON array or a :field reference.",
                q
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(e) => Some(e),
            CliError::Query(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidRecord { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<crate::FuzzyError> for CliError {
    fn from(e: crate::FuzzyError) -> Self {
        CliError::Query(e)
    }
}

impl From<crate::DomainError> for CliError {
    fn from(e: crate::DomainError) -> Self {
        CliError::Query(e.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
