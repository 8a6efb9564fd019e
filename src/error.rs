// src/error.rs
use thiserror::Error;

/// Errors surfaced by the phenology pipeline
#[derive(Error, Debug)]
pub enum PhenologyError {
    #[error("Invalid configuration: {field} = {value:?} ({reason})")]
    InvalidConfiguration {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported environment: {engine} {found} cannot map tiles, requires >= {required}")]
    UnsupportedEnvironment {
        engine: String,
        found: String,
        required: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Tile {row_offset},{col_offset} does not match the output template: {reason}")]
    TemplateMismatch {
        row_offset: usize,
        col_offset: usize,
        reason: String,
    },

    #[error("Grid source error: {0}")]
    Source(String),
}

impl PhenologyError {
    pub(crate) fn config(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PhenologyError::InvalidConfiguration {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for phenology operations
pub type Result<T> = std::result::Result<T, PhenologyError>;
