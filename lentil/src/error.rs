//! Error types of the association analysis.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LentilError {
    #[error("covariate `{covariate}` has {actual} labels but the score matrix has {expected} rows")]
    ShapeMismatch {
        covariate: String,
        expected: usize,
        actual: usize,
    },

    #[error("covariate `{covariate}` has no observation for level `{level}`")]
    EmptyLevel { covariate: String, level: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid factor columns: {0}")]
    InvalidFactorColumns(String),

    #[error("non-finite score at row {row} of factor `{factor}`")]
    NonFiniteScore { row: usize, factor: String },

    #[error("empty table: {0}")]
    EmptyTable(String),
}

pub type Result<T> = std::result::Result<T, LentilError>;
