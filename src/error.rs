//! Error types for loading and querying the listings table

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to bring the dataset into memory. Loading is all-or-nothing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode dataset: {0}")]
    Arrow(#[from] ArrowError),

    #[error("failed to decode parquet dataset: {0}")]
    Parquet(#[from] ParquetError),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("unsupported dataset format '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    /// A required value is blank. `row` is zero-based over data rows.
    #[error("column '{column}' has no value at row {row}")]
    NullValue { column: String, row: usize },
}

/// Failure to turn user selections into a runnable query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown landmark '{0}'")]
    UnknownLandmark(String),

    #[error("unknown price bucket '{0}'")]
    UnknownPriceBucket(String),

    #[error("price range is inverted: '{min}' is above '{max}'")]
    InvertedPriceRange { min: String, max: String },

    #[error("compute kernel failed: {0}")]
    Arrow(#[from] ArrowError),
}
