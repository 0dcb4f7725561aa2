//! Persisted tables: statement, scored and grouped datasets as Parquet files.

pub mod models;
pub mod parquet;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table file not found: {0}")]
    NotFound(PathBuf),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("column {column} has unexpected type {found}")]
    ColumnType {
        column: &'static str,
        found: String,
    },

    #[error("invalid value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),
}
