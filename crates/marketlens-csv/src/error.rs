use std::path::PathBuf;

use marketlens_core::error::CoreError;
use thiserror::Error;

/// A failed load. Loads are all-or-nothing: any of these aborts the whole
/// dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: missing required column `{column}`")]
    MissingColumn { file: String, column: &'static str },

    #[error("{file} line {line}: invalid date `{value}`")]
    InvalidDate {
        file: String,
        line: u64,
        value: String,
    },

    #[error("{file} line {line}: invalid value `{value}` in column `{column}`")]
    InvalidValue {
        file: String,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Dataset(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, LoadError>;
