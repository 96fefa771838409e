use std::path::PathBuf;

use polars::prelude::PolarsError;

/// Errors raised while loading, profiling or rendering a table.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("column '{label}': {source}")]
    Column {
        label: String,
        #[source]
        source: Box<ProfileError>,
    },

    #[error("failed to read table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("column computation failed: {0}")]
    Compute(#[from] PolarsError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

impl ProfileError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn column(label: impl Into<String>, source: ProfileError) -> Self {
        Self::Column {
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// True for errors caused by the input table or settings rather than by I/O.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput { .. } => true,
            Self::Column { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }
}
