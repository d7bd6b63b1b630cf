//! Error taxonomy for the conversion pipeline.
//!
//! Fatal conditions abort the run before any annotation document is written.
//! Everything else is scoped to a single record or a single object and is
//! recovered by the pipeline driver.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read source export '{path}': {source}")]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("source export '{path}' contains no records")]
    EmptySource { path: PathBuf },

    #[error("first record of the source export has no '{field}' field")]
    MissingProjectField { field: &'static str },

    #[error("record {record}: missing '{field}' field")]
    MissingField { record: String, field: &'static str },

    #[error("record {record}: cannot read image '{path}': {message}")]
    ImageUnreadable {
        record: String,
        path: PathBuf,
        message: String,
    },

    #[error("record {record}: no category named '{title}'")]
    CategoryNotFound { record: String, title: String },

    #[error("record {record}: object '{title}' has no usable bounding box")]
    UnsupportedGeometry { record: String, title: String },

    #[error("failed to copy '{src}' to '{dst}': {source}")]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Whether this condition must halt the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::MalformedSource { .. }
                | ConvertError::EmptySource { .. }
                | ConvertError::MissingProjectField { .. }
                | ConvertError::Io { .. }
        )
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ConvertError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
