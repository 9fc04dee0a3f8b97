//! Error types for splitting and exporting cadastral documents
//!
//! Every variant that concerns a file carries its path, so the driver can
//! report which input or output caused a run to abort.

use crate::document::ParseError;
use catastrofe_archive::ArchiveError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a split or export run
#[derive(Error, Debug)]
pub enum CatastroError {
    /// An input path does not exist
    #[error("Input not found: {}", path.display())]
    InputNotFound {
        /// Offending input path
        path: PathBuf,
    },

    /// An input exists but cannot be read
    #[error("Cannot read input {}: {source}", path.display())]
    InputUnreadable {
        /// Offending input path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// An input is not well-formed XML
    #[error("Malformed document {}: {source}", path.display())]
    MalformedDocument {
        /// Offending document path
        path: PathBuf,
        /// Parse failure
        #[source]
        source: ParseError,
    },

    /// An archive could not be expanded
    #[error("Cannot expand archive {}: {source}", path.display())]
    Archive {
        /// Offending archive path
        path: PathBuf,
        /// Archive failure
        #[source]
        source: ArchiveError,
    },

    /// An output file or directory cannot be written
    #[error("Cannot write output {}: {source}", path.display())]
    OutputUnwritable {
        /// Offending output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text serialisation failed
    #[error("Cannot write CSV {}: {source}", path.display())]
    Csv {
        /// Offending output path
        path: PathBuf,
        /// CSV failure
        #[source]
        source: csv::Error,
    },

    /// A run option is out of range
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl CatastroError {
    /// Classify an IO error raised while opening an input
    pub(crate) fn from_input_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::InputNotFound { path }
        } else {
            Self::InputUnreadable { path, source }
        }
    }

    /// Wrap an IO error raised while writing an output
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputUnwritable {
            path: path.into(),
            source,
        }
    }
}

/// Result type for catastrofe operations
pub type Result<T> = std::result::Result<T, CatastroError>;
