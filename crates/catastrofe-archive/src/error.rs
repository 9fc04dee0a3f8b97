//! Error types for archive operations

use thiserror::Error;

/// Errors that can occur while expanding an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while reading the archive or writing a member
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ZIP archive format
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// Archive member is password-protected
    #[error("Archive member '{0}' is password-protected")]
    PasswordProtected(String),

    /// The path does not name an archive format we can expand
    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),
}
