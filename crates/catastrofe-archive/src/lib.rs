//! Archive expansion for catastrofe
//!
//! Cadastral exports are frequently delivered as compressed bundles holding one
//! XML document per municipality. This crate expands the XML members of such a
//! bundle into a directory chosen by the caller, so the rest of the pipeline
//! only ever sees plain file paths.
//!
//! # Features
//!
//! - **ZIP archives**: members are streamed straight to disk
//! - **TAR archives**: uncompressed, gzip (`.tar.gz`, `.tgz`) and bzip2 (`.tar.bz2`, `.tbz2`)
//! - **Member filtering**: only members whose name ends in `.xml` (any case) are extracted
//! - **Path sanitisation**: `..`, absolute paths and drive prefixes are stripped
//!
//! # Usage
//!
//! ```no_run
//! use catastrofe_archive::extract_xml_members;
//! use std::path::Path;
//!
//! let members = extract_xml_members(Path::new("girona.zip"), Path::new("/tmp/staging")).unwrap();
//! for member in members {
//!     println!("Extracted: {}", member.display());
//! }
//! ```

pub mod error;
pub mod tar;
pub mod zip;

use std::path::{Component, Path, PathBuf};

pub use error::ArchiveError;
pub use crate::tar::{extract_tar_members, TarCompression};
pub use crate::zip::extract_zip_members;

/// Archive container formats that can be expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// ZIP archive (`.zip`)
    Zip,
    /// TAR archive with the given outer compression
    Tar(TarCompression),
}

impl ArchiveKind {
    /// Detect the archive kind from the file name, case-insensitively.
    ///
    /// Returns `None` for anything that is not a supported container.
    #[must_use = "returns the detected archive kind"]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();

        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar") {
            Some(Self::Tar(TarCompression::None))
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Tar(TarCompression::Gzip))
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
            Some(Self::Tar(TarCompression::Bzip2))
        } else {
            None
        }
    }
}

/// Whether an archive member should be treated as an input document
#[inline]
#[must_use]
pub fn is_xml_member(name: &str) -> bool {
    name.to_lowercase().ends_with(".xml")
}

/// Extract every `.xml` member of `archive` below `dest`.
///
/// Returns the extracted paths in archive order. Non-XML members are ignored.
///
/// # Errors
///
/// Returns `ArchiveError::UnsupportedArchive` if the file name does not name a
/// supported container, or any error raised while reading the archive or
/// writing a member.
pub fn extract_xml_members(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    match ArchiveKind::from_path(archive) {
        Some(ArchiveKind::Zip) => extract_zip_members(archive, dest, is_xml_member),
        Some(ArchiveKind::Tar(compression)) => {
            extract_tar_members(archive, compression, dest, is_xml_member)
        }
        None => Err(ArchiveError::UnsupportedArchive(
            archive.display().to_string(),
        )),
    }
}

/// Sanitize a member path to prevent path traversal (e.g. `../../../etc/passwd`)
///
/// Only normal components are kept; parent refs, current-dir refs, roots and
/// drive prefixes are dropped. Returns `None` if nothing is left.
#[inline]
pub(crate) fn sanitize_path(path: &Path) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();

    for component in path.components() {
        if let Component::Normal(part) = component {
            sanitized.push(part);
        }
    }

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
