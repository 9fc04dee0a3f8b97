//! Input resolution: argument paths to a flat list of XML documents
//!
//! Plain `.xml` paths are taken as they are. Archives are expanded into a
//! staging [`TempDir`] owned by the returned [`InputSet`]; the staging area is
//! deleted when the set is dropped, whether the run succeeded or not.

use crate::error::{CatastroError, Result};
use crate::observer::ProgressObserver;
use catastrofe_archive::{extract_xml_members, is_xml_member, ArchiveKind};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// What an input path holds, judged by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// A single XML document
    Xml,
    /// A container whose `.xml` members are the documents
    Archive(ArchiveKind),
}

impl InputKind {
    /// Classify `path` by extension, case-insensitively
    ///
    /// Returns `None` for paths that are neither XML nor a supported archive.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        if is_xml_member(&name) {
            Some(Self::Xml)
        } else {
            ArchiveKind::from_path(path).map(Self::Archive)
        }
    }
}

/// The XML documents behind a list of input paths
#[derive(Debug)]
pub struct InputSet {
    documents: Vec<PathBuf>,
    // Dropping removes extracted archive members
    staging: Option<TempDir>,
}

impl InputSet {
    /// Document paths, in argument order then archive order
    #[must_use]
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Number of documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no XML document was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Directory archive members were extracted into, if any archive was given
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(TempDir::path)
    }
}

/// Resolve `inputs` into XML document paths
///
/// Every input must exist before anything is extracted. Paths with an
/// unrecognised extension are skipped with a warning.
///
/// # Errors
///
/// `InputNotFound` for a missing input, `Archive` when an archive cannot be
/// expanded, `OutputUnwritable` when the staging directory cannot be created.
pub fn resolve<P: AsRef<Path>>(
    inputs: &[P],
    observer: &mut dyn ProgressObserver,
) -> Result<InputSet> {
    let mut classified = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(CatastroError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        match InputKind::detect(path) {
            Some(kind) => classified.push((path, kind)),
            None => warn!("Skipping {}: not an XML document or archive", path.display()),
        }
    }

    let mut documents = Vec::new();
    let mut staging: Option<TempDir> = None;
    let mut archive_count = 0usize;

    for (path, kind) in classified {
        match kind {
            InputKind::Xml => documents.push(path.to_path_buf()),
            InputKind::Archive(_) => {
                let root = match &staging {
                    Some(dir) => dir.path().to_path_buf(),
                    None => {
                        let dir = tempfile::Builder::new()
                            .prefix("catastrofe-")
                            .tempdir()
                            .map_err(|e| CatastroError::output(std::env::temp_dir(), e))?;
                        let root = dir.path().to_path_buf();
                        staging = Some(dir);
                        root
                    }
                };
                archive_count += 1;
                // One directory per archive so equal member names never collide
                let dest = root.join(format!("archive_{archive_count:03}"));
                let members =
                    extract_xml_members(path, &dest).map_err(|source| CatastroError::Archive {
                        path: path.to_path_buf(),
                        source,
                    })?;
                if members.is_empty() {
                    warn!("No XML members in {}", path.display());
                }
                debug!("Expanded {} XML members from {}", members.len(), path.display());
                observer.archive_expanded(path, members.len());
                documents.extend(members);
            }
        }
    }

    observer.documents_resolved(documents.len());
    Ok(InputSet {
        documents,
        staging,
    })
}
