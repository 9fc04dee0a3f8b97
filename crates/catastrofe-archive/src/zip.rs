//! ZIP archive expansion
//!
//! Members are streamed from the archive straight into files below the
//! destination directory, so a multi-hundred-megabyte municipality export never
//! has to fit in memory.

use crate::error::ArchiveError;
use crate::sanitize_path;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extract the members of a ZIP archive accepted by `filter` below `dest`
///
/// `filter` receives the raw member name as stored in the archive. Directories
/// are skipped, and so are members whose name sanitises to nothing.
///
/// # Errors
///
/// Returns `ArchiveError` if:
/// - Archive cannot be opened
/// - Archive is invalid or corrupted
/// - An accepted member is password-protected
/// - A member cannot be written below `dest`
pub fn extract_zip_members<F>(
    path: &Path,
    dest: &Path,
    mut filter: F,
) -> Result<Vec<PathBuf>, ArchiveError>
where
    F: FnMut(&str) -> bool,
{
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        // Raw access reads the metadata without decrypting
        let (raw_name, encrypted) = {
            let entry = archive.by_index_raw(i)?;
            if entry.is_dir() {
                continue;
            }
            (entry.name().to_string(), entry.encrypted())
        };

        if !filter(&raw_name) {
            debug!("Ignoring archive member {raw_name}");
            continue;
        }

        if encrypted {
            return Err(ArchiveError::PasswordProtected(raw_name));
        }

        // SECURITY: entries like "../../../etc/passwd" must stay below dest
        let Some(sanitized) = sanitize_path(Path::new(&raw_name)) else {
            warn!("Skipping invalid path: {raw_name} (path traversal attempt or empty)");
            continue;
        };

        let target = dest.join(sanitized);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut zip_file = archive.by_index(i)?;
        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut zip_file, &mut out)?;
        extracted.push(target);
    }

    Ok(extracted)
}
