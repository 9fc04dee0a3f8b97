//! TAR archive expansion
//!
//! Handles uncompressed, gzip and bzip2 compressed TAR archives. The outer
//! compression is taken from the file name and, when the name says nothing,
//! from the leading magic bytes.

use crate::error::ArchiveError;
use crate::sanitize_path;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Gzip magic bytes (RFC 1952)
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 magic bytes ('B' 'Z')
const BZIP2_MAGIC: [u8; 2] = [0x42, 0x5a];

/// Outer compression of a TAR archive
///
/// Defaults to `None` (uncompressed TAR).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TarCompression {
    /// Uncompressed TAR
    #[default]
    None,
    /// Gzip compressed (.tar.gz, .tgz)
    Gzip,
    /// Bzip2 compressed (.tar.bz2, .tbz2)
    Bzip2,
}

impl TarCompression {
    /// Detect compression from file magic bytes
    #[inline]
    #[must_use = "returns the detected compression type"]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 2 {
            return Self::None;
        }

        if bytes[..2] == GZIP_MAGIC {
            Self::Gzip
        } else if bytes[..2] == BZIP2_MAGIC {
            Self::Bzip2
        } else {
            Self::None
        }
    }
}

impl std::fmt::Display for TarCompression {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        };
        write!(f, "{s}")
    }
}

/// Open a TAR archive behind the right decompressor
///
/// A plain `.tar` name is double-checked against the magic bytes, since
/// compressed tarballs are often renamed carelessly.
fn open_archive(
    path: &Path,
    compression: TarCompression,
) -> Result<Archive<Box<dyn Read>>, ArchiveError> {
    let mut file = File::open(path)?;

    let compression = if compression == TarCompression::None {
        let mut magic = [0u8; 4];
        let read = file.read(&mut magic)?;
        file.seek(SeekFrom::Start(0))?;
        TarCompression::from_magic_bytes(&magic[..read])
    } else {
        compression
    };
    debug!("Opening {} as TAR ({compression})", path.display());

    let reader = BufReader::new(file);
    let reader: Box<dyn Read> = match compression {
        TarCompression::None => Box::new(reader),
        TarCompression::Gzip => Box::new(GzDecoder::new(reader)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
    };

    Ok(Archive::new(reader))
}

/// Extract the regular-file members of a TAR archive accepted by `filter` below `dest`
///
/// `filter` receives the member path as stored in the archive.
///
/// # Errors
///
/// Returns `ArchiveError` if the archive cannot be opened or decompressed, if
/// an entry header is corrupt, or if a member cannot be written below `dest`.
pub fn extract_tar_members<F>(
    path: &Path,
    compression: TarCompression,
    dest: &Path,
    mut filter: F,
) -> Result<Vec<PathBuf>, ArchiveError>
where
    F: FnMut(&str) -> bool,
{
    let mut archive = open_archive(path, compression)?;
    let mut extracted = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw_path = entry.path()?.into_owned();
        let raw_name = raw_path.to_string_lossy().to_string();
        if !filter(&raw_name) {
            debug!("Ignoring archive member {raw_name}");
            continue;
        }

        let Some(sanitized) = sanitize_path(&raw_path) else {
            warn!("Skipping invalid path: {raw_name} (path traversal attempt or empty)");
            continue;
        };

        let target = dest.join(sanitized);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut entry, &mut out)?;
        extracted.push(target);
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_xml_member;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tar::{Builder, Header};
    use tempfile::TempDir;

    fn append(builder: &mut Builder<impl Write>, name: &str, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    fn write_members(builder: &mut Builder<impl Write>) {
        append(builder, "one.xml", b"<one/>");
        append(builder, "notes.txt", b"ignored");
        append(builder, "deep/two.XML", b"<two/>");
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(TarCompression::from_magic_bytes(&[0x1f, 0x8b, 0, 0]), TarCompression::Gzip);
        assert_eq!(TarCompression::from_magic_bytes(b"BZh9"), TarCompression::Bzip2);
        assert_eq!(TarCompression::from_magic_bytes(b"ustar"), TarCompression::None);
        assert_eq!(TarCompression::from_magic_bytes(&[0x1f]), TarCompression::None);
    }

    #[test]
    fn test_extract_plain_tar() {
        let dir = TempDir::new().unwrap();
        let tar_path = dir.path().join("bundle.tar");
        let mut builder = Builder::new(File::create(&tar_path).unwrap());
        write_members(&mut builder);
        builder.finish().unwrap();
        drop(builder);

        let dest = dir.path().join("out");
        let members =
            extract_tar_members(&tar_path, TarCompression::None, &dest, is_xml_member).unwrap();

        assert_eq!(members, vec![dest.join("one.xml"), dest.join("deep").join("two.XML")]);
        assert_eq!(fs::read_to_string(&members[1]).unwrap(), "<two/>");
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn test_extract_gzip_tar_detected_by_magic() {
        let dir = TempDir::new().unwrap();
        // Misnamed: gzip data behind a plain .tar name
        let tar_path = dir.path().join("bundle.tar");
        let encoder = GzEncoder::new(File::create(&tar_path).unwrap(), Compression::default());
        let mut builder = Builder::new(encoder);
        write_members(&mut builder);
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        let members =
            extract_tar_members(&tar_path, TarCompression::None, &dest, is_xml_member).unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(fs::read_to_string(&members[0]).unwrap(), "<one/>");
    }
}
