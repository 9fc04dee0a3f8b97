//! Integration tests for archive expansion
//!
//! Builds ZIP and TAR fixtures on the fly and checks that only XML members
//! come out, in archive order, below the destination.

use catastrofe_archive::{extract_xml_members, ArchiveError};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const DOC: &str = "<FIN_DAT><CAB/></FIN_DAT>";

fn tar_members<W: Write>(out: W, members: &[&str]) -> W {
    let mut builder = tar::Builder::new(out);
    for name in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(DOC.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, DOC.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

fn relative(paths: &[PathBuf], root: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn test_zip_members_in_archive_order() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("bundle.ZIP");
    let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
    for name in ["b.xml", "notes.txt", "sub/a.xml"] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(DOC.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    let dest = dir.path().join("staging");
    let members = extract_xml_members(&archive, &dest).unwrap();

    assert_eq!(relative(&members, &dest), vec!["b.xml", "sub/a.xml"]);
    assert_eq!(fs::read_to_string(&members[1]).unwrap(), DOC);
}

#[test]
fn test_gzip_tar() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("bundle.tgz");
    let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
    tar_members(encoder, &["28.xml", "29.txt", "30.Xml"])
        .finish()
        .unwrap();

    let dest = dir.path().join("staging");
    let members = extract_xml_members(&archive, &dest).unwrap();

    assert_eq!(relative(&members, &dest), vec!["28.xml", "30.Xml"]);
}

#[test]
fn test_unsupported_archive() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("bundle.rar");
    fs::write(&archive, b"Rar!").unwrap();

    let err = extract_xml_members(&archive, dir.path()).unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedArchive(_)));
}

#[test]
fn test_corrupt_zip() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.zip");
    fs::write(&archive, b"definitely not a zip").unwrap();

    assert!(extract_xml_members(&archive, &dir.path().join("out")).is_err());
}
