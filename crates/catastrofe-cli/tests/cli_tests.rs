//! Integration tests for all CLI commands
//!
//! Tests each command with real invocations against generated fixtures.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Helper to create a CLI command running inside `dir`
///
/// `HOME` points into the temp dir so no user config leaks in.
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_catastrofe"));
    cmd.current_dir(dir).env("HOME", dir).env_remove("RUST_LOG");
    cmd
}

fn property(pca: &str, street: &str) -> String {
    format!(
        "<BIEDAT><BIE>\
           <RCA><PCA>{pca}</PCA><CAR>0001</CAR><CDC1>A</CDC1><CDC2>B</CDC2></RCA>\
           <DIR><TV>CL</TV><NV>{street}</NV></DIR>\
         </BIE></BIEDAT>"
    )
}

fn document(count: usize) -> String {
    let records: String = (0..count)
        .map(|i| property(&format!("{i:07}XX{i:04}X"), &format!("CARRER {i}")))
        .collect();
    format!("<?xml version=\"1.0\"?><FIN_DAT><CAB><FEC>2024</FEC></CAB>{records}<FIN/></FIN_DAT>")
}

fn write_xml(dir: &Path, name: &str, count: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, document(count)).unwrap();
    path
}

// ============ SPLIT COMMAND TESTS ============

#[test]
fn test_split_help() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Split a large XML document"));
}

#[test]
fn test_split_writes_parts() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "girona.xml", 60);

    cli(dir.path())
        .args(["split", "girona.xml", "-o", "parts", "-s", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("girona_part_001.xml"))
        .stdout(predicate::str::contains("Output directory:"));

    let parts = dir.path().join("parts");
    assert!(parts.join("girona_part_001.xml").exists());
    assert!(parts.join("girona_part_002.xml").exists());
}

#[test]
fn test_split_default_output_dir() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "small.xml", 2);

    cli(dir.path()).args(["-q", "split", "small.xml"]).assert().success().stdout("");

    assert!(dir.path().join("output").join("small_part_001.xml").exists());
}

#[test]
fn test_split_missing_input() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["split", "absent.xml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("absent.xml"));
}

#[test]
fn test_split_malformed_input() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.xml"), "<FIN_DAT><BIEDAT></FIN_DAT>").unwrap();

    cli(dir.path())
        .args(["split", "broken.xml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken.xml"));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_split_rejects_zero_size() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "a.xml", 1);
    cli(dir.path())
        .args(["split", "a.xml", "-s", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn test_split_uses_project_config() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "cfg.xml", 60);
    fs::write(dir.path().join(".catastrofe.toml"), "[split]\nmax_size_kb = 4\n").unwrap();

    cli(dir.path()).args(["-q", "split", "cfg.xml"]).assert().success();

    assert!(dir.path().join("output").join("cfg_part_002.xml").exists());
}

// ============ EXPORT COMMAND TESTS ============

#[test]
fn test_export_csv() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "a.xml", 3);

    cli(dir.path())
        .args(["export", "a.xml", "-o", "out.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 rows"));

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("\"TV\";\"NV\";"));
    assert!(lines.next().unwrap().starts_with("\"CL\";\"CARRER 0\";"));
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn test_export_from_zip_with_dedup_flags() {
    let dir = TempDir::new().unwrap();
    let doc = document(2);
    let mut zip = zip::ZipWriter::new(File::create(dir.path().join("bundle.zip")).unwrap());
    for name in ["a.xml", "b.xml", "readme.txt"] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(doc.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    cli(dir.path())
        .args(["-q", "export", "bundle.zip", "-o", "dedup.csv"])
        .assert()
        .success();
    cli(dir.path())
        .args(["-q", "export", "bundle.zip", "-o", "all.csv", "--no-dedup"])
        .assert()
        .success();

    let dedup = fs::read_to_string(dir.path().join("dedup.csv")).unwrap();
    let all = fs::read_to_string(dir.path().join("all.csv")).unwrap();
    assert_eq!(dedup.lines().count(), 3);
    assert_eq!(all.lines().count(), 5);
}

#[test]
fn test_export_extended_schema_with_delimiter() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "a.xml", 1);

    cli(dir.path())
        .args([
            "-q", "export", "a.xml", "-o", "ext.csv", "--schema", "extended", "--delimiter", ",",
        ])
        .assert()
        .success();

    let csv = fs::read_to_string(dir.path().join("ext.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(header.split(',').count(), 28);
    assert!(header.ends_with("\"ANT\""));
}

#[test]
fn test_export_no_documents_exit_code() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    cli(dir.path())
        .args(["export", "notes.txt"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No XML documents"));
    assert!(!dir.path().join("export.csv").exists());
}

#[test]
fn test_export_missing_input() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["export", "gone.zip"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("gone.zip"));
}

#[test]
fn test_export_requires_inputs() {
    let dir = TempDir::new().unwrap();
    cli(dir.path()).arg("export").assert().code(2);
}

#[test]
fn test_export_conflicting_dedup_flags() {
    let dir = TempDir::new().unwrap();
    write_xml(dir.path(), "a.xml", 1);
    cli(dir.path())
        .args(["export", "a.xml", "--dedup", "--no-dedup"])
        .assert()
        .code(2);
}

// ============ FIELDS / CONFIG COMMAND TESTS ============

#[test]
fn test_fields_legacy() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg("fields")
        .assert()
        .success()
        .stdout(predicate::str::contains("19 columns"))
        .stdout(predicate::str::contains("PCA + CAR + CDC1 + CDC2"));
}

#[test]
fn test_fields_extended() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["fields", "--schema", "extended"])
        .assert()
        .success()
        .stdout(predicate::str::contains("28 columns"))
        .stdout(predicate::str::contains("DEBI//LUSO"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();

    cli(dir.path()).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".catastrofe.toml").exists());

    cli(dir.path())
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    fs::write(
        dir.path().join(".catastrofe.toml"),
        "[export]\nschema = \"extended\"\n",
    )
    .unwrap();
    cli(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schema = \"extended\""));
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".catastrofe.toml"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catastrofe"));
}
