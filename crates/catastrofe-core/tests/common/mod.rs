//! Shared fixtures for catastrofe-core integration tests

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;

/// One `BIE` property record with a reference, address and parcel
pub fn property(pca: &str, car: &str, street: &str) -> String {
    format!(
        "<BIE>\
           <RCA><PCA>{pca}</PCA><CAR>{car}</CAR><CDC1>M</CDC1><CDC2>N</CDC2></RCA>\
           <DIR><TV>CL</TV><NV>{street}</NV><PNP>7</PNP></DIR>\
           <LOINT><ES>1</ES><PT>03</PT><PU>A</PU></LOINT>\
           <CPP><CPO>004</CPO><CPA>00321</CPA></CPP>\
         </BIE>"
    )
}

/// Cadastral document: header, one `BIEDAT` record per property, end marker
pub fn cadastral_document(properties: &[String]) -> String {
    let records: String = properties
        .iter()
        .map(|p| format!("<BIEDAT>{p}</BIEDAT>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <FIN_DAT xmlns:cat=\"urn:catastro\" version=\"2\">\
           <CAB><FEC>20240131</FEC><CM>079</CM></CAB>\
           {records}\
           <FIN>END</FIN>\
         </FIN_DAT>"
    )
}

/// `count` distinct properties with sequential references
pub fn properties(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| property(&format!("{:07}AB{:04}C", i, i), "0001", &format!("CALLE {i}")))
        .collect()
}

/// Write `contents` to `dir/name`
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Build a ZIP archive at `dir/name` holding the given members
pub fn write_zip(dir: &Path, name: &str, members: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    for (member, contents) in members {
        zip.start_file(*member, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// Build an uncompressed TAR archive at `dir/name` holding the given members
pub fn write_tar(dir: &Path, name: &str, members: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut builder = tar::Builder::new(File::create(&path).unwrap());
    for (member, contents) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, member, contents.as_bytes())
            .unwrap();
    }
    builder.finish().unwrap();
    path
}

/// Like `write_zip`, but `encrypted` is stored with ZipCrypto
pub fn write_encrypted_zip(
    dir: &Path,
    name: &str,
    members: &[(&str, &str)],
    encrypted: &str,
) -> PathBuf {
    let path = dir.join(name);
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    for (member, contents) in members {
        let options = if *member == encrypted {
            SimpleFileOptions::default().with_deprecated_encryption(b"secret")
        } else {
            SimpleFileOptions::default()
        };
        zip.start_file(*member, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}
