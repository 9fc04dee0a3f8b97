//! Output writers
//!
//! Both writers stage their data in temporary files next to the destination
//! and only move them into place once everything was written, so a failed run
//! never leaves half-written parts or a truncated CSV behind.

use crate::error::{CatastroError, Result};
use crate::extract::FlatRecord;
use crate::partition::Partition;
use crate::schema::ProjectionSchema;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use log::debug;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One split part on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPart {
    /// Final path of the part
    pub path: PathBuf,
    /// Actual size on disk
    pub bytes: u64,
    /// Number of records in the part
    pub records: usize,
    /// Size the partitioner estimated for the part
    pub estimated_bytes: u64,
}

/// File name of part `number` of a document with stem `stem`
#[must_use]
pub fn part_file_name(stem: &str, number: usize) -> String {
    format!("{stem}_part_{number:03}.xml")
}

/// Parent directory of `path`, `.` for bare file names
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write every partition below `output_dir` as `<stem>_part_NNN.xml`
///
/// Parts are staged as temporary files in `output_dir` and renamed into place
/// only after the last one was written. The directory is created if missing.
///
/// # Errors
///
/// `OutputUnwritable` if the directory cannot be created or any part cannot
/// be written or persisted.
pub fn write_parts(
    partitions: &[Partition<'_>],
    stem: &str,
    output_dir: &Path,
) -> Result<Vec<WrittenPart>> {
    fs::create_dir_all(output_dir).map_err(|e| CatastroError::output(output_dir, e))?;

    let mut staged = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let path = output_dir.join(part_file_name(stem, partition.number()));
        let mut temp = NamedTempFile::new_in(output_dir)
            .map_err(|e| CatastroError::output(&path, e))?;
        {
            let mut out = BufWriter::new(temp.as_file_mut());
            partition
                .write_to(&mut out)
                .and_then(|()| out.flush())
                .map_err(|e| CatastroError::output(&path, e))?;
        }
        let bytes = temp
            .as_file()
            .metadata()
            .map_err(|e| CatastroError::output(&path, e))?
            .len();
        staged.push((
            temp,
            WrittenPart {
                path,
                bytes,
                records: partition.records().len(),
                estimated_bytes: partition.estimated_bytes(),
            },
        ));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (temp, part) in staged {
        temp.persist(&part.path)
            .map_err(|e| CatastroError::output(&part.path, e.error))?;
        debug!(
            "Wrote {} ({} records, {} bytes)",
            part.path.display(),
            part.records,
            part.bytes
        );
        written.push(part);
    }
    Ok(written)
}

/// Delimited-text writer that replaces its destination atomically
///
/// Rows go to a temporary file in the destination directory; [`finish`]
/// persists it. Dropping the writer unfinished deletes the temporary file.
///
/// [`finish`]: AtomicCsvWriter::finish
#[derive(Debug)]
pub struct AtomicCsvWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
    rows: usize,
}

impl AtomicCsvWriter {
    /// Create a writer targeting `final_path`, fields separated by `delimiter`
    ///
    /// Every field is quoted and records end in `\r\n`.
    ///
    /// # Errors
    ///
    /// `OutputUnwritable` if the destination directory cannot be created or
    /// holds no room for the temporary file.
    pub fn new(final_path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();
        let dir = parent_dir(&final_path);
        fs::create_dir_all(dir).map_err(|e| CatastroError::output(&final_path, e))?;

        let temp = NamedTempFile::new_in(dir).map_err(|e| CatastroError::output(&final_path, e))?;
        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::CRLF)
            .from_writer(BufWriter::new(temp));

        Ok(Self {
            writer,
            final_path,
            rows: 0,
        })
    }

    /// Destination path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.final_path
    }

    /// Write the header row: the schema's field names in order
    ///
    /// # Errors
    ///
    /// `Csv` if the row cannot be written.
    pub fn write_header(&mut self, schema: &ProjectionSchema) -> Result<()> {
        self.writer
            .write_record(schema.field_names())
            .map_err(|source| CatastroError::Csv {
                path: self.final_path.clone(),
                source,
            })
    }

    /// Write one data row
    ///
    /// # Errors
    ///
    /// `Csv` if the row cannot be written.
    pub fn write_row(&mut self, record: &FlatRecord) -> Result<()> {
        self.writer
            .write_record(record.values())
            .map_err(|source| CatastroError::Csv {
                path: self.final_path.clone(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and move the file into place, returning its path
    ///
    /// # Errors
    ///
    /// `OutputUnwritable` if flushing or persisting fails; the temporary file
    /// is removed in that case.
    pub fn finish(self) -> Result<PathBuf> {
        let Self {
            mut writer,
            final_path,
            ..
        } = self;
        writer
            .flush()
            .map_err(|e| CatastroError::output(&final_path, e))?;
        let buffered = writer.into_inner().map_err(|e| {
            CatastroError::output(&final_path, io::Error::new(e.error().kind(), e.to_string()))
        })?;
        let temp = buffered
            .into_inner()
            .map_err(|e| CatastroError::output(&final_path, e.into_error()))?;
        temp.persist(&final_path)
            .map_err(|e| CatastroError::output(&final_path, e.error))?;
        Ok(final_path)
    }
}
