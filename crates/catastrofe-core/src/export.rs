//! Export pipeline: many documents and archives into one delimited file

use crate::collect::RecordCollector;
use crate::document::load_document;
use crate::error::{CatastroError, Result};
use crate::input::resolve;
use crate::observer::ProgressObserver;
use crate::output::AtomicCsvWriter;
use crate::schema::{ProjectionSchema, SchemaVersion};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Default field separator
pub const DEFAULT_DELIMITER: u8 = b';';

/// Knobs of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Projection schema version
    pub schema: SchemaVersion,
    /// Drop repeated dedup keys; `None` follows the schema's default
    pub dedup: Option<bool>,
    /// Field separator, a single ASCII byte
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            schema: SchemaVersion::default(),
            dedup: None,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl ExportOptions {
    /// Options for `schema` with its default dedup policy
    #[must_use]
    pub fn for_schema(schema: SchemaVersion) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// The projection schema selected
    #[must_use]
    pub const fn projection(&self) -> &'static ProjectionSchema {
        self.schema.schema()
    }

    /// Whether duplicates are dropped once defaults are applied
    #[must_use]
    pub fn dedup_enabled(&self) -> bool {
        self.dedup.unwrap_or(self.projection().dedup_by_default)
    }

    /// Check the options are usable
    ///
    /// # Errors
    ///
    /// `InvalidOption` for a non-ASCII, quote or line-break delimiter.
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(CatastroError::InvalidOption(format!(
                "delimiter {:?} cannot separate fields",
                char::from(self.delimiter)
            )));
        }
        Ok(())
    }
}

/// Totals of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File written
    pub output: PathBuf,
    /// XML documents read
    pub documents: usize,
    /// Data rows written
    pub rows: usize,
    /// Records dropped as duplicates
    pub duplicates: usize,
}

/// Result of an export run that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Rows were written
    Exported(ExportReport),
    /// The inputs held no XML document; nothing was written
    NoDocuments,
}

/// Flatten every record of `inputs` into a delimited file at `output`
///
/// Inputs are read in order, archive members in archive order. The first
/// document that fails to parse aborts the run and leaves `output` untouched.
///
/// # Errors
///
/// `InvalidOption`, `InputNotFound`, `InputUnreadable`, `Archive`,
/// `MalformedDocument`, `OutputUnwritable` or `Csv`.
pub fn export_files<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    options: &ExportOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ExportOutcome> {
    options.validate()?;

    let inputs = resolve(inputs, observer)?;
    if inputs.is_empty() {
        warn!("No XML documents found among the inputs");
        return Ok(ExportOutcome::NoDocuments);
    }

    let schema = options.projection();
    let mut collector = RecordCollector::new(schema, options.dedup_enabled());
    let mut writer = AtomicCsvWriter::new(output, options.delimiter)?;
    writer.write_header(schema)?;

    for path in inputs.documents() {
        let root = load_document(path)?;
        let tally = collector.collect_document(&root);
        observer.document_collected(path, tally.retained, tally.duplicates);
    }
    for row in collector.rows() {
        writer.write_row(row)?;
    }

    let report = ExportReport {
        rows: writer.rows(),
        output: writer.finish()?,
        documents: inputs.len(),
        duplicates: collector.duplicates(),
    };
    info!(
        "Exported {} rows from {} documents to {} ({} duplicates dropped)",
        report.rows,
        report.documents,
        report.output.display(),
        report.duplicates
    );
    Ok(ExportOutcome::Exported(report))
}
