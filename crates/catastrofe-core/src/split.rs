//! Split pipeline: one oversized document into size-bounded parts

use crate::document::load_document;
use crate::error::{CatastroError, Result};
use crate::observer::ProgressObserver;
use crate::output::{write_parts, WrittenPart};
use crate::partition::{
    Partitioner, RecordMarker, SplitDocument, DEFAULT_HEADER_OVERHEAD, DEFAULT_MAX_BYTES,
    DEFAULT_RECORD_SUFFIX,
};
use crate::size::{SizeEstimator, DEFAULT_PER_NODE_OVERHEAD};
use log::info;
use std::path::{Path, PathBuf};

/// Knobs of a split run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Estimated size ceiling per part, in bytes
    pub max_bytes: u64,
    /// Tag-name suffix marking record elements
    pub record_suffix: String,
    /// Pretty-printing allowance per element
    pub per_node_overhead: u64,
    /// Declaration allowance added to every fit check
    pub header_overhead: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            record_suffix: DEFAULT_RECORD_SUFFIX.to_string(),
            per_node_overhead: DEFAULT_PER_NODE_OVERHEAD,
            header_overhead: DEFAULT_HEADER_OVERHEAD,
        }
    }
}

impl SplitOptions {
    /// Options with a ceiling of `kb` kilobytes (1 KB = 1024 bytes)
    #[must_use]
    pub fn with_max_kb(kb: u64) -> Self {
        Self {
            max_bytes: kb.saturating_mul(1024),
            ..Self::default()
        }
    }

    /// Check the options are usable
    ///
    /// # Errors
    ///
    /// `InvalidOption` for a zero ceiling or an empty record suffix.
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(CatastroError::InvalidOption(
                "maximum part size must be greater than zero".to_string(),
            ));
        }
        if self.record_suffix.is_empty() {
            return Err(CatastroError::InvalidOption(
                "record suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn partitioner(&self) -> Partitioner {
        Partitioner::new(self.max_bytes)
            .with_estimator(SizeEstimator::new(self.per_node_overhead))
            .with_header_overhead(self.header_overhead)
    }
}

/// Outcome of a split run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// Source document
    pub input: PathBuf,
    /// Parts written, in order
    pub parts: Vec<WrittenPart>,
}

impl SplitReport {
    /// Records across all parts
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.parts.iter().map(|p| p.records).sum()
    }

    /// Bytes across all parts
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.bytes).sum()
    }
}

/// Split `input` into `<stem>_part_NNN.xml` files below `output_dir`
///
/// Nothing is written if the document cannot be loaded or parsed. A document
/// without records produces no parts.
///
/// # Errors
///
/// `InvalidOption` for unusable options, `InputNotFound`, `InputUnreadable`
/// or `MalformedDocument` for the source, `OutputUnwritable` for the parts.
pub fn split_file(
    input: &Path,
    output_dir: &Path,
    options: &SplitOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<SplitReport> {
    options.validate()?;

    let root = load_document(input)?;
    let document = SplitDocument::from_root(root, &RecordMarker::new(&options.record_suffix));
    observer.document_loaded(input, document.records().len());

    let plan = options.partitioner().plan(&document, observer);
    let stem = input
        .file_stem()
        .map_or_else(|| "document".into(), |s| s.to_string_lossy());
    let parts = write_parts(&plan, &stem, output_dir)?;

    let report = SplitReport {
        input: input.to_path_buf(),
        parts,
    };
    info!(
        "Split {} into {} parts ({} records)",
        input.display(),
        report.parts.len(),
        report.total_records()
    );
    Ok(report)
}
