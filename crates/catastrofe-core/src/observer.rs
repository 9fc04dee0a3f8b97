//! Progress reporting hooks
//!
//! The split and export pipelines never render anything themselves. They call
//! into a [`ProgressObserver`] between processing steps; the CLI drives its
//! progress bars from these calls and tests can record them.

use std::path::Path;

/// Receives progress notifications from the pipelines
///
/// Every method has an empty default body, so implementors only override the
/// notifications they care about.
#[allow(unused_variables)]
pub trait ProgressObserver {
    /// A source document was parsed and classified
    fn document_loaded(&mut self, path: &Path, records: usize) {}

    /// One more record was placed by the partitioner (`done` of `total`)
    fn record_planned(&mut self, done: usize, total: usize) {}

    /// A partition was sealed
    fn partition_sealed(&mut self, number: usize, records: usize, estimated_bytes: u64) {}

    /// An archive was expanded into `members` XML documents
    fn archive_expanded(&mut self, archive: &Path, members: usize) {}

    /// All inputs were resolved into `documents` XML documents
    fn documents_resolved(&mut self, documents: usize) {}

    /// A document's records were flattened
    fn document_collected(&mut self, path: &Path, retained: usize, duplicates: usize) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
