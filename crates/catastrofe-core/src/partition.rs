//! Size-bounded partitioning of a cadastral document
//!
//! A source document is a root element whose direct children are either
//! records (tag names ending in the record marker, `DAT` by default) or
//! wrapper elements such as the `FEC` date header and the `FIN` end marker.
//! Every output part repeats the root and the wrapper around a run of
//! consecutive records.
//!
//! Packing is greedy and works on estimated sizes (see [`crate::size`]): a part
//! is sealed when the next record would push it over the limit, unless the part
//! is still empty. A single record larger than the limit therefore becomes a
//! part of its own instead of being rejected.

use crate::document::{write_document_with_children, Element};
use crate::observer::ProgressObserver;
use crate::size::SizeEstimator;
use log::debug;
use std::io::{self, Write};
use std::ops::Range;

/// Default part size limit (450 KB)
pub const DEFAULT_MAX_BYTES: u64 = 450 * 1024;

/// Allowance for the XML declaration and trailing newline, added to every
/// packing check but never accumulated into a part's size
pub const DEFAULT_HEADER_OVERHEAD: u64 = 100;

/// Default record marker suffix
pub const DEFAULT_RECORD_SUFFIX: &str = "DAT";

/// Role of a direct child of the document root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildRole {
    /// Unit of partitioning
    Record,
    /// Scaffolding copied into every part
    Wrapper,
}

/// Tag-name convention that tells records from wrapper elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordMarker {
    suffix: String,
}

impl Default for RecordMarker {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_SUFFIX)
    }
}

impl RecordMarker {
    /// Marker matching tag names that end in `suffix`
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Classify a direct child of the root by its tag name
    #[inline]
    #[must_use]
    pub fn classify(&self, name: &str) -> ChildRole {
        if name.ends_with(&self.suffix) {
            ChildRole::Record
        } else {
            ChildRole::Wrapper
        }
    }
}

/// A source document split into its wrapper and its records
///
/// Wrapper children that appear before the first record form the header; all
/// other wrapper children form the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitDocument {
    head: Element,
    header: Vec<Element>,
    records: Vec<Element>,
    footer: Vec<Element>,
}

impl SplitDocument {
    /// Classify the direct children of `root` once
    #[must_use]
    pub fn from_root(mut root: Element, marker: &RecordMarker) -> Self {
        let mut document = Self {
            head: root.shallow_clone(),
            ..Self::default()
        };

        for child in root.children.drain(..) {
            match marker.classify(&child.name) {
                ChildRole::Record => document.records.push(child),
                ChildRole::Wrapper if document.records.is_empty() => document.header.push(child),
                ChildRole::Wrapper => document.footer.push(child),
            }
        }

        document
    }

    /// Root element name and attributes, without children
    #[must_use]
    pub const fn head(&self) -> &Element {
        &self.head
    }

    /// Wrapper elements placed before the records
    #[must_use]
    pub fn header(&self) -> &[Element] {
        &self.header
    }

    /// Records in source order
    #[must_use]
    pub fn records(&self) -> &[Element] {
        &self.records
    }

    /// Wrapper elements placed after the records
    #[must_use]
    pub fn footer(&self) -> &[Element] {
        &self.footer
    }

    /// The root with its wrapper children only
    #[must_use]
    pub fn wrapper_element(&self) -> Element {
        let mut wrapper = self.head.clone();
        wrapper.children.extend(self.header.iter().cloned());
        wrapper.children.extend(self.footer.iter().cloned());
        wrapper
    }
}

/// One output part: the wrapper plus a run of consecutive records
#[derive(Clone)]
pub struct Partition<'a> {
    number: usize,
    document: &'a SplitDocument,
    records: Range<usize>,
    estimated_bytes: u64,
}

impl std::fmt::Debug for Partition<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("number", &self.number)
            .field("records", &self.records)
            .field("estimated_bytes", &self.estimated_bytes)
            .finish()
    }
}

impl<'a> Partition<'a> {
    /// 1-based sequence number
    #[must_use]
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Indices of this part's records in the source record sequence
    #[must_use]
    pub fn record_range(&self) -> Range<usize> {
        self.records.clone()
    }

    /// This part's records
    #[must_use]
    pub fn records(&self) -> &'a [Element] {
        &self.document.records[self.records.clone()]
    }

    /// Estimated size when the last record was added
    #[must_use]
    pub const fn estimated_bytes(&self) -> u64 {
        self.estimated_bytes
    }

    fn children(&self) -> impl Iterator<Item = &'a Element> {
        self.document
            .header
            .iter()
            .chain(self.records())
            .chain(self.document.footer.iter())
    }

    /// Write the part as a pretty-printed XML document
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying writer.
    pub fn write_to<W: Write>(&self, out: W) -> io::Result<()> {
        write_document_with_children(&self.document.head, self.children(), out)
    }
}

/// Greedy size-bounded packer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partitioner {
    max_bytes: u64,
    estimator: SizeEstimator,
    header_overhead: u64,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

impl Partitioner {
    /// Packer with the given size limit and default estimator and overhead
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            estimator: SizeEstimator::default(),
            header_overhead: DEFAULT_HEADER_OVERHEAD,
        }
    }

    /// Builder: replace the size estimator
    #[must_use]
    pub const fn with_estimator(mut self, estimator: SizeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Builder: replace the declaration allowance
    #[must_use]
    pub const fn with_header_overhead(mut self, header_overhead: u64) -> Self {
        self.header_overhead = header_overhead;
        self
    }

    /// Pack the records of `document` into parts
    ///
    /// Parts come back numbered from 1 in source order. A document without
    /// records yields no parts.
    pub fn plan<'a>(
        &self,
        document: &'a SplitDocument,
        observer: &mut dyn ProgressObserver,
    ) -> Vec<Partition<'a>> {
        let total = document.records.len();
        let base_size = self.estimator.estimate(&document.wrapper_element());
        debug!(
            "Packing {total} records, limit {} bytes, wrapper {base_size} bytes",
            self.max_bytes
        );

        let mut partitions = Vec::new();
        let mut start = 0;
        let mut current_size = base_size;

        for (index, record) in document.records.iter().enumerate() {
            let record_size = self.estimator.estimate(record);

            let would_exceed = current_size + record_size + self.header_overhead > self.max_bytes;
            if would_exceed && index > start {
                seal(&mut partitions, document, start..index, current_size, observer);
                start = index;
                current_size = base_size;
            }

            current_size += record_size;
            observer.record_planned(index + 1, total);
        }

        if start < total {
            seal(&mut partitions, document, start..total, current_size, observer);
        }

        partitions
    }
}

fn seal<'a>(
    partitions: &mut Vec<Partition<'a>>,
    document: &'a SplitDocument,
    records: Range<usize>,
    estimated_bytes: u64,
    observer: &mut dyn ProgressObserver,
) {
    let partition = Partition {
        number: partitions.len() + 1,
        document,
        records,
        estimated_bytes,
    };
    observer.partition_sealed(
        partition.number,
        partition.records.len(),
        partition.estimated_bytes,
    );
    partitions.push(partition);
}
