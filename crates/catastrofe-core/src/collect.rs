//! Record Collector: flat records across many documents, optionally deduplicated

use crate::document::Element;
use crate::extract::{extract, records, FlatRecord};
use crate::schema::ProjectionSchema;
use log::debug;
use std::collections::HashSet;

/// What one document contributed to a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentTally {
    /// Records appended to the output
    pub retained: usize,
    /// Records dropped because their dedup key had been seen before
    pub duplicates: usize,
}

/// Accumulates flat records document by document
///
/// With dedup enabled the first record carrying a given key wins and later
/// ones are dropped silently. Keys are remembered across documents, so the
/// outcome depends only on the order documents are fed in.
#[derive(Debug)]
pub struct RecordCollector<'s> {
    schema: &'s ProjectionSchema,
    seen: Option<HashSet<String>>,
    rows: Vec<FlatRecord>,
    duplicates: usize,
}

impl<'s> RecordCollector<'s> {
    /// Create an empty collector
    #[must_use]
    pub fn new(schema: &'s ProjectionSchema, dedup: bool) -> Self {
        Self {
            schema,
            seen: dedup.then(HashSet::new),
            rows: Vec::new(),
            duplicates: 0,
        }
    }

    /// Schema records are projected onto
    #[must_use]
    pub const fn schema(&self) -> &'s ProjectionSchema {
        self.schema
    }

    /// Whether repeated keys are dropped
    #[must_use]
    pub const fn dedup_enabled(&self) -> bool {
        self.seen.is_some()
    }

    /// Extract every record of `root` in document order
    pub fn collect_document(&mut self, root: &Element) -> DocumentTally {
        let mut tally = DocumentTally::default();
        for record in records(root, self.schema) {
            let flat = extract(record, self.schema);
            if let Some(seen) = &mut self.seen {
                if !seen.insert(flat.concat(self.schema.dedup_key)) {
                    tally.duplicates += 1;
                    continue;
                }
            }
            self.rows.push(flat);
            tally.retained += 1;
        }
        self.duplicates += tally.duplicates;
        debug!(
            "Collected {} records from <{}> ({} duplicates)",
            tally.retained, root.name, tally.duplicates
        );
        tally
    }

    /// Rows collected so far
    #[must_use]
    pub fn rows(&self) -> &[FlatRecord] {
        &self.rows
    }

    /// Total duplicates dropped so far
    #[must_use]
    pub const fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Consume the collector, returning rows in collection order
    #[must_use]
    pub fn finish(self) -> Vec<FlatRecord> {
        self.rows
    }
}

/// Collect every record of `documents`, in order
pub fn collect<'d, I>(documents: I, schema: &ProjectionSchema, dedup: bool) -> Vec<FlatRecord>
where
    I: IntoIterator<Item = &'d Element>,
{
    let mut collector = RecordCollector::new(schema, dedup);
    for document in documents {
        collector.collect_document(document);
    }
    collector.finish()
}
