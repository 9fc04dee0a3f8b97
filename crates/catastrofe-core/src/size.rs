//! Approximate serialised size of an element subtree
//!
//! Output parts are pretty-printed only when they are written, but packing
//! decisions are made long before that. The estimate is the compact byte
//! length plus a fixed allowance per element for the indentation and line
//! breaks the pretty-printer will add. It is deliberately inexact.

use crate::document::{write_compact, Element};
use std::io::{self, Write};

/// Default indentation allowance per element, in bytes
///
/// Roughly two characters of indentation on the opening tag and two on the
/// closing one.
pub const DEFAULT_PER_NODE_OVERHEAD: u64 = 4;

/// `io::Write` sink that only counts bytes
#[derive(Debug, Default, Clone, Copy)]
struct ByteCounter(u64);

impl Write for ByteCounter {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Estimates the pretty-printed byte footprint of element subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeEstimator {
    per_node_overhead: u64,
}

impl Default for SizeEstimator {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_PER_NODE_OVERHEAD)
    }
}

impl SizeEstimator {
    /// Create an estimator with the given per-element allowance
    #[inline]
    #[must_use]
    pub const fn new(per_node_overhead: u64) -> Self {
        Self { per_node_overhead }
    }

    /// Estimated size of `element` and its subtree, in bytes
    #[must_use]
    pub fn estimate(&self, element: &Element) -> u64 {
        compact_len(element) + element.element_count() as u64 * self.per_node_overhead
    }
}

/// Exact length of the compact serialisation of `element`
#[must_use]
pub fn compact_len(element: &Element) -> u64 {
    let mut counter = ByteCounter::default();
    // ByteCounter never fails
    let _ = write_compact(element, &mut counter);
    counter.0
}
