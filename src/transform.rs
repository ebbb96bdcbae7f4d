//! Per-record transformations
//!
//! All functions are pure: they take a record and return a new
//! [`OwnedRecord`], never mutating their input. Quality scoring works on
//! raw bytes with integer arithmetic, so the inclusive mean-threshold
//! comparison is exact.

use crate::chunk::Chunk;
use crate::error::Error;
use crate::record::{OwnedRecord, Record};

/// Offset of the Phred+33 quality encoding
const PHRED_OFFSET: u64 = 33;

/// A per-record transformation applied by the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Copy records unchanged
    Identity,
    /// Remove bases from the 5' and 3' ends
    Trim {
        five_prime: usize,
        three_prime: usize,
    },
    /// Keep only records with mean Phred quality `>= threshold`
    FilterQuality { threshold: u8 },
    /// Cut sequence and quality down to `[start, end)`
    Extract { start: usize, end: usize },
}

impl Transform {
    /// Applies the transformation to a single record. Returns `None` if
    /// the record is filtered out.
    pub fn apply<R: Record>(&self, record: &R) -> Option<OwnedRecord> {
        match *self {
            Transform::Identity => Some(record.to_owned_record()),
            Transform::Trim {
                five_prime,
                three_prime,
            } => Some(trim(record, five_prime, three_prime)),
            Transform::FilterQuality { threshold } => {
                if passes_quality(record.qual(), threshold) {
                    Some(record.to_owned_record())
                } else {
                    None
                }
            }
            Transform::Extract { start, end } => Some(extract(record, start, end)),
        }
    }

    /// Parses a chunk and applies the transformation to each of its records.
    pub fn apply_chunk(&self, chunk: &Chunk) -> Result<Vec<OwnedRecord>, Error> {
        let mut out = Vec::new();
        for record in chunk.records() {
            let record = record?;
            if let Some(transformed) = self.apply(&record) {
                out.push(transformed);
            }
        }
        Ok(out)
    }
}

/// Removes `five_prime` bases from the start and `three_prime` bases from
/// the end of sequence and quality. Degenerate combinations yield an empty
/// sequence/quality pair; the header is always preserved.
///
/// # Example:
///
/// ```
/// use fq_io::record::OwnedRecord;
/// use fq_io::transform;
///
/// let record = OwnedRecord {
///     head: b"read1".to_vec(),
///     seq: b"ACGTACGTACGT".to_vec(),
///     qual: b"IIIIIIIIIIII".to_vec(),
/// };
/// assert_eq!(transform::trim(&record, 2, 2).seq, b"GTACGTAC");
/// ```
pub fn trim<R: Record>(record: &R, five_prime: usize, three_prime: usize) -> OwnedRecord {
    let len = record.seq().len();
    let start = five_prime.min(len);
    let end = len.saturating_sub(three_prime).max(start);
    OwnedRecord {
        head: record.head().to_vec(),
        seq: record.seq()[start..end].to_vec(),
        qual: record.qual()[start..end].to_vec(),
    }
}

/// Cuts sequence and quality down to `[start, end)`, clamped to the
/// sequence length. The header is not modified.
pub fn extract<R: Record>(record: &R, start: usize, end: usize) -> OwnedRecord {
    let len = record.seq().len();
    let start = start.min(len);
    let end = end.min(len).max(start);
    OwnedRecord {
        head: record.head().to_vec(),
        seq: record.seq()[start..end].to_vec(),
        qual: record.qual()[start..end].to_vec(),
    }
}

/// Mean Phred+33 quality score of a quality string.
pub fn mean_quality(qual: &[u8]) -> f64 {
    if qual.is_empty() {
        return 0.0;
    }
    let sum: u64 = qual.iter().map(|&q| u64::from(q)).sum();
    sum as f64 / qual.len() as f64 - PHRED_OFFSET as f64
}

/// Whether the mean Phred quality is `>= threshold` (inclusive).
/// Zero-length quality strings never pass.
#[inline]
pub fn passes_quality(qual: &[u8], threshold: u8) -> bool {
    if qual.is_empty() {
        return false;
    }
    let sum: u64 = qual.iter().map(|&q| u64::from(q)).sum();
    sum >= (u64::from(threshold) + PHRED_OFFSET) * qual.len() as u64
}
