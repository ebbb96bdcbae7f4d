//! This library provides high-throughput reading and transformation of FASTQ
//! files (plain or gzip-compressed). The input is cut into chunks of whole
//! records, which are parsed and transformed by a pool of worker threads
//! while a single producer reads and decompresses the file. The output is
//! put back into file order before it reaches the caller, so results are
//! identical to sequential processing for any thread count.
//!
//! Reading and decompression cannot be parallelized (gzip streams are only
//! sequentially accessible), but parsing and the per-record work can, and
//! the per-character quality/trim loops run over raw bytes without
//! allocations.
//!
//! The FASTQ parser expects single-line records: groups of exactly 4 lines
//! (header starting with `@`, sequence, `+` separator, qualities of the
//! same length as the sequence). Multi-line FASTQ is not supported.
//!
//! # Example: counting and iterating
//!
//! ```no_run
//! use fq_io::reader::Reader;
//! use fq_io::record::Record;
//!
//! let reader = Reader::from_path("seqs.fastq").unwrap();
//!
//! println!("{} reads", reader.count_reads().unwrap());
//!
//! for record in reader.records() {
//!     let record = record.expect("Error reading record");
//!     println!("{}", record.id().unwrap());
//! }
//! ```
//!
//! # Example: trimming
//!
//! Transformations run in the worker threads and return new records,
//! leaving their input untouched:
//!
//! ```no_run
//! use fq_io::reader::Reader;
//!
//! let reader = Reader::from_path("seqs.fastq.gz").unwrap().with_threads(8);
//!
//! // remove 5 bases from the 5' end and 3 bases from the 3' end
//! for record in reader.trim(5, 3).unwrap() {
//!     println!("{}", record.seq.len());
//! }
//! ```
//!
//! # Lower-level access
//!
//! The pipeline pieces are public: a [`source::ByteSource`] feeds a
//! [`chunk::ChunkSplitter`], and [`parallel::read_parallel`] runs any
//! per-chunk function over the resulting chunks:
//!
//! ```
//! use fq_io::chunk::ChunkSplitter;
//! use fq_io::source::ByteSource;
//!
//! let fastq = b"@id\nACGT\n+\nIIII\n";
//! let mut splitter = ChunkSplitter::new(ByteSource::new(&fastq[..]), 1024);
//!
//! let chunk = splitter.next_chunk(Vec::new()).unwrap().unwrap();
//! assert_eq!(chunk.count_records().unwrap(), 1);
//! ```

#[macro_use]
extern crate serde_derive;

macro_rules! try_opt {
    ($expr: expr) => {
        match $expr {
            Ok(item) => item,
            Err(e) => return Some(Err(::std::convert::From::from(e))),
        }
    };
}

macro_rules! unwrap_or {
    ($expr:expr, $or:block) => {
        match $expr {
            Some(item) => item,
            None => $or,
        }
    };
}

pub mod chunk;
pub mod error;
mod export;
pub mod parallel;
pub mod parse;
pub mod reader;
pub mod record;
pub mod reorder;
pub mod source;
pub mod transform;

pub use crate::error::{Error, ErrorPosition};
pub use crate::reader::{Reader, Records};
pub use crate::record::{OwnedRecord, Record, RefRecord};
pub use crate::transform::Transform;

/// Remove a final '\r' from a byte slice
#[inline]
pub(crate) fn trim_cr(line: &[u8]) -> &[u8] {
    if let Some((&b'\r', remaining)) = line.split_last() {
        remaining
    } else {
        line
    }
}
