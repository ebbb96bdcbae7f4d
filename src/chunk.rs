//! Splitting the byte stream into chunks of whole records
//!
//! A [`Chunk`] holds a whole number of complete 4-line FASTQ records,
//! tagged with its position in the input so that results computed from it
//! can be put back into file order after parallel processing. The
//! [`ChunkSplitter`] produces chunks of roughly `chunk_size` bytes: the
//! boundary search runs forward from the size target to the next newline
//! that completes a multiple-of-4 line count, so a record is never split
//! across two chunks. Bytes past the boundary are carried over to the
//! next call.

use memchr::memchr_iter;

use crate::error::{Error, ErrorPosition};
use crate::parse::ChunkRecords;
use crate::source::ByteSource;
use crate::trim_cr;

/// Bytes requested per read while searching for a record boundary past
/// the chunk-size target.
const BOUNDARY_READ: usize = 64 * 1024;

/// A batch of complete FASTQ records, processed as one parallel unit.
#[derive(Debug, Clone)]
pub struct Chunk {
    index: u64,
    first_line: u64,
    bytes: Vec<u8>,
}

impl Chunk {
    /// Position of this chunk in the input (0-based, monotonically increasing).
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Line number of the first line of this chunk (starting with 1).
    #[inline]
    pub fn first_line(&self) -> u64 {
        self.first_line
    }

    /// The raw bytes of the chunk.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns an iterator over the records of this chunk.
    pub fn records(&self) -> ChunkRecords<'_> {
        ChunkRecords::new(&self.bytes, self.first_line)
    }

    /// Parses the whole chunk and returns the number of records.
    pub fn count_records(&self) -> Result<u64, Error> {
        let mut n = 0;
        for record in self.records() {
            record?;
            n += 1;
        }
        Ok(n)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads a [`ByteSource`] and cuts it into [`Chunk`]s at record boundaries.
///
/// The splitter owns the source exclusively; chunk production is strictly
/// sequential while the produced chunks can be processed concurrently.
pub struct ChunkSplitter {
    source: ByteSource,
    chunk_size: usize,
    tail: Vec<u8>,
    trailing_err: Option<Error>,
    next_index: u64,
    next_line: u64,
    finished: bool,
}

impl ChunkSplitter {
    /// Creates a splitter producing chunks of at least `chunk_size` bytes
    /// (a soft target: chunks extend to the next record boundary).
    pub fn new(source: ByteSource, chunk_size: usize) -> ChunkSplitter {
        assert!(chunk_size > 0);
        ChunkSplitter {
            source,
            chunk_size,
            tail: Vec::new(),
            trailing_err: None,
            next_index: 0,
            next_line: 1,
            finished: false,
        }
    }

    /// Index that the next produced chunk will carry.
    #[inline]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Produces the next chunk, reusing `buf` as its backing storage.
    /// Returns `None` once the input is exhausted.
    pub fn next_chunk(&mut self, mut buf: Vec<u8>) -> Option<Result<Chunk, Error>> {
        if let Some(e) = self.trailing_err.take() {
            self.finished = true;
            return Some(Err(e));
        }
        if self.finished {
            return None;
        }
        buf.clear();
        buf.append(&mut self.tail);

        let mut eof = false;
        while buf.len() < self.chunk_size {
            let remaining = self.chunk_size - buf.len();
            let n = try_opt!(self.source.read_block(&mut buf, remaining));
            if n == 0 {
                eof = true;
                break;
            }
        }

        let mut lines = 0u64;
        let mut scan_from = 0;
        let cut = loop {
            let mut found = None;
            for offset in memchr_iter(b'\n', &buf[scan_from..]) {
                let end = scan_from + offset + 1;
                lines += 1;
                if lines % 4 == 0 && end >= self.chunk_size {
                    found = Some(end);
                    break;
                }
            }
            if let Some(end) = found {
                break Some(end);
            }
            scan_from = buf.len();
            if eof {
                break None;
            }
            let n = try_opt!(self.source.read_block(&mut buf, BOUNDARY_READ));
            if n == 0 {
                eof = true;
            }
        };

        match cut {
            Some(end) => {
                self.tail.extend_from_slice(&buf[end..]);
                buf.truncate(end);
                Some(Ok(self.emit(buf, lines)))
            }
            None => self.last_chunk(buf),
        }
    }

    fn emit(&mut self, bytes: Vec<u8>, lines: u64) -> Chunk {
        let chunk = Chunk {
            index: self.next_index,
            first_line: self.next_line,
            bytes,
        };
        self.next_index += 1;
        self.next_line += lines;
        chunk
    }

    // End of input: the remainder is either a whole number of records
    // (the last line may lack its newline), optionally followed by blank
    // lines, or truncated data. Truncated data after complete records is
    // reported on the call after those records were handed out.
    fn last_chunk(&mut self, mut buf: Vec<u8>) -> Option<Result<Chunk, Error>> {
        if buf.is_empty() {
            self.finished = true;
            return None;
        }

        let mut lines = 0u64;
        let mut group_end = 0usize;
        let mut group_lines = 0u64;
        for offset in memchr_iter(b'\n', &buf) {
            lines += 1;
            if lines % 4 == 0 {
                group_end = offset + 1;
                group_lines = lines;
            }
        }
        if buf.last() != Some(&b'\n') {
            lines += 1;
            if lines % 4 == 0 {
                group_end = buf.len();
                group_lines = lines;
            }
        }

        let rest = &buf[group_end..];
        if !rest.split(|c| *c == b'\n').all(|line| trim_cr(line).is_empty()) {
            let err = Error::UnexpectedEnd {
                pos: ErrorPosition {
                    line: self.next_line + group_lines,
                    id: None,
                },
            };
            if group_end == 0 {
                self.finished = true;
                return Some(Err(err));
            }
            self.trailing_err = Some(err);
        } else {
            self.finished = true;
        }

        if group_end == 0 {
            return None;
        }
        buf.truncate(group_end);
        Some(Ok(self.emit(buf, group_lines)))
    }
}
