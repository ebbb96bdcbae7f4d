//! Parsing chunk bytes into records

use memchr::memchr;

use crate::error::{Error, ErrorPosition};
use crate::record::RefRecord;
use crate::trim_cr;

/// Iterator over the records of one chunk, yielding [`RefRecord`]s that
/// borrow from the chunk buffer.
///
/// Each group of 4 lines is validated: the header must start with `@`,
/// the third line with `+`, and sequence and quality must have equal
/// lengths. The first structural violation ends iteration; the error
/// carries the absolute line number within the input.
pub struct ChunkRecords<'a> {
    buf: &'a [u8],
    pos: usize,
    line: u64,
    finished: bool,
}

impl<'a> ChunkRecords<'a> {
    pub(crate) fn new(buf: &'a [u8], first_line: u64) -> ChunkRecords<'a> {
        ChunkRecords {
            buf,
            pos: 0,
            line: first_line,
            finished: false,
        }
    }

    // Next line without its terminator; the final line may be unterminated.
    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.buf.len() {
            return None;
        }
        match memchr(b'\n', &self.buf[self.pos..]) {
            Some(offset) => {
                let line = &self.buf[self.pos..self.pos + offset];
                self.pos += offset + 1;
                Some(line)
            }
            None => {
                let line = &self.buf[self.pos..];
                self.pos = self.buf.len() + 1;
                Some(line)
            }
        }
    }

    fn error_pos(&self, offset: u64, head: Option<&[u8]>) -> ErrorPosition {
        let id = head.and_then(|h| {
            let h = trim_cr(h);
            if h.len() > 1 {
                h[1..]
                    .split(|b| *b == b' ')
                    .next()
                    .map(|id| String::from_utf8_lossy(id).into())
            } else {
                None
            }
        });
        ErrorPosition {
            line: self.line + offset,
            id,
        }
    }

    fn fail(&mut self, e: Error) -> Option<Result<RefRecord<'a>, Error>> {
        self.finished = true;
        Some(Err(e))
    }
}

impl<'a> Iterator for ChunkRecords<'a> {
    type Item = Result<RefRecord<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.pos >= self.buf.len() {
            return None;
        }
        let head = unwrap_or!(self.next_line(), {
            return None;
        });
        let seq = unwrap_or!(self.next_line(), {
            let pos = self.error_pos(1, Some(head));
            return self.fail(Error::UnexpectedEnd { pos });
        });
        let sep = unwrap_or!(self.next_line(), {
            let pos = self.error_pos(2, Some(head));
            return self.fail(Error::UnexpectedEnd { pos });
        });
        let qual = unwrap_or!(self.next_line(), {
            let pos = self.error_pos(3, Some(head));
            return self.fail(Error::UnexpectedEnd { pos });
        });

        if head.first() != Some(&b'@') {
            let found = head.first().copied().unwrap_or(b'\n');
            let pos = self.error_pos(0, None);
            return self.fail(Error::InvalidStart { found, pos });
        }
        if sep.first() != Some(&b'+') {
            let found = sep.first().copied().unwrap_or(b'\n');
            let pos = self.error_pos(2, Some(head));
            return self.fail(Error::InvalidSep { found, pos });
        }
        let seq = trim_cr(seq);
        let qual = trim_cr(qual);
        if seq.len() != qual.len() {
            let pos = self.error_pos(0, Some(head));
            return self.fail(Error::UnequalLengths {
                seq: seq.len(),
                qual: qual.len(),
                pos,
            });
        }

        let record = RefRecord::new(trim_cr(&head[1..]), seq, qual);
        self.line += 4;
        Some(Ok(record))
    }
}
