//! Byte stream abstraction over plain and gzip-compressed files
//!
//! A [`ByteSource`] hands out raw (decompressed) bytes strictly in file
//! order. Gzip streams are not seekable, so the source exposes no way to
//! rewind; it is meant to be owned by a single producer that reads it to
//! exhaustion.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use buffer_redux::BufReader;
use flate2::read::MultiGzDecoder;

use crate::error::Error;

const BUFSIZE: usize = 64 * 1024;

/// Magic bytes at the start of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression format of the underlying stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    Gzip,
}

/// Sequential reader over the raw bytes of a plain or gzip-compressed input.
pub struct ByteSource {
    inner: Box<dyn Read + Send>,
    format: Format,
    offset: u64,
}

impl ByteSource {
    /// Opens a file, detecting gzip input by the `.gz` extension or by the
    /// gzip magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ByteSource, Error> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        let file = File::open(path)?;
        let inner: Box<dyn Read + Send> = match format {
            Format::Plain => Box::new(BufReader::with_capacity(BUFSIZE, file)),
            Format::Gzip => {
                Box::new(MultiGzDecoder::new(BufReader::with_capacity(BUFSIZE, file)))
            }
        };
        Ok(ByteSource {
            inner,
            format,
            offset: 0,
        })
    }

    /// Creates a source reading plain (uncompressed) bytes from `reader`.
    ///
    /// # Example:
    ///
    /// ```
    /// use fq_io::source::ByteSource;
    ///
    /// let fastq = b"@id\nACGT\n+\nIIII\n";
    /// let mut source = ByteSource::new(&fastq[..]);
    /// let mut buf = Vec::new();
    /// let n = source.read_block(&mut buf, 1024).unwrap();
    /// assert_eq!(n, fastq.len());
    /// ```
    pub fn new<R: Read + Send + 'static>(reader: R) -> ByteSource {
        ByteSource {
            inner: Box::new(reader),
            format: Format::Plain,
            offset: 0,
        }
    }

    /// Returns the detected compression format.
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Byte offset of the next read. For gzip input this counts
    /// decompressed bytes.
    #[inline]
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Appends up to `max` bytes to `buf` and returns the number of bytes
    /// appended, which is 0 only at the end of the stream.
    /// Code adapted from `io::Read::read_exact`.
    pub fn read_block(&mut self, buf: &mut Vec<u8>, max: usize) -> Result<usize, Error> {
        let start = buf.len();
        buf.resize(start + max, 0);
        let mut n_read = 0;
        while n_read < max {
            match self.inner.read(&mut buf[start + n_read..]) {
                Ok(0) => break,
                Ok(n) => n_read += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    buf.truncate(start + n_read);
                    return Err(self.read_error(e));
                }
            }
        }
        buf.truncate(start + n_read);
        self.offset += n_read as u64;
        Ok(n_read)
    }

    fn read_error(&self, e: io::Error) -> Error {
        match self.format {
            Format::Gzip
                if matches!(
                    e.kind(),
                    io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData
                ) =>
            {
                Error::Decompression(e)
            }
            _ => Error::Io(e),
        }
    }
}

fn detect_format(path: &Path) -> Result<Format, Error> {
    if path.extension().map_or(false, |ext| ext == "gz") {
        return Ok(Format::Gzip);
    }
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let mut n_read = 0;
    while n_read < magic.len() {
        match file.read(&mut magic[n_read..]) {
            Ok(0) => break,
            Ok(n) => n_read += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    if n_read == magic.len() && magic == GZIP_MAGIC {
        Ok(Format::Gzip)
    } else {
        Ok(Format::Plain)
    }
}
