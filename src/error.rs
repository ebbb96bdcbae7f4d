//! Error types shared by all stages of the reading pipeline

use std::error::Error as StdError;
use std::fmt;
use std::io;

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;

/// Errors that can occur while reading, parsing or exporting FASTQ data.
#[derive(Debug)]
pub enum Error {
    /// I/O error on the underlying file or stream
    Io(io::Error),
    /// Corrupt gzip input
    Decompression(io::Error),
    /// Invalid start byte encountered (expected `@`)
    InvalidStart {
        /// Byte found instead.
        found: u8,
        /// Position within the input. `ErrorPosition::id` will be `None`.
        pos: ErrorPosition,
    },
    /// Invalid separator byte encountered (expected `+`)
    InvalidSep {
        /// Byte found instead.
        found: u8,
        /// Position within the input
        pos: ErrorPosition,
    },
    /// Sequence and quality lengths are not equal
    UnequalLengths {
        /// Length of sequence
        seq: usize,
        /// Length of qualities
        qual: usize,
        /// Position within the input.
        /// `ErrorPosition::line` has the position of the header, not sequence/qualities
        pos: ErrorPosition,
    },
    /// Truncated record found at the end of the input
    UnexpectedEnd {
        /// Position within the input.
        pos: ErrorPosition,
    },
    /// Writing to the columnar export sink failed
    Export(ParquetError),
}

/// Line number (and record ID, if available) of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPosition {
    /// Line number where the error occurred (starting with 1)
    pub line: u64,
    /// ID of the record if available
    pub id: Option<String>,
}

impl fmt::Display for ErrorPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(id) = self.id.as_ref() {
            write!(f, "record '{}' at ", id)?;
        }
        write!(f, "line {}", self.line)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => e.fmt(f),
            Error::Decompression(ref e) => write!(f, "gzip decompression failed: {}", e),
            Error::InvalidStart { found, ref pos } => write!(
                f,
                "FASTQ parse error: expected '@' at record start but found '{}' ({}).",
                (found as char).escape_default(),
                pos
            ),
            Error::InvalidSep { found, ref pos } => write!(
                f,
                "FASTQ parse error: expected '+' separator but found '{}' ({}).",
                (found as char).escape_default(),
                pos
            ),
            Error::UnequalLengths { seq, qual, ref pos } => write!(
                f,
                "FASTQ parse error: sequence length is {}, but quality length is {} ({}).",
                seq, qual, pos
            ),
            Error::UnexpectedEnd { ref pos } => {
                write!(f, "FASTQ parse error: unexpected end of input ({}).", pos)
            }
            Error::Export(ref e) => write!(f, "parquet export failed: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<ParquetError> for Error {
    fn from(e: ParquetError) -> Error {
        Error::Export(e)
    }
}

impl From<ArrowError> for Error {
    fn from(e: ArrowError) -> Error {
        Error::Export(ParquetError::General(e.to_string()))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref e) | Error::Decompression(ref e) => Some(e),
            Error::Export(ref e) => Some(e),
            _ => None,
        }
    }
}
