//! FASTQ record types

use std::io;
use std::str::{self, Utf8Error};

/// FASTQ record trait implemented by both [`RefRecord`] and [`OwnedRecord`]
pub trait Record {
    /// Return the header line of the record (without the leading `@`) as byte slice
    fn head(&self) -> &[u8];
    /// Return the FASTQ sequence as byte slice
    fn seq(&self) -> &[u8];
    /// Return the FASTQ qualities as byte slice
    fn qual(&self) -> &[u8];

    fn id_bytes(&self) -> &[u8] {
        self.head().split(|b| *b == b' ').next().unwrap_or(b"")
    }

    /// Return the ID of the record (everything before an optional space) as string slice
    fn id(&self) -> Result<&str, Utf8Error> {
        str::from_utf8(self.id_bytes())
    }

    fn desc_bytes(&self) -> Option<&[u8]> {
        self.head().splitn(2, |b| *b == b' ').nth(1)
    }

    /// Return the description of the record as string slice, if present. Otherwise, `None` is returned.
    fn desc(&self) -> Option<Result<&str, Utf8Error>> {
        self.desc_bytes().map(str::from_utf8)
    }

    /// Copies the record data into an [`OwnedRecord`]
    fn to_owned_record(&self) -> OwnedRecord {
        OwnedRecord {
            head: self.head().to_vec(),
            seq: self.seq().to_vec(),
            qual: self.qual().to_vec(),
        }
    }

    /// Writes the record to the given `io::Write` instance in the FASTQ format
    #[inline]
    fn write<W: io::Write>(&self, writer: W) -> io::Result<()> {
        write_to(writer, self.head(), self.seq(), self.qual())
    }
}

/// A FASTQ record that borrows its data from a chunk buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord<'a> {
    head: &'a [u8],
    seq: &'a [u8],
    qual: &'a [u8],
}

impl<'a> RefRecord<'a> {
    pub(crate) fn new(head: &'a [u8], seq: &'a [u8], qual: &'a [u8]) -> RefRecord<'a> {
        RefRecord { head, seq, qual }
    }
}

impl<'a> Record for RefRecord<'a> {
    #[inline]
    fn head(&self) -> &[u8] {
        self.head
    }

    #[inline]
    fn seq(&self) -> &[u8] {
        self.seq
    }

    #[inline]
    fn qual(&self) -> &[u8] {
        self.qual
    }
}

/// A FASTQ record that owns its data (requires allocations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedRecord {
    pub head: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl Record for OwnedRecord {
    #[inline]
    fn head(&self) -> &[u8] {
        &self.head
    }

    #[inline]
    fn seq(&self) -> &[u8] {
        &self.seq
    }

    #[inline]
    fn qual(&self) -> &[u8] {
        &self.qual
    }
}

/// Helper function for writing data (not necessarily stored in a `Record` instance)
/// to the FASTQ format
pub fn write_to<W: io::Write>(
    mut writer: W,
    head: &[u8],
    seq: &[u8],
    qual: &[u8],
) -> io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(head)?;
    writer.write_all(b"\n")?;
    writer.write_all(seq)?;
    writer.write_all(b"\n+\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")?;
    Ok(())
}
