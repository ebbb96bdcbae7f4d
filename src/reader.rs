//! High-level FASTQ reader
//!
//! [`Reader`] wires the byte source, chunk splitter, worker pool and
//! reordering stage into the operations exposed by this crate. Every
//! operation opens the file afresh and drives the whole pipeline, so a
//! reader can be reused; iteration always restarts from the beginning
//! of the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use crate::chunk::ChunkSplitter;
use crate::error::Error;
use crate::export::ParquetSink;
use crate::parallel::read_parallel;
use crate::record::OwnedRecord;
use crate::source::ByteSource;
use crate::transform::Transform;

const DEFAULT_THREADS: u32 = 4;
const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Capacity of the channel feeding a [`Records`] iterator.
const RECORD_QUEUE_LEN: usize = 1024;

/// Multi-threaded FASTQ reader.
///
/// # Example:
///
/// ```no_run
/// use fq_io::reader::Reader;
/// use fq_io::record::Record;
///
/// let reader = Reader::from_path("seqs.fastq").unwrap().with_threads(4);
///
/// println!("{} reads", reader.count_reads().unwrap());
///
/// for record in reader.records() {
///     let record = record.unwrap();
///     println!("{}", record.id().unwrap());
/// }
/// ```
pub struct Reader {
    path: PathBuf,
    threads: u32,
    chunk_size: usize,
}

impl Reader {
    /// Creates a reader for a FASTQ or FASTQ.gz file with the default
    /// worker count (4) and chunk size target (1 MiB).
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Reader> {
        let path = path.as_ref().to_owned();
        fs::metadata(&path)?;
        Ok(Reader {
            path,
            threads: DEFAULT_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Sets the number of worker threads. The minimum is 1.
    pub fn with_threads(mut self, threads: u32) -> Reader {
        assert!(threads > 0);
        self.threads = threads;
        self
    }

    /// Sets the chunk size target in bytes. Chunks may exceed the target
    /// to end at a record boundary.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Reader {
        assert!(chunk_size > 0);
        self.chunk_size = chunk_size;
        self
    }

    fn queue_len(&self) -> usize {
        self.threads as usize * 2
    }

    fn splitter(&self) -> Result<ChunkSplitter, Error> {
        let source = ByteSource::from_path(&self.path)?;
        Ok(ChunkSplitter::new(source, self.chunk_size))
    }

    /// Counts the records in the file.
    pub fn count_reads(&self) -> Result<u64, Error> {
        let splitter = self.splitter()?;
        let total = read_parallel(
            splitter,
            self.threads,
            self.queue_len(),
            |chunk| chunk.count_records(),
            |results| {
                let mut total = 0;
                while let Some(count) = results.next() {
                    total += count?;
                }
                Ok::<u64, Error>(total)
            },
        )?;
        debug!("counted {} records in {}", total, self.path.display());
        Ok(total)
    }

    fn collect(&self, transform: Transform) -> Result<Vec<OwnedRecord>, Error> {
        let splitter = self.splitter()?;
        read_parallel(
            splitter,
            self.threads,
            self.queue_len(),
            move |chunk| transform.apply_chunk(chunk),
            |results| {
                let mut records = Vec::new();
                while let Some(res) = results.next() {
                    records.extend(res?);
                }
                Ok(records)
            },
        )
    }

    /// Removes `five_prime` bases from the start and `three_prime` bases
    /// from the end of every record and returns the trimmed records in
    /// file order.
    pub fn trim(&self, five_prime: usize, three_prime: usize) -> Result<Vec<OwnedRecord>, Error> {
        self.collect(Transform::Trim {
            five_prime,
            three_prime,
        })
    }

    /// Returns the records whose mean Phred+33 quality is `>= threshold`,
    /// in file order.
    pub fn filter_quality(&self, threshold: u8) -> Result<Vec<OwnedRecord>, Error> {
        self.collect(Transform::FilterQuality { threshold })
    }

    /// Cuts every record down to the `[start, end)` slice of its sequence
    /// (and quality) and returns the results in file order.
    pub fn extract(&self, start: usize, end: usize) -> Result<Vec<OwnedRecord>, Error> {
        self.collect(Transform::Extract { start, end })
    }

    /// Like [`extract`](Reader::extract), but streams `(header, extracted)`
    /// rows to `<prefix>.parquet` instead of collecting them in memory.
    /// Returns the path of the written file.
    pub fn extract_to_parquet(
        &self,
        start: usize,
        end: usize,
        prefix: &str,
    ) -> Result<PathBuf, Error> {
        let path = PathBuf::from(format!("{}.parquet", prefix));
        let splitter = self.splitter()?;
        let transform = Transform::Extract { start, end };
        let mut sink = ParquetSink::create(&path)?;
        read_parallel(
            splitter,
            self.threads,
            self.queue_len(),
            move |chunk| transform.apply_chunk(chunk),
            |results| {
                while let Some(res) = results.next() {
                    sink.write_records(&res?)?;
                }
                sink.finish()
            },
        )?;
        info!("saved parquet file: {}", path.display());
        Ok(path)
    }

    /// Returns a lazy iterator over all records, in file order. The
    /// pipeline runs on a background thread; dropping the iterator stops
    /// it. Calling `records()` again restarts from the beginning of the
    /// file.
    pub fn records(&self) -> Records {
        let (send, recv) = mpsc::sync_channel(RECORD_QUEUE_LEN);
        let path = self.path.clone();
        let threads = self.threads;
        let chunk_size = self.chunk_size;
        let queue_len = self.queue_len();

        let handle = thread::spawn(move || {
            let source = match ByteSource::from_path(&path) {
                Ok(source) => source,
                Err(e) => {
                    send.send(Err(e)).ok();
                    return;
                }
            };
            let splitter = ChunkSplitter::new(source, chunk_size);
            read_parallel(
                splitter,
                threads,
                queue_len,
                |chunk| Transform::Identity.apply_chunk(chunk),
                |results| {
                    while let Some(res) = results.next() {
                        match res {
                            Ok(records) => {
                                for record in records {
                                    if send.send(Ok(record)).is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                send.send(Err(e)).ok();
                                return;
                            }
                        }
                    }
                },
            );
        });

        Records {
            recv: Some(recv),
            handle: Some(handle),
            finished: false,
        }
    }
}

/// Lazy iterator over all records of a file, in file order.
///
/// After an error is yielded the iterator is exhausted; records yielded
/// before the error remain valid.
pub struct Records {
    recv: Option<mpsc::Receiver<Result<OwnedRecord, Error>>>,
    handle: Option<thread::JoinHandle<()>>,
    finished: bool,
}

impl Iterator for Records {
    type Item = Result<OwnedRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let recv = self.recv.as_ref()?;
        match recv.recv() {
            Ok(Ok(record)) => Some(Ok(record)),
            Ok(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}

impl Drop for Records {
    fn drop(&mut self) {
        // closing the channel stops the pipeline; join before returning
        // so no thread outlives the iterator
        self.recv.take();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
