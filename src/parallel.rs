//! Parallel chunk processing
//!
//! Chunk production is strictly sequential (the byte source and its
//! decompression cursor cannot be shared), so a single producer thread
//! reads and splits the input while a fixed pool of workers parses and
//! transforms the chunks. Chunk buffers are recycled through an 'empty'
//! channel once their results have been consumed; the number of buffers
//! in circulation bounds the chunks in flight, so the producer blocks
//! instead of running ahead of a slow consumer.
//!
//! Results arrive in completion order and are put back into file order
//! before they reach the calling thread, so the output is identical to
//! sequential processing for any worker count.
//!
//! # Counting records in parallel
//!
//! ```no_run
//! use fq_io::chunk::ChunkSplitter;
//! use fq_io::source::ByteSource;
//! use fq_io::parallel::read_parallel;
//!
//! let source = ByteSource::from_path("seqs.fastq").unwrap();
//! let splitter = ChunkSplitter::new(source, 1 << 20);
//!
//! let total: u64 = read_parallel(splitter, 4, 8,
//!     |chunk| chunk.count_records(),
//!     |results| {
//!         // runs in the calling thread; results come in file order
//!         let mut n = 0;
//!         while let Some(count) = results.next() {
//!             n += count.unwrap();
//!         }
//!         n
//!     });
//! println!("{} records", total);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use crate::chunk::{Chunk, ChunkSplitter};
use crate::error::Error;
use crate::reorder::ReorderBuffer;

// Finished chunk: its index, the worker's output and the spent chunk
// buffer, which goes back into circulation once the output has been
// consumed in order.
type Finished<O> = (u64, Result<O, Error>, Option<Vec<u8>>);

/// Runs the chunk pipeline: `work` is applied to each chunk by one of
/// `n_threads` workers, `func` runs in the calling thread and consumes
/// the results in file order through [`OrderedResults`]. At most
/// `queue_len` chunks are in flight (dispatched but not yet consumed)
/// at any time.
///
/// Returning early from `func` stops the pipeline: no new chunks are
/// dispatched, in-flight work completes and all threads are joined.
pub fn read_parallel<O, W, F, Out>(
    mut splitter: ChunkSplitter,
    n_threads: u32,
    queue_len: usize,
    work: W,
    func: F,
) -> Out
where
    O: Send,
    W: Fn(&Chunk) -> Result<O, Error> + Send + Sync,
    F: FnOnce(&mut OrderedResults<O>) -> Out,
{
    assert!(n_threads > 0);
    assert!(queue_len > 0);

    let (done_send, done_recv) = mpsc::sync_channel::<Option<Finished<O>>>(queue_len);
    let (empty_send, empty_recv): (mpsc::SyncSender<Option<Vec<u8>>>, _) =
        mpsc::sync_channel(queue_len);
    let stopped = Arc::new(AtomicBool::new(false));

    // hand out the chunk buffers that will circulate through the pipeline
    for _ in 0..queue_len {
        empty_send.send(Some(Vec::new())).ok();
    }

    let producer_stopped = Arc::clone(&stopped);

    crossbeam_utils::thread::scope(|scope| {
        scope.spawn(move |_| {
            let mut pool = scoped_threadpool::Pool::new(n_threads);

            pool.scoped(|pool_scope| {
                let work = &work;

                loop {
                    // wait for a chunk buffer sent back after use;
                    // `None` means 'OrderedResults::stop()' was called
                    let buf = match empty_recv.recv() {
                        Ok(Some(buf)) => buf,
                        _ => return,
                    };
                    if producer_stopped.load(Ordering::Relaxed) {
                        return;
                    }

                    let index = splitter.next_index();
                    match splitter.next_chunk(buf) {
                        Some(Ok(chunk)) => {
                            let done_send = done_send.clone();
                            pool_scope.execute(move || {
                                let index = chunk.index();
                                let out = work(&chunk);
                                done_send
                                    .send(Some((index, out, Some(chunk.into_bytes()))))
                                    .ok();
                            });
                        }
                        Some(Err(e)) => {
                            done_send.send(Some((index, Err(e), None))).ok();
                            break;
                        }
                        None => break,
                    }
                }

                // the 'done' signal must come after all workers finished
                pool_scope.join_all();

                done_send.send(None).ok();
            });
        });

        let mut results = OrderedResults {
            empty_send,
            done_recv,
            stopped,
            reorder: ReorderBuffer::new(),
            finished: false,
            failed: false,
        };

        let out = func(&mut results);

        results.stop();

        out
    })
    .expect("chunk pipeline thread panicked")
}

/// Streaming access to pipeline results, restored to file order.
///
/// Results are released in ascending chunk index as soon as they become
/// available; a failed chunk surfaces exactly where sequential
/// processing would have failed, and ends the stream. Results released
/// before a failure remain valid.
pub struct OrderedResults<O> {
    empty_send: mpsc::SyncSender<Option<Vec<u8>>>,
    done_recv: mpsc::Receiver<Option<Finished<O>>>,
    stopped: Arc<AtomicBool>,
    reorder: ReorderBuffer<(Result<O, Error>, Option<Vec<u8>>)>,
    finished: bool,
    failed: bool,
}

impl<O> OrderedResults<O> {
    /// Returns the next in-order result, blocking until it is available.
    /// `None` once the input is exhausted or after an error was returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<O, Error>> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((res, buf)) = self.reorder.try_pop_next() {
                // the chunk is consumed, its buffer can circulate again
                if let Some(mut buf) = buf {
                    buf.clear();
                    self.empty_send.send(Some(buf)).ok();
                }
                if res.is_err() {
                    self.failed = true;
                }
                return Some(res);
            }
            if self.finished {
                return None;
            }
            match self.done_recv.recv() {
                Ok(Some((index, res, buf))) => self.reorder.insert(index, (res, buf)),
                Ok(None) | Err(_) => self.finished = true,
            }
        }
    }

    // Signals the producer to stop dispatching chunks.
    fn stop(self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.empty_send.send(None).ok();
    }
}
