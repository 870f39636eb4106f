use std::sync::Mutex;

use log::trace;

use crate::Result;

/// Smallest chunk a pool hands out
const MIN_POOL_CHUNK_SIZE: usize = 16;

/// A shared free list of fixed-size chunks
///
/// Pooled [`super::BlobBuilder`]s take their chunks from here and give them back on
/// [`super::BlobBuilder::clear`], [`super::BlobBuilder::free`] or drop. The pool is shared
/// through an `Arc` and may be used from several threads, each builder itself stays
/// single-threaded.
///
/// ```rust
/// use std::sync::Arc;
/// use cilmeta::blob::{BlobBuilder, BlobWrite, ChunkPool};
///
/// let pool = Arc::new(ChunkPool::new(1024));
/// let mut builder = BlobBuilder::with_pool(pool.clone());
/// builder.write_u32(42)?;
/// builder.free()?;
/// assert_eq!(pool.available()?, 1);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Debug)]
pub struct ChunkPool {
    chunk_size: usize,
    max_retained: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl ChunkPool {
    /// Chunk size of [`ChunkPool::default`]
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;
    /// Number of free chunks a pool keeps unless told otherwise
    pub const DEFAULT_MAX_RETAINED: usize = 128;

    /// Create a pool of `chunk_size` byte chunks, at least 16
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self::with_limit(chunk_size, Self::DEFAULT_MAX_RETAINED)
    }

    /// Create a pool that keeps at most `max_retained` free chunks
    #[must_use]
    pub fn with_limit(chunk_size: usize, max_retained: usize) -> Self {
        ChunkPool {
            chunk_size: chunk_size.max(MIN_POOL_CHUNK_SIZE),
            max_retained,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Capacity of every chunk of this pool
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Take an empty chunk, reusing a released one if possible
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the pool is poisoned
    pub fn acquire(&self) -> Result<Vec<u8>> {
        let reused = lock!(self.free)?.pop();
        Ok(match reused {
            Some(chunk) => chunk,
            None => {
                trace!("ChunkPool: allocating a chunk of {} bytes", self.chunk_size);
                Vec::with_capacity(self.chunk_size)
            }
        })
    }

    /// Give `chunk` back; chunks too small for this pool or beyond the limit are dropped
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the pool is poisoned
    pub fn release(&self, mut chunk: Vec<u8>) -> Result<()> {
        if chunk.capacity() < self.chunk_size {
            return Ok(());
        }

        chunk.clear();
        let mut free = lock!(self.free)?;
        if free.len() < self.max_retained {
            free.push(chunk);
        }
        Ok(())
    }

    /// Number of free chunks ready for reuse
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the pool is poisoned
    pub fn available(&self) -> Result<usize> {
        Ok(lock!(self.free)?.len())
    }
}

impl Default for ChunkPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::{
        blob::{BlobBuilder, BlobWrite},
        Error,
    };

    #[test]
    fn reuse() {
        let pool = ChunkPool::new(64);
        let mut chunk = pool.acquire().unwrap();
        assert!(chunk.capacity() >= 64);
        chunk.extend_from_slice(b"data");

        pool.release(chunk).unwrap();
        assert_eq!(pool.available().unwrap(), 1);

        let chunk = pool.acquire().unwrap();
        assert!(chunk.is_empty());
        assert_eq!(pool.available().unwrap(), 0);
    }

    #[test]
    fn limits() {
        let pool = ChunkPool::with_limit(32, 1);
        assert_eq!(ChunkPool::new(1).chunk_size(), 16);

        pool.release(Vec::with_capacity(8)).unwrap();
        assert_eq!(pool.available().unwrap(), 0);

        pool.release(Vec::with_capacity(32)).unwrap();
        pool.release(Vec::with_capacity(32)).unwrap();
        assert_eq!(pool.available().unwrap(), 1);
    }

    #[test]
    fn shared_between_threads() {
        let pool = Arc::new(ChunkPool::default());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || {
                    let chunk = pool.acquire().unwrap();
                    pool.release(chunk).unwrap();
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(pool.available().unwrap() >= 1);
    }

    #[test]
    fn poisoned_pool() {
        let _ = env_logger::builder().is_test(true).try_init();

        let pool = Arc::new(ChunkPool::new(16));
        let mut kept = BlobBuilder::with_pool(pool.clone());
        kept.write_u32(7).unwrap();
        let mut dropped = BlobBuilder::with_pool(pool.clone());
        dropped.write_u32(9).unwrap();

        let shared = pool.clone();
        let poisoner = thread::spawn(move || {
            let _guard = shared.free.lock().unwrap();
            panic!("poisoning the chunk pool");
        });
        assert!(poisoner.join().is_err());

        assert!(matches!(pool.available(), Err(Error::LockError)));
        assert!(matches!(kept.free(), Err(Error::LockError)));
        drop(dropped);
    }
}
