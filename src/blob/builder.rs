use std::{
    collections::LinkedList,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::{trace, warn};

use crate::{
    blob::{BlobWrite, BlobWriter, ChunkPool},
    Result,
};

/// Chunk size of [`BlobBuilder::new`]
const DEFAULT_CHUNK_SIZE: usize = 256;
/// Smallest chunk size a builder accepts
const MIN_CHUNK_SIZE: usize = 16;

static NEXT_CHUNK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct Chunk {
    id: u64,
    data: Vec<u8>,
}

impl Chunk {
    fn new(data: Vec<u8>) -> Self {
        Chunk {
            id: NEXT_CHUNK_ID.fetch_add(1, Ordering::Relaxed),
            data,
        }
    }

    fn free(&self) -> usize {
        self.data.capacity() - self.data.len()
    }
}

/// A region reserved by [`BlobBuilder::reserve_bytes`]
///
/// The bytes are part of the builder content from the moment they are reserved (zeroed) and
/// can be filled in later through [`BlobBuilder::blob_writer`]. A reservation never spans two
/// chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blob {
    chunk: u64,
    start: usize,
    len: usize,
    offset: usize,
}

impl Blob {
    /// Number of reserved bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero sized reservation
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of the reservation in the builder at the time it was made
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// An append-only byte buffer made of linked chunks
///
/// Writes fill the last chunk and start a new one when it is full, so content is never
/// moved once written. Two builders are concatenated with [`BlobBuilder::link_suffix`] or
/// [`BlobBuilder::link_prefix`] in constant time; the linked builder is taken by value and
/// cannot be used afterwards. [`BlobBuilder::count`] is tracked and never recomputed.
///
/// Builders created through [`BlobBuilder::with_pool`] draw their chunks from a shared
/// [`ChunkPool`] and return them on [`BlobBuilder::clear`], [`BlobBuilder::free`] or drop.
///
/// ```rust
/// use cilmeta::blob::{BlobBuilder, BlobWrite};
///
/// let mut names = BlobBuilder::with_capacity(16);
/// names.write_utf8("System.Runtime")?;
///
/// let mut header = BlobBuilder::new();
/// header.write_compressed_integer(14)?;
/// names.link_prefix(header);
///
/// assert_eq!(names.count(), 15);
/// assert!(names.chunks().count() > 1);
/// assert_eq!(names.to_vec()[..3], [14, b'S', b'y']);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Debug)]
pub struct BlobBuilder {
    chunks: LinkedList<Chunk>,
    count: usize,
    chunk_size: usize,
    pool: Option<Arc<ChunkPool>>,
}

impl BlobBuilder {
    /// Create a builder with 256 byte chunks
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHUNK_SIZE)
    }

    /// Create a builder whose chunks hold at least `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        BlobBuilder {
            chunks: LinkedList::new(),
            count: 0,
            chunk_size: capacity.max(MIN_CHUNK_SIZE),
            pool: None,
        }
    }

    /// Create a builder drawing its chunks from `pool`
    #[must_use]
    pub fn with_pool(pool: Arc<ChunkPool>) -> Self {
        BlobBuilder {
            chunks: LinkedList::new(),
            count: 0,
            chunk_size: pool.chunk_size(),
            pool: Some(pool),
        }
    }

    /// Total number of bytes written and reserved
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if nothing was written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Size of newly allocated chunks
    #[must_use]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_size
    }

    /// Bytes left in the current chunk before a new one is needed
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.chunks.back().map_or(0, Chunk::free)
    }

    /// The content, chunk by chunk, in order
    pub fn chunks(&self) -> impl DoubleEndedIterator<Item = &[u8]> + '_ {
        self.chunks.iter().map(|chunk| chunk.data.as_slice())
    }

    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks().flat_map(|chunk| chunk.iter().copied())
    }

    fn add_chunk(&mut self, min: usize) -> Result<()> {
        let data = match &self.pool {
            Some(pool) => pool.acquire()?,
            None => Vec::with_capacity(min.max(self.chunk_size)),
        };

        trace!(
            "BlobBuilder: chunk of {} bytes at offset {:#x}",
            data.capacity(),
            self.count
        );
        self.chunks.push_back(Chunk::new(data));
        Ok(())
    }

    /// Reserve `len` contiguous zeroed bytes to be written later
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if the builder is pooled and `len` exceeds
    /// the chunk size of the pool
    pub fn reserve_bytes(&mut self, len: usize) -> Result<Blob> {
        if len == 0 {
            return Ok(Blob {
                chunk: 0,
                start: 0,
                len: 0,
                offset: self.count,
            });
        }

        if self.free_bytes() < len {
            if let Some(pool) = &self.pool {
                if len > pool.chunk_size() {
                    return Err(invalid_argument_error!(
                        "cannot reserve {} bytes in pooled chunks of {} bytes",
                        len,
                        pool.chunk_size()
                    ));
                }
            }
            self.add_chunk(len)?;
        }

        let offset = self.count;
        let Some(chunk) = self.chunks.back_mut() else {
            return Err(invalid_argument_error!("no chunk to reserve {} bytes in", len));
        };

        let start = chunk.data.len();
        chunk.data.resize(start + len, 0);
        self.count += len;

        Ok(Blob {
            chunk: chunk.id,
            start,
            len,
            offset,
        })
    }

    /// A [`BlobWriter`] over the bytes of `blob`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `blob` was not reserved in this builder,
    /// or in a builder linked into it
    pub fn blob_writer(&mut self, blob: &Blob) -> Result<BlobWriter<'_>> {
        if blob.is_empty() {
            return Ok(BlobWriter::new(&mut []));
        }

        let Some(chunk) = self.chunks.iter_mut().find(|chunk| chunk.id == blob.chunk) else {
            return Err(invalid_argument_error!(
                "blob at {:#x} does not belong to this builder",
                blob.offset
            ));
        };

        let end = blob.start + blob.len;
        let Some(data) = chunk.data.get_mut(blob.start..end) else {
            return Err(invalid_argument_error!(
                "blob at {:#x} exceeds its chunk",
                blob.offset
            ));
        };
        Ok(BlobWriter::new(data))
    }

    /// Append the content of `suffix`, consuming it
    ///
    /// Runs in constant time. Following writes continue behind the linked content.
    pub fn link_suffix(&mut self, mut suffix: BlobBuilder) {
        self.chunks.append(&mut suffix.chunks);
        self.count += suffix.count;
        suffix.count = 0;
    }

    /// Prepend the content of `prefix`, consuming it
    ///
    /// Runs in constant time. Following writes continue behind the content of `self`.
    pub fn link_prefix(&mut self, mut prefix: BlobBuilder) {
        let mut chunks = std::mem::take(&mut prefix.chunks);
        chunks.append(&mut self.chunks);
        self.chunks = chunks;
        self.count += prefix.count;
        prefix.count = 0;
    }

    /// Copy the whole content into one vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut content = Vec::with_capacity(self.count);
        for chunk in self.chunks() {
            content.extend_from_slice(chunk);
        }
        content
    }

    /// Copy `len` bytes starting at `start`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds [`BlobBuilder::count`]
    pub fn to_vec_range(&self, start: usize, len: usize) -> Result<Vec<u8>> {
        let end = match start.checked_add(len) {
            Some(end) if end <= self.count => end,
            _ => return Err(out_of_bounds_error!()),
        };

        let mut content = Vec::with_capacity(len);
        let mut position = 0;
        for chunk in self.chunks() {
            if position >= end {
                break;
            }

            let chunk_end = position + chunk.len();
            if chunk_end > start {
                let from = start.saturating_sub(position);
                let to = (end - position).min(chunk.len());
                content.extend_from_slice(&chunk[from..to]);
            }
            position = chunk_end;
        }
        Ok(content)
    }

    /// Stream the content into `sink`, chunk by chunk
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if `sink` fails
    pub fn write_content_to<W: io::Write>(&self, sink: &mut W) -> Result<()> {
        for chunk in self.chunks() {
            sink.write_all(chunk)?;
        }
        Ok(())
    }

    /// Append a copy of the content to `target`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    pub fn write_content_to_builder(&self, target: &mut BlobBuilder) -> Result<()> {
        for chunk in self.chunks() {
            target.write_bytes(chunk)?;
        }
        Ok(())
    }

    /// Write a copy of the content into `target`
    ///
    /// # Errors
    /// Returns [`crate::Error::WriterOutOfBounds`] if the content does not fit
    pub fn write_content_to_writer(&self, target: &mut BlobWriter<'_>) -> Result<()> {
        if self.count > target.remaining() {
            return Err(crate::Error::WriterOutOfBounds {
                requested: self.count,
                available: target.remaining(),
            });
        }

        for chunk in self.chunks() {
            target.write_bytes(chunk)?;
        }
        Ok(())
    }

    /// Returns `true` if both builders hold the same bytes, wherever their chunks end
    #[must_use]
    pub fn content_equals(&self, other: &BlobBuilder) -> bool {
        self.count == other.count && self.bytes().eq(other.bytes())
    }

    /// Drop the content, pooled chunks go back to their pool
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the pool is poisoned
    pub fn clear(&mut self) -> Result<()> {
        self.count = 0;
        let chunks = std::mem::take(&mut self.chunks);
        match &self.pool {
            Some(pool) => {
                for chunk in chunks {
                    pool.release(chunk.data)?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Release the builder, pooled chunks go back to their pool
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the pool is poisoned
    pub fn free(mut self) -> Result<()> {
        self.clear()
    }
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BlobBuilder {
    fn drop(&mut self) {
        if self.pool.is_some() && !self.chunks.is_empty() {
            let chunks = self.chunks.len();
            if let Err(error) = self.clear() {
                warn!("Dropping {} pooled chunks: {}", chunks, error);
            }
        }
    }
}

impl BlobWrite for BlobBuilder {
    fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let free = self.free_bytes();
            if free == 0 {
                self.add_chunk(bytes.len())?;
                continue;
            }

            let (head, tail) = bytes.split_at(free.min(bytes.len()));
            if let Some(chunk) = self.chunks.back_mut() {
                chunk.data.extend_from_slice(head);
            }
            self.count += head.len();
            bytes = tail;
        }
        Ok(())
    }

    fn position(&self) -> usize {
        self.count
    }
}

impl io::Write for BlobBuilder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(chunk_size: usize, content: &[u8]) -> BlobBuilder {
        let mut builder = BlobBuilder::with_capacity(chunk_size);
        builder.write_bytes(content).unwrap();
        builder
    }

    #[test]
    fn chunked_writes() {
        let mut builder = BlobBuilder::with_capacity(16);
        assert_eq!(builder.free_bytes(), 0);

        let content: Vec<u8> = (0..40).collect();
        builder.write_bytes(&content).unwrap();
        assert_eq!(builder.count(), 40);
        assert_eq!(builder.to_vec(), content);

        builder.write_u32(0xDEAD_BEEF).unwrap();
        assert_eq!(builder.count(), 44);
        assert_eq!(builder.to_vec_range(40, 4).unwrap(), vec![0xEF, 0xBE, 0xAD, 0xDE]);
        assert!(builder.chunks().count() >= 2);
    }

    #[test]
    fn link_suffix() {
        let mut a = builder(16, b"first chunk content");
        let b = builder(32, b" and the rest");
        let expected = [&b"first chunk content"[..], b" and the rest"].concat();

        a.link_suffix(b);
        assert_eq!(a.count(), expected.len());
        assert_eq!(a.to_vec(), expected);

        a.write_u8(b'!').unwrap();
        assert_eq!(a.to_vec().last(), Some(&b'!'));
        assert_eq!(a.count(), expected.len() + 1);
    }

    #[test]
    fn link_prefix() {
        let mut body = builder(16, b"body");
        body.link_prefix(builder(16, b"head:"));
        body.write_utf8(":tail").unwrap();
        assert_eq!(body.to_vec(), b"head:body:tail".to_vec());
        assert_eq!(body.count(), 14);

        let mut empty = BlobBuilder::new();
        empty.link_prefix(builder(16, b"only"));
        empty.link_suffix(BlobBuilder::new());
        assert_eq!(empty.to_vec(), b"only".to_vec());
    }

    #[test]
    fn content_equality_across_chunkings() {
        let content: Vec<u8> = (0..=255).collect();

        let mut a = builder(16, &content[..100]);
        a.link_suffix(builder(64, &content[100..]));
        let b = builder(256, &content);
        let c = builder(16, &content[..255]);

        assert!(a.content_equals(&b));
        assert!(b.content_equals(&a));
        assert!(!a.content_equals(&c));
        assert_eq!(a.count(), b.count());
    }

    #[test]
    fn materialize_and_stream_agree() {
        let mut a = builder(16, b"0123456789abcdefghij");
        a.link_suffix(builder(17, b"klmnopqrstuvwxyz"));

        let mut streamed = Vec::new();
        a.write_content_to(&mut streamed).unwrap();
        assert_eq!(streamed, a.to_vec());

        let mut copy = BlobBuilder::with_capacity(20);
        a.write_content_to_builder(&mut copy).unwrap();
        assert!(copy.content_equals(&a));

        let mut buffer = [0u8; 36];
        let mut writer = BlobWriter::new(&mut buffer);
        a.write_content_to_writer(&mut writer).unwrap();
        assert_eq!(writer.remaining(), 0);
        assert_eq!(buffer.to_vec(), streamed);

        let mut small = [0u8; 8];
        let mut writer = BlobWriter::new(&mut small);
        assert!(a.write_content_to_writer(&mut writer).is_err());
        assert_eq!(writer.offset(), 0);
    }

    #[test]
    fn ranges() {
        let mut a = builder(16, b"0123456789abcdef");
        a.link_suffix(builder(16, b"ghijklmnop"));

        assert_eq!(a.to_vec_range(14, 5).unwrap(), b"efghi".to_vec());
        assert_eq!(a.to_vec_range(0, 0).unwrap(), Vec::<u8>::new());
        assert_eq!(a.to_vec_range(26, 0).unwrap(), Vec::<u8>::new());
        assert!(matches!(a.to_vec_range(20, 7), Err(crate::Error::OutOfBounds)));
        assert!(a.to_vec_range(usize::MAX, 2).is_err());
    }

    #[test]
    fn reservations() {
        let mut builder = BlobBuilder::with_capacity(16);
        builder.write_bytes(&[0xFF; 14]).unwrap();

        let blob = builder.reserve_bytes(4).unwrap();
        assert_eq!(blob.offset(), 14);
        assert_eq!(blob.len(), 4);
        builder.write_u8(0xAA).unwrap();

        builder.blob_writer(&blob).unwrap().write_u32(0x0403_0201).unwrap();
        let content = builder.to_vec();
        assert_eq!(&content[14..], &[1, 2, 3, 4, 0xAA]);

        let mut writer = builder.blob_writer(&blob).unwrap();
        assert!(writer.write_bytes(&[0; 5]).is_err());

        let other = BlobBuilder::new().reserve_bytes(2).unwrap();
        assert!(builder.blob_writer(&other).is_err());

        let empty = builder.reserve_bytes(0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(builder.blob_writer(&empty).unwrap().length(), 0);
    }

    #[test]
    fn reservations_survive_linking() {
        let mut body = BlobBuilder::with_capacity(16);
        let size = body.reserve_bytes(2).unwrap();
        body.write_utf8("payload").unwrap();

        let mut header = BlobBuilder::with_capacity(16);
        header.write_utf8("hdr").unwrap();
        body.link_prefix(header);

        body.blob_writer(&size).unwrap().write_u16(7).unwrap();
        assert_eq!(body.to_vec(), b"hdr\x07\x00payload".to_vec());
    }

    #[test]
    fn pooled() {
        let pool = Arc::new(ChunkPool::new(32));
        {
            let mut builder = BlobBuilder::with_pool(pool.clone());
            builder.write_bytes(&[1; 100]).unwrap();
            assert_eq!(builder.chunk_capacity(), 32);
            assert_eq!(builder.count(), 100);
            assert!(builder.reserve_bytes(64).is_err());
        }
        let released = pool.available().unwrap();
        assert!(released >= 4);

        let mut builder = BlobBuilder::with_pool(pool.clone());
        builder.write_u8(7).unwrap();
        assert_eq!(pool.available().unwrap(), released - 1);
        assert_eq!(builder.to_vec(), vec![7]);

        builder.clear().unwrap();
        assert!(builder.is_empty());
        assert_eq!(pool.available().unwrap(), released);
    }

    #[test]
    fn io_write() {
        use std::io::Write;

        let mut builder = BlobBuilder::with_capacity(16);
        write!(builder, "{}-{}", 12, "ab").unwrap();
        builder.flush().unwrap();
        assert_eq!(builder.to_vec(), b"12-ab".to_vec());
    }
}
