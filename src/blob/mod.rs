//! Emission side: chunked builders and bounded writers.
//!
//! # Key Components
//!
//! - [`BlobBuilder`] - append-only buffer made of linked chunks, builders can be spliced into
//!   each other in constant time
//! - [`BlobWriter`] - cursor over a fixed region, every write is bounds checked
//! - [`ChunkPool`] - shared free list of fixed-size chunks for pooled builders
//! - [`Blob`] - a region reserved inside a [`BlobBuilder`] to be filled in later
//! - [`BlobWrite`] - the primitive, compressed, string and constant writes both sinks share
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::blob::{BlobBuilder, BlobWrite};
//!
//! let mut body = BlobBuilder::new();
//! let size = body.reserve_bytes(4)?;
//! body.write_user_string("Hi")?;
//!
//! let length = u32::try_from(body.count() - 4).unwrap();
//! body.blob_writer(&size)?.write_u32(length)?;
//! assert_eq!(body.to_vec(), vec![0x06, 0, 0, 0, 0x05, b'H', 0, b'i', 0, 0]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

mod builder;
mod pool;
mod write;
mod writer;

pub use builder::{Blob, BlobBuilder};
pub use pool::ChunkPool;
pub use write::BlobWrite;
pub use writer::BlobWriter;
