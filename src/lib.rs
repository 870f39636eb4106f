// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! # cilmeta
//!
//! A zero-copy reader and a chunked, relinkable writer for the ECMA-335 metadata
//! format used by .NET modules.
//!
//! The reading side turns a raw metadata block (the region starting at the `BSJB`
//! signature) into strongly-typed, lazily-resolved views over the metadata tables and
//! the four heaps. Nothing is copied: every accessor decodes directly from the borrowed
//! buffer, and string comparisons against literals work on the encoded bytes.
//!
//! The writing side provides [`blob::BlobBuilder`], an append-only chunked buffer whose
//! instances can be spliced together in O(1), and [`blob::BlobWriter`], a bounded cursor
//! over a fixed region.
//!
//! ## Features
//!
//! - **Zero-copy parsing** - tables and heaps are views over the input slice
//! - **Complete table set** - all ECMA-335 tables plus the Portable PDB tables
//! - **Typed handles** - one handle type per table and heap with checked conversions
//! - **Sorted lookups** - binary search over key columns, `*Ptr` indirection applied transparently
//! - **Efficient emission** - chunked builders with O(1) prefix and suffix linking
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cilmeta::prelude::*;
//!
//! # fn example(data: &[u8]) -> cilmeta::Result<()> {
//! let reader = MetadataReader::new(data)?;
//!
//! for handle in reader.type_definitions() {
//!     let type_def = reader.type_definition(handle)?;
//!     println!(
//!         "{}.{}",
//!         reader.get_string(type_def.type_namespace)?,
//!         reader.get_string(type_def.type_name)?
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Producing bytes:
//!
//! ```rust
//! use cilmeta::blob::{BlobBuilder, BlobWrite};
//!
//! let mut header = BlobBuilder::new();
//! header.write_u32(0x424A_5342)?;
//!
//! let mut body = BlobBuilder::new();
//! body.write_compressed_integer(0x3FFF)?;
//!
//! header.link_suffix(body);
//! assert_eq!(header.count(), 6);
//! assert_eq!(header.to_vec(), vec![0x42, 0x53, 0x4A, 0x42, 0xBF, 0xFF]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust,no_run
/// use cilmeta::prelude::*;
///
/// # fn example(data: &[u8]) -> cilmeta::Result<()> {
/// let reader = MetadataReader::new(data)?;
/// println!("{} type definitions", reader.type_definitions().len());
/// # Ok(())
/// # }
/// ```
pub mod prelude;

/// Primitive and compressed-integer codec
///
/// Fixed-width little and big endian reads and writes, the ECMA-335 compressed integer
/// encodings, the cursor based [`Parser`] used for blobs and signatures, and UTF-8
/// helpers that tolerate unpaired UTF-16 surrogates.
pub mod codec;

/// Handles, tables, heaps and the [`metadata::reader::MetadataReader`] facade
///
/// # Key Components
///
/// - [`metadata::handles`] - packed references to table rows and heap entries
/// - [`metadata::root`] - the `BSJB` root header and stream directory
/// - [`metadata::streams`] - the `#Strings`, `#Blob`, `#GUID`, `#US`, `#~` and `#Pdb` streams
/// - [`metadata::tables`] - table schemas, layouts and typed row readers
/// - [`metadata::reader`] - the immutable query surface over one metadata block
pub mod metadata;

/// Chunked [`blob::BlobBuilder`], bounded [`blob::BlobWriter`] and the shared chunk pool
pub mod blob;

/// `cilmeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilmeta` Error type
///
/// The error type for every fallible operation of this crate. See [`Error::is_format_error`]
/// and [`Error::is_usage_error`] for telling bad input apart from caller bugs.
pub use error::Error;

pub use codec::Parser;
pub use metadata::reader::{MetadataReader, MetadataReaderOptions, OwnedMetadata};
