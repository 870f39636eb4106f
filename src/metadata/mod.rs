//! ECMA-335 metadata: handles, streams, tables and the reader facade.
//!
//! A metadata block starts with the `BSJB` root header, followed by a directory of streams.
//! The heaps (`#Strings`, `#US`, `#Blob`, `#GUID`) hold variable length data; the table stream
//! (`#~` or `#-`) holds fixed size rows whose reference columns are 2 or 4 bytes wide depending
//! on the row counts and heap sizes. Standalone Portable PDBs add a `#Pdb` stream.
//!
//! # Key Components
//!
//! - [`handles`] - typed, packed references to rows and heap entries
//! - [`root`] - the root header and stream directory
//! - [`streams`] - the heaps, the table stream header and the `#Pdb` stream
//! - [`tables`] - table numbers, coded indexes, schemas and row types
//! - [`reader`] - [`reader::MetadataReader`], the query surface over one block
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::MetadataReader;
//!
//! # fn example(data: &[u8]) -> cilmeta::Result<()> {
//! let reader = MetadataReader::new(data)?;
//! for table in reader.tables().present_tables() {
//!     println!("{:?}: {} rows", table, reader.tables().row_count(table));
//! }
//! # Ok(())
//! # }
//! ```

/// Typed handles and metadata tokens
pub mod handles;
/// The metadata reader facade
pub mod reader;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of all metadata streams (tables header, heaps, Portable PDB)
pub mod streams;
/// Implementation of the .NET metadata tables
pub mod tables;
