//! # ECMA-335 Metadata Tables
//!
//! Row types and the table infrastructure for all ECMA-335 metadata tables and the Portable
//! PDB tables.
//!
//! - [`TableId`], [`Column`], [`TableInfo`] and [`CodedIndexType`] describe the schema, the
//!   generic [`MetadataTable`] is the view over the rows of one table
//! - one `*Raw` struct per table, e.g. [`TypeDefRaw`], together with the column schema
//!   returned by [`columns`] and the key column returned by [`key_column`]
//!
//! Tables are obtained from a [`crate::metadata::streams::TablesHeader`] or through
//! [`crate::MetadataReader::tables`].
//!
//! ## References
//!
//! - [ECMA-335 II.22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
//! - [Portable PDB](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

mod rows;
mod types;

pub use rows::*;
pub use types::*;
