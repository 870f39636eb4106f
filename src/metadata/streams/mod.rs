//! The streams of a metadata block.
//!
//! Each type here borrows its bytes from the block and decodes entries only when asked.
//!
//! | Stream | Type | Content |
//! |---|---|---|
//! | `#Strings` | [`Strings`] | zero terminated UTF-8 identifiers |
//! | `#US` | [`UserStrings`] | length prefixed UTF-16 literals |
//! | `#Blob` | [`Blob`] | length prefixed signatures and values |
//! | `#GUID` | [`Guid`] | 16 byte entries, 1-based |
//! | `#~`, `#-` | [`TablesHeader`] | the tables; `#-` may carry `*Ptr` tables |
//! | `#Pdb` | [`PdbStream`] | Portable PDB id and external row counts |
//!
//! A `#JTD` stream carries no data; its presence marks a minimal delta, where every table
//! and heap reference is 4 bytes wide.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::streams::{Blob, Strings};
//!
//! let strings = Strings::from(b"\0Object\0System\0")?;
//! assert_eq!(strings.get(1)?, "Object");
//! assert!(strings.equals(8, "system", true)?);
//!
//! let blob = Blob::from(&[0x00, 0x02, 0x06, 0x08])?;
//! assert_eq!(blob.get(1)?, &[0x06, 0x08]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

mod streamheader;
pub use streamheader::{StreamHeader, StreamKind};

mod strings;
pub use strings::{Strings, StringsIterator};

mod userstrings;
pub use userstrings::{UserStrings, UserStringsIterator};

mod blob;
pub use blob::{Blob, BlobIterator};

mod guid;
pub use guid::Guid;

mod tablesheader;
pub use tablesheader::{HeapSizes, TablesHeader};

mod pdb;
pub use pdb::PdbStream;
