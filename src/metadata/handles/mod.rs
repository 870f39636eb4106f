//! # Handles
//!
//! References to table rows and heap entries.
//!
//! - [`Handle`] - any table row or heap entry, a tagged `(kind, value)` pair
//! - [`EntityHandle`] - any table row, the value of a coded index column
//! - typed handles ([`TypeDefHandle`], [`StringHandle`], ...) - one per table and heap
//! - [`Token`] - the packed 32-bit form found in IL streams and signatures
//! - [`HandleRange`] - a lazily resolved run of typed handles returned by range queries
//!
//! Every handle type shares one nil value, and converting a nil handle between types always
//! succeeds. Narrowing conversions ([`Handle`] to [`EntityHandle`], either of them to a typed
//! handle) are checked and fail with [`crate::Error::InvalidCast`].
//!
//! ```rust
//! use cilmeta::metadata::handles::{EntityHandle, Handle, MethodDefHandle, Token};
//!
//! let token = Token::new(0x0600_0003);
//! let entity = EntityHandle::try_from(token)?;
//! let method = MethodDefHandle::try_from(entity)?;
//! assert_eq!(method.row(), 3);
//! assert_eq!(Handle::from(method), Handle::from(entity));
//! # Ok::<(), cilmeta::Error>(())
//! ```

mod collections;
mod entity;
mod handle;
mod kind;
mod token;
mod typed;

pub use collections::HandleRange;
pub(crate) use collections::RowMap;
pub use entity::EntityHandle;
pub use handle::Handle;
pub use kind::{HandleKind, HeapKind};
pub use token::Token;
pub use typed::*;

/// Mask of the row id bits of a packed handle
pub const ROW_ID_MASK: u32 = 0x00FF_FFFF;

/// The bit marking a packed handle as virtual
pub const VIRTUAL_BIT: u32 = 0x8000_0000;
