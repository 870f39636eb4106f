use std::fmt;

use strum::{EnumCount, EnumIter};

use crate::metadata::tables::TableId;

/// The four metadata heaps a handle can point into
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount)]
#[repr(u8)]
pub enum HeapKind {
    /// `#US`, length prefixed UTF-16 literals; shares the `0x70` token type
    UserString = 0x70,
    /// `#Blob`, length prefixed binary data
    Blob = 0x71,
    /// `#GUID`, 16 byte GUIDs addressed by a 1-based index
    Guid = 0x72,
    /// `#Strings`, NUL terminated UTF-8 identifiers
    String = 0x78,
}

impl HeapKind {
    /// Largest offset (or index, for `#GUID`) a handle of this kind can carry
    ///
    /// Bounded by the 28 offset bits of the packed [`crate::metadata::handles::Handle`].
    #[must_use]
    pub const fn max_offset(self) -> u32 {
        match self {
            // token addressable
            HeapKind::UserString => 0x00FF_FFFF,
            HeapKind::Blob | HeapKind::Guid | HeapKind::String => 0x0FFF_FFFF,
        }
    }

    /// The 2 bit heap selector of a packed handle
    pub(crate) const fn ordinal(self) -> u32 {
        match self {
            HeapKind::UserString => 0,
            HeapKind::Blob => 1,
            HeapKind::Guid => 2,
            HeapKind::String => 3,
        }
    }

    pub(crate) const fn from_ordinal(ordinal: u32) -> HeapKind {
        match ordinal & 3 {
            0 => HeapKind::UserString,
            1 => HeapKind::Blob,
            2 => HeapKind::Guid,
            _ => HeapKind::String,
        }
    }
}

/// The kind of entry a [`crate::metadata::handles::Handle`] refers to
///
/// Matching on this enum replaces the type-byte comparisons of the packed representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum HandleKind {
    /// A row of a metadata table
    Table(TableId),
    /// An offset into a heap
    Heap(HeapKind),
}

impl HandleKind {
    /// The token type byte (`0x00..=0x37` for tables, `0x70..=0x78` for heaps)
    #[must_use]
    pub const fn type_byte(self) -> u8 {
        match self {
            HandleKind::Table(table) => table as u8,
            HandleKind::Heap(heap) => heap as u8,
        }
    }

    /// Returns `true` for table kinds, which are the kinds an
    /// [`crate::metadata::handles::EntityHandle`] can hold
    #[must_use]
    pub const fn is_table(self) -> bool {
        matches!(self, HandleKind::Table(_))
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Table(table) => write!(f, "{table:?}"),
            HandleKind::Heap(heap) => write!(f, "#{heap:?}"),
        }
    }
}

impl From<TableId> for HandleKind {
    fn from(table: TableId) -> Self {
        HandleKind::Table(table)
    }
}

impl From<HeapKind> for HandleKind {
    fn from(heap: HeapKind) -> Self {
        HandleKind::Heap(heap)
    }
}
