use std::fmt;

use crate::{
    metadata::{
        handles::{HandleKind, HeapKind, ROW_ID_MASK, VIRTUAL_BIT},
        tables::TableId,
    },
    Error, Result,
};

/// Set in the packed form of heap handles
const HEAP_BIT: u32 = 0x4000_0000;

/// Offset bits of a packed heap handle
const HEAP_OFFSET_MASK: u32 = 0x0FFF_FFFF;

/// A reference to a table row or a heap entry
///
/// The most general handle: the kind says which table or heap is addressed, the value is a
/// 1-based row id for tables and a byte offset (an index for `#GUID`) for heaps. A virtual
/// handle addresses an entry synthesized by a projection collaborator instead.
///
/// All handle types share one nil value. Converting the nil value of any typed handle yields
/// [`Handle::NIL`], and the nil [`Handle`] converts to the nil value of every typed handle.
///
/// The packed form ([`Handle::raw`]) keeps table handles bit-identical to
/// [`crate::metadata::handles::EntityHandle::raw`]:
///
/// | Bits    | Table handle     | Heap handle                                  |
/// |---------|------------------|----------------------------------------------|
/// | 31      | virtual flag     | virtual flag                                 |
/// | 30      | 0                | 1                                            |
/// | 24..=29 | table number     | 28..=29: `#US`, `#Blob`, `#GUID`, `#Strings` |
/// | 0..=23  | row id           | 0..=27: offset                               |
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::handles::{EntityHandle, Handle, HandleKind, HeapKind};
/// use cilmeta::metadata::tables::TableId;
///
/// let handle = Handle::new(HandleKind::Table(TableId::TypeDef), 2)?;
/// let entity = EntityHandle::try_from(handle)?;
/// assert_eq!(entity.raw(), 0x0200_0002);
///
/// let string = Handle::new(HandleKind::Heap(HeapKind::String), 0x1A)?;
/// assert!(EntityHandle::try_from(string).is_err());
/// assert_eq!(string.raw(), 0x7000_001A);
/// assert_eq!(Handle::from_raw(string.raw())?, string);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: HandleKind,
    value: u32,
    is_virtual: bool,
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NIL
    }
}

impl Handle {
    /// The nil handle
    pub const NIL: Handle = Handle {
        kind: HandleKind::Table(crate::metadata::tables::TableId::Module),
        value: 0,
        is_virtual: false,
    };

    /// Create a handle of `kind` carrying `value`, a zero value yields [`Handle::NIL`]
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `value` does not fit the kind, 24 bits for rows and
    /// [`crate::metadata::handles::HeapKind::max_offset`] for heaps
    pub fn new(kind: HandleKind, value: u32) -> Result<Handle> {
        Self::check(kind, value)?;
        if value == 0 {
            return Ok(Handle::NIL);
        }
        Ok(Handle::from_parts(kind, value, false))
    }

    /// Create a virtual handle of `kind` addressing projection entry `index`
    ///
    /// # Errors
    /// Same as [`Handle::new`]
    pub fn new_virtual(kind: HandleKind, index: u32) -> Result<Handle> {
        Self::check(kind, index)?;
        Ok(Handle::from_parts(kind, index, true))
    }

    fn check(kind: HandleKind, value: u32) -> Result<()> {
        let max = match kind {
            HandleKind::Table(_) => ROW_ID_MASK,
            HandleKind::Heap(heap) => heap.max_offset(),
        };

        if value > max {
            return Err(Error::InvalidHandle(format!(
                "{value:#x} exceeds the range of {kind}"
            )));
        }
        Ok(())
    }

    pub(crate) const fn from_parts(kind: HandleKind, value: u32, is_virtual: bool) -> Handle {
        Handle {
            kind,
            value,
            is_virtual,
        }
    }

    /// The addressed table or heap
    #[must_use]
    pub const fn kind(self) -> HandleKind {
        self.kind
    }

    /// The row id, heap offset or virtual index
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }

    /// Returns `true` for the nil handle
    #[must_use]
    pub const fn is_nil(self) -> bool {
        (self.value | self.is_virtual as u32) == 0
    }

    /// Returns `true` if this handle addresses a projection entry instead of physical data
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        self.is_virtual
    }

    /// Returns `true` if this handle addresses a table row
    #[must_use]
    pub const fn is_entity_handle(self) -> bool {
        self.kind.is_table()
    }

    /// The packed 32 bit form, 0 for [`Handle::NIL`]
    #[must_use]
    pub const fn raw(self) -> u32 {
        let virtual_bit = if self.is_virtual { VIRTUAL_BIT } else { 0 };
        match self.kind {
            HandleKind::Table(table) => {
                virtual_bit | ((table as u32) << 24) | (self.value & ROW_ID_MASK)
            }
            HandleKind::Heap(heap) => {
                virtual_bit | HEAP_BIT | (heap.ordinal() << 28) | (self.value & HEAP_OFFSET_MASK)
            }
        }
    }

    /// Decode the packed form produced by [`Handle::raw`]
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if the table bits of a table handle name no table
    pub fn from_raw(raw: u32) -> Result<Handle> {
        let is_virtual = raw & VIRTUAL_BIT != 0;
        let (kind, value) = if raw & HEAP_BIT != 0 {
            (
                HandleKind::Heap(HeapKind::from_ordinal(raw >> 28)),
                raw & HEAP_OFFSET_MASK,
            )
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let number = ((raw >> 24) & 0x3F) as u8;
            let Some(table) = TableId::from_u8(number) else {
                return Err(Error::InvalidHandle(format!(
                    "{raw:#010x} names no metadata table"
                )));
            };
            (HandleKind::Table(table), raw & ROW_ID_MASK)
        };

        if is_virtual {
            return Handle::new_virtual(kind, value);
        }
        Handle::new(kind, value)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "Handle(nil)");
        }
        let prefix = if self.is_virtual { "virtual " } else { "" };
        write!(f, "Handle({}{}, {:#x})", prefix, self.kind, self.value)
    }
}
