use std::fmt;

use crate::{
    metadata::{
        handles::{Handle, HandleKind, ROW_ID_MASK, VIRTUAL_BIT},
        tables::TableId,
    },
    Error, Result,
};

/// A reference to a row of any metadata table
///
/// This is the value of a coded index column: a table that is only known at runtime plus a
/// 1-based row id. Its packed form ([`EntityHandle::raw`]) is
///
/// | Bits    | Content                         |
/// |---------|---------------------------------|
/// | 31      | virtual flag                    |
/// | 24..=30 | table number                    |
/// | 0..=23  | row id, or the virtual index    |
///
/// The nil handle packs to zero and is reported as nil regardless of the table it was decoded
/// for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    table: TableId,
    // row id plus VIRTUAL_BIT
    value: u32,
}

impl Default for EntityHandle {
    fn default() -> Self {
        EntityHandle::NIL
    }
}

impl EntityHandle {
    /// The nil handle
    pub const NIL: EntityHandle = EntityHandle {
        table: TableId::Module,
        value: 0,
    };

    /// Create a handle to row `row` of `table`, row `0` yields [`EntityHandle::NIL`]
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `row` exceeds the 24 bit row id range
    pub fn new(table: TableId, row: u32) -> Result<EntityHandle> {
        if row > ROW_ID_MASK {
            return Err(Error::InvalidHandle(format!(
                "{table:?} row {row:#x} exceeds 24 bits"
            )));
        }

        if row == 0 {
            return Ok(EntityHandle::NIL);
        }

        Ok(EntityHandle { table, value: row })
    }

    /// Create a virtual handle, addressing entry `index` of a projection collaborator
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `index` exceeds 24 bits
    pub fn new_virtual(table: TableId, index: u32) -> Result<EntityHandle> {
        if index > ROW_ID_MASK {
            return Err(Error::InvalidHandle(format!(
                "virtual {table:?} index {index:#x} exceeds 24 bits"
            )));
        }

        Ok(EntityHandle {
            table,
            value: index | VIRTUAL_BIT,
        })
    }

    /// Decode the packed representation
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if the table bits name no table
    pub fn from_raw(raw: u32) -> Result<EntityHandle> {
        #[allow(clippy::cast_possible_truncation)]
        let number = ((raw >> 24) & 0x7F) as u8;
        let Some(table) = TableId::from_u8(number) else {
            return Err(Error::InvalidHandle(format!(
                "{raw:#010x} names no metadata table"
            )));
        };

        if raw & VIRTUAL_BIT != 0 {
            return EntityHandle::new_virtual(table, raw & ROW_ID_MASK);
        }
        EntityHandle::new(table, raw & ROW_ID_MASK)
    }

    /// The packed representation
    #[must_use]
    pub const fn raw(self) -> u32 {
        if self.value == 0 {
            return 0;
        }
        (self.value & VIRTUAL_BIT) | ((self.table as u32) << 24) | (self.value & ROW_ID_MASK)
    }

    /// The referenced table, [`TableId::Module`] for the nil handle
    #[must_use]
    pub const fn table(self) -> TableId {
        self.table
    }

    /// The 1-based row id, or the virtual index
    #[must_use]
    pub const fn row(self) -> u32 {
        self.value & ROW_ID_MASK
    }

    /// Returns `true` for the nil handle
    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.value == 0
    }

    /// Returns `true` if this handle does not address a physical row
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        self.value & VIRTUAL_BIT != 0
    }

    /// The handle kind
    #[must_use]
    pub const fn kind(self) -> HandleKind {
        HandleKind::Table(self.table)
    }
}

impl From<EntityHandle> for Handle {
    fn from(handle: EntityHandle) -> Self {
        if handle.is_nil() {
            return Handle::NIL;
        }
        Handle::from_parts(handle.kind(), handle.row(), handle.is_virtual())
    }
}

impl TryFrom<Handle> for EntityHandle {
    type Error = Error;

    fn try_from(handle: Handle) -> Result<Self> {
        if handle.is_nil() {
            return Ok(EntityHandle::NIL);
        }

        match handle.kind() {
            HandleKind::Table(table) if handle.is_virtual() => {
                EntityHandle::new_virtual(table, handle.value())
            }
            HandleKind::Table(table) => EntityHandle::new(table, handle.value()),
            HandleKind::Heap(_) => Err(Error::InvalidCast {
                from: handle.kind(),
                to: "EntityHandle",
            }),
        }
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "EntityHandle(nil)");
        }
        if self.is_virtual() {
            return write!(f, "EntityHandle({:?}, virtual: {})", self.table, self.row());
        }
        write!(f, "EntityHandle({:?}, row: {})", self.table, self.row())
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.raw())
    }
}
