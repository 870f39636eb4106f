//! Portable PDB Stream (`#Pdb`)
//!
//! The `#Pdb` stream of a standalone Portable PDB identifies the debug information and carries
//! the row counts of the type system tables of the module it describes. Those tables are not
//! part of the PDB, but the debug tables reference them, so their row counts decide the width
//! of those references.
//!
//! # Reference
//! - [Portable PDB v1.0, #Pdb stream](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

use strum::IntoEnumIterator;

use crate::{
    codec::io::read_le_at,
    metadata::{
        handles::{EntityHandle, MethodDefHandle, Token},
        tables::{TableId, TABLE_SLOTS, TYPE_SYSTEM_TABLES_MASK},
    },
    Result,
};

/// The parsed `#Pdb` stream
///
/// ```rust
/// use cilmeta::metadata::{streams::PdbStream, tables::TableId};
///
/// let mut data = vec![0xAB; 20];
/// data.extend_from_slice(&0x0600_0001u32.to_le_bytes());
/// data.extend_from_slice(&TableId::MethodDef.mask().to_le_bytes());
/// data.extend_from_slice(&12u32.to_le_bytes());
///
/// let pdb = PdbStream::read(&data)?;
/// assert_eq!(pdb.entry_point()?.row(), 1);
/// assert_eq!(pdb.type_system_table_rows[TableId::MethodDef as usize], 12);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdbStream {
    /// The PDB id, matches the debug directory entry of the module
    pub id: [u8; 20],
    /// Token of the entry point method, 0 if there is none
    pub entry_point: Token,
    /// Bit vector of the type system tables the module contains
    pub referenced_type_system_tables: u64,
    /// Row counts of the referenced tables, by table number
    pub type_system_table_rows: [u32; TABLE_SLOTS],
}

impl Default for PdbStream {
    fn default() -> Self {
        PdbStream {
            id: [0; 20],
            entry_point: Token::new(0),
            referenced_type_system_tables: 0,
            type_system_table_rows: [0; TABLE_SLOTS],
        }
    }
}

impl PdbStream {
    /// Parse the `#Pdb` stream
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for a truncated stream, and
    /// [`crate::Error::Malformed`] if a referenced table is not a type system table
    pub fn read(data: &[u8]) -> Result<PdbStream> {
        let Some(id) = data.get(..20) else {
            return Err(out_of_bounds_error!());
        };

        let mut pdb = PdbStream::default();
        pdb.id.copy_from_slice(id);

        let mut offset = 20;
        pdb.entry_point = Token::new(read_le_at::<u32>(data, &mut offset)?);
        pdb.referenced_type_system_tables = read_le_at::<u64>(data, &mut offset)?;

        if pdb.referenced_type_system_tables & !TYPE_SYSTEM_TABLES_MASK != 0 {
            return Err(malformed_error!(
                "#Pdb references tables outside the type system - {:#018x}",
                pdb.referenced_type_system_tables
            ));
        }

        for table in TableId::iter() {
            if pdb.referenced_type_system_tables & table.mask() != 0 {
                pdb.type_system_table_rows[table as usize] = read_le_at::<u32>(data, &mut offset)?;
            }
        }

        Ok(pdb)
    }

    /// The entry point method, nil if the module has none
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidCast`] if the token does not name a `MethodDef` row
    pub fn entry_point(&self) -> Result<MethodDefHandle> {
        if self.entry_point.is_null() {
            return Ok(MethodDefHandle::NIL);
        }
        let entity = EntityHandle::try_from(self.entry_point)?;
        MethodDefHandle::try_from(entity)
    }
}
