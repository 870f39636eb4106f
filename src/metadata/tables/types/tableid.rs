use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Identifiers for the metadata tables defined by ECMA-335 and the Portable PDB format.
///
/// The numeric values are the table numbers used in the table stream bitmasks, in metadata
/// tokens and in the high byte of an [`crate::metadata::handles::EntityHandle`]. Tables are
/// laid out in the table stream in ascending order of this number.
///
/// ## Table Categories
///
/// ### Core Type System
/// - **`Module`**, **`TypeRef`**, **`TypeDef`**, **`Field`**, **`MethodDef`**, **`Param`**
///
/// ### Indirection (uncompressed `#-` streams only)
/// - **`FieldPtr`**, **`MethodPtr`**, **`ParamPtr`**, **`EventPtr`**, **`PropertyPtr`**
///
/// ### Relationships and attributes
/// - **`InterfaceImpl`**, **`NestedClass`**, **`ClassLayout`**, **`FieldLayout`**,
///   **`CustomAttribute`**, **`Constant`**, **`FieldMarshal`**, **`DeclSecurity`**
///
/// ### Assembly information
/// - **`Assembly`**, **`AssemblyRef`** and their processor / OS tables, **`File`**,
///   **`ExportedType`**, **`ManifestResource`**
///
/// ### Edit and continue
/// - **`EncLog`**, **`EncMap`**
///
/// ### Portable PDB
/// - **`Document`** through **`CustomDebugInformation`** (`0x30..=0x37`)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, EnumIter, EnumCount)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (0x00)
    Module = 0x00,
    /// `TypeRef` table (0x01)
    TypeRef = 0x01,
    /// `TypeDef` table (0x02)
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03)
    FieldPtr = 0x03,
    /// `Field` table (0x04)
    Field = 0x04,
    /// `MethodPtr` table (0x05)
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06)
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07)
    ParamPtr = 0x07,
    /// `Param` table (0x08)
    Param = 0x08,
    /// `InterfaceImpl` table (0x09)
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A)
    MemberRef = 0x0A,
    /// `Constant` table (0x0B)
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C)
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D)
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E)
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F)
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10)
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11)
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12)
    EventMap = 0x12,
    /// `EventPtr` table (0x13)
    EventPtr = 0x13,
    /// `Event` table (0x14)
    Event = 0x14,
    /// `PropertyMap` table (0x15)
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16)
    PropertyPtr = 0x16,
    /// `Property` table (0x17)
    Property = 0x17,
    /// `MethodSemantics` table (0x18)
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19)
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A)
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B)
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C)
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D)
    FieldRva = 0x1D,
    /// `EncLog` table (0x1E)
    EncLog = 0x1E,
    /// `EncMap` table (0x1F)
    EncMap = 0x1F,
    /// `Assembly` table (0x20)
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21)
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22)
    AssemblyOs = 0x22,
    /// `AssemblyRef` table (0x23)
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24)
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25)
    AssemblyRefOs = 0x25,
    /// `File` table (0x26)
    File = 0x26,
    /// `ExportedType` table (0x27)
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28)
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29)
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A)
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B)
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C)
    GenericParamConstraint = 0x2C,
    /// `Document` table (0x30)
    Document = 0x30,
    /// `MethodDebugInformation` table (0x31)
    MethodDebugInformation = 0x31,
    /// `LocalScope` table (0x32)
    LocalScope = 0x32,
    /// `LocalVariable` table (0x33)
    LocalVariable = 0x33,
    /// `LocalConstant` table (0x34)
    LocalConstant = 0x34,
    /// `ImportScope` table (0x35)
    ImportScope = 0x35,
    /// `StateMachineMethod` table (0x36)
    StateMachineMethod = 0x36,
    /// `CustomDebugInformation` table (0x37)
    CustomDebugInformation = 0x37,
}

/// Bit positions of the `*Ptr` tables, which only an uncompressed `#-` stream may contain
pub const PTR_TABLES_MASK: u64 = (1 << TableId::FieldPtr as u8)
    | (1 << TableId::MethodPtr as u8)
    | (1 << TableId::ParamPtr as u8)
    | (1 << TableId::EventPtr as u8)
    | (1 << TableId::PropertyPtr as u8);

/// Bit positions of the tables that may appear in a metadata stream
pub const VALID_TABLES_MASK: u64 = 0x00FF_1FFF_FFFF_FFFF;

/// Bit positions of the Portable PDB tables
pub const DEBUG_TABLES_MASK: u64 = 0x00FF_0000_0000_0000;

/// Bit positions of the tables a standalone PDB may reference through its `#Pdb` stream
pub const TYPE_SYSTEM_TABLES_MASK: u64 = 0x0000_1FFF_FFFF_FFFF;

impl TableId {
    /// Map a table number back to its [`TableId`], `None` for unassigned numbers
    #[must_use]
    pub fn from_u8(value: u8) -> Option<TableId> {
        TableId::iter().find(|table| *table as u8 == value)
    }

    /// The bit of this table in the `valid` and `sorted` masks of the table stream header
    #[must_use]
    pub const fn mask(self) -> u64 {
        1 << self as u8
    }

    /// Returns `true` for the five `*Ptr` indirection tables
    #[must_use]
    pub const fn is_ptr_table(self) -> bool {
        PTR_TABLES_MASK & self.mask() != 0
    }

    /// Returns `true` for the Portable PDB tables
    #[must_use]
    pub const fn is_debug_table(self) -> bool {
        DEBUG_TABLES_MASK & self.mask() != 0
    }

    /// The pointer table that may redirect rows of this table, if any
    #[must_use]
    pub const fn ptr_table(self) -> Option<TableId> {
        match self {
            TableId::Field => Some(TableId::FieldPtr),
            TableId::MethodDef => Some(TableId::MethodPtr),
            TableId::Param => Some(TableId::ParamPtr),
            TableId::Event => Some(TableId::EventPtr),
            TableId::Property => Some(TableId::PropertyPtr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering() {
        assert_eq!(TableId::COUNT, 53);
        assert_eq!(TableId::GenericParamConstraint as u8, 0x2C);
        assert_eq!(TableId::CustomDebugInformation as u8, 0x37);

        let mut previous = None;
        for table in TableId::iter() {
            assert_eq!(TableId::from_u8(table as u8), Some(table));
            assert!(previous < Some(table as u8));
            previous = Some(table as u8);
        }

        assert_eq!(TableId::from_u8(0x2D), None);
        assert_eq!(TableId::from_u8(0x38), None);
    }

    #[test]
    fn masks() {
        let all = TableId::iter().fold(0u64, |mask, table| mask | table.mask());
        assert_eq!(all, VALID_TABLES_MASK);

        let debug = TableId::iter()
            .filter(|table| table.is_debug_table())
            .fold(0u64, |mask, table| mask | table.mask());
        assert_eq!(debug, DEBUG_TABLES_MASK);
        assert_eq!(VALID_TABLES_MASK & !DEBUG_TABLES_MASK, TYPE_SYSTEM_TABLES_MASK);

        let ptr: Vec<TableId> = TableId::iter().filter(|t| t.is_ptr_table()).collect();
        assert_eq!(
            ptr,
            vec![
                TableId::FieldPtr,
                TableId::MethodPtr,
                TableId::ParamPtr,
                TableId::EventPtr,
                TableId::PropertyPtr
            ]
        );
        assert_eq!(TableId::Param.ptr_table(), Some(TableId::ParamPtr));
        assert_eq!(TableId::TypeDef.ptr_table(), None);
    }
}
