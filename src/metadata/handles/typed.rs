//! Strongly typed handles, one per table and heap.
//!
//! Every typed handle is a `u32` newtype. Converting into [`Handle`] or [`EntityHandle`] is
//! infallible, converting back is checked and fails with [`Error::InvalidCast`] when the
//! kind does not match, or when a virtual handle is narrowed into a type that only addresses
//! physical rows.

use std::fmt;

use crate::{
    metadata::{
        handles::{EntityHandle, Handle, HandleKind, HeapKind, ROW_ID_MASK, VIRTUAL_BIT},
        tables::*,
    },
    Error, Result,
};

/// Typed handles that address a row of one specific table
pub trait RowHandle: Copy + Into<EntityHandle> {
    /// The decoded row of the addressed table
    type Row: RowReadable;

    /// The table this handle type addresses
    const TABLE: TableId;

    /// Create a handle for `row`
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `row` exceeds 24 bits
    fn from_row(row: u32) -> Result<Self>;

    /// The 1-based row id
    fn row(self) -> u32;

    /// Returns `true` for the nil handle
    fn is_nil(self) -> bool {
        self.row() == 0
    }
}

fn check_row(table: TableId, row: u32) -> Result<()> {
    if row > ROW_ID_MASK {
        return Err(Error::InvalidHandle(format!(
            "{table:?} row {row:#x} exceeds 24 bits"
        )));
    }
    Ok(())
}

macro_rules! entity_handles {
    (@virtual) => { false };
    (@virtual $virtual:ident) => { true };

    ($($(#[$meta:meta])* $name:ident => $table:ident, $row:ident $(, $virtual:ident)?;)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
            pub struct $name(u32);

            impl $name {
                /// The nil handle
                pub const NIL: $name = $name(0);

                /// Returns `true` for the nil handle
                #[must_use]
                pub const fn is_nil(self) -> bool {
                    self.0 == 0
                }

                /// The 1-based row id, or the virtual index
                #[must_use]
                pub const fn row(self) -> u32 {
                    self.0 & ROW_ID_MASK
                }

                /// Returns `true` if this handle addresses a projection entry
                #[must_use]
                pub const fn is_virtual(self) -> bool {
                    self.0 & VIRTUAL_BIT != 0
                }

                /// Create a handle for `row`
                ///
                /// # Errors
                /// Returns [`Error::InvalidHandle`] if `row` exceeds 24 bits
                pub fn from_row(row: u32) -> Result<Self> {
                    check_row(TableId::$table, row)?;
                    Ok($name(row))
                }

                $(
                    /// Create a virtual handle addressing projection entry `index`
                    ///
                    /// # Errors
                    /// Returns [`Error::InvalidHandle`] if `index` exceeds 24 bits
                    pub fn $virtual(index: u32) -> Result<Self> {
                        check_row(TableId::$table, index)?;
                        Ok($name(index | VIRTUAL_BIT))
                    }
                )?

                const SUPPORTS_VIRTUAL: bool = entity_handles!(@virtual $($virtual)?);
            }

            impl RowHandle for $name {
                type Row = $row;
                const TABLE: TableId = TableId::$table;

                fn from_row(row: u32) -> Result<Self> {
                    $name::from_row(row)
                }

                fn row(self) -> u32 {
                    $name::row(self)
                }
            }

            impl From<$name> for EntityHandle {
                fn from(handle: $name) -> Self {
                    if handle.is_nil() {
                        return EntityHandle::NIL;
                    }

                    // row ids are range checked on construction
                    let converted = if handle.is_virtual() {
                        EntityHandle::new_virtual(TableId::$table, handle.row())
                    } else {
                        EntityHandle::new(TableId::$table, handle.row())
                    };
                    converted.unwrap_or(EntityHandle::NIL)
                }
            }

            impl From<$name> for Handle {
                fn from(handle: $name) -> Self {
                    Handle::from(EntityHandle::from(handle))
                }
            }

            impl TryFrom<EntityHandle> for $name {
                type Error = Error;

                fn try_from(handle: EntityHandle) -> Result<Self> {
                    if handle.is_nil() {
                        return Ok($name::NIL);
                    }

                    if handle.table() != TableId::$table
                        || (handle.is_virtual() && !$name::SUPPORTS_VIRTUAL)
                    {
                        return Err(Error::InvalidCast {
                            from: handle.kind(),
                            to: stringify!($name),
                        });
                    }

                    let virtual_bit = if handle.is_virtual() { VIRTUAL_BIT } else { 0 };
                    Ok($name(handle.row() | virtual_bit))
                }
            }

            impl TryFrom<Handle> for $name {
                type Error = Error;

                fn try_from(handle: Handle) -> Result<Self> {
                    if handle.kind() != HandleKind::Table(TableId::$table) && !handle.is_nil() {
                        return Err(Error::InvalidCast {
                            from: handle.kind(),
                            to: stringify!($name),
                        });
                    }
                    $name::try_from(EntityHandle::try_from(handle)?)
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    if self.is_virtual() {
                        return write!(f, "{}(virtual {})", stringify!($name), self.row());
                    }
                    write!(f, "{}({})", stringify!($name), self.row())
                }
            }
        )+
    };
}

entity_handles! {
    /// A row of the `Module` table
    ModuleHandle => Module, ModuleRaw;
    /// A row of the `TypeRef` table
    TypeRefHandle => TypeRef, TypeRefRaw;
    /// A row of the `TypeDef` table
    TypeDefHandle => TypeDef, TypeDefRaw;
    /// A row of the `FieldPtr` table
    FieldPtrHandle => FieldPtr, FieldPtrRaw;
    /// A row of the `Field` table
    FieldHandle => Field, FieldRaw;
    /// A row of the `MethodPtr` table
    MethodPtrHandle => MethodPtr, MethodPtrRaw;
    /// A row of the `MethodDef` table
    MethodDefHandle => MethodDef, MethodDefRaw;
    /// A row of the `ParamPtr` table
    ParamPtrHandle => ParamPtr, ParamPtrRaw;
    /// A row of the `Param` table
    ParamHandle => Param, ParamRaw;
    /// A row of the `InterfaceImpl` table
    InterfaceImplHandle => InterfaceImpl, InterfaceImplRaw;
    /// A row of the `MemberRef` table
    MemberRefHandle => MemberRef, MemberRefRaw;
    /// A row of the `Constant` table
    ConstantHandle => Constant, ConstantRaw;
    /// A row of the `CustomAttribute` table
    CustomAttributeHandle => CustomAttribute, CustomAttributeRaw;
    /// A row of the `FieldMarshal` table
    FieldMarshalHandle => FieldMarshal, FieldMarshalRaw;
    /// A row of the `DeclSecurity` table
    DeclSecurityHandle => DeclSecurity, DeclSecurityRaw;
    /// A row of the `ClassLayout` table
    ClassLayoutHandle => ClassLayout, ClassLayoutRaw;
    /// A row of the `FieldLayout` table
    FieldLayoutHandle => FieldLayout, FieldLayoutRaw;
    /// A row of the `StandAloneSig` table
    StandAloneSigHandle => StandAloneSig, StandAloneSigRaw;
    /// A row of the `EventMap` table
    EventMapHandle => EventMap, EventMapRaw;
    /// A row of the `EventPtr` table
    EventPtrHandle => EventPtr, EventPtrRaw;
    /// A row of the `Event` table
    EventHandle => Event, EventRaw;
    /// A row of the `PropertyMap` table
    PropertyMapHandle => PropertyMap, PropertyMapRaw;
    /// A row of the `PropertyPtr` table
    PropertyPtrHandle => PropertyPtr, PropertyPtrRaw;
    /// A row of the `Property` table
    PropertyHandle => Property, PropertyRaw;
    /// A row of the `MethodSemantics` table
    MethodSemanticsHandle => MethodSemantics, MethodSemanticsRaw;
    /// A row of the `MethodImpl` table
    MethodImplHandle => MethodImpl, MethodImplRaw;
    /// A row of the `ModuleRef` table
    ModuleRefHandle => ModuleRef, ModuleRefRaw;
    /// A row of the `TypeSpec` table
    TypeSpecHandle => TypeSpec, TypeSpecRaw;
    /// A row of the `ImplMap` table
    ImplMapHandle => ImplMap, ImplMapRaw;
    /// A row of the `FieldRVA` table
    FieldRvaHandle => FieldRva, FieldRvaRaw;
    /// A row of the `EncLog` table
    EncLogHandle => EncLog, EncLogRaw;
    /// A row of the `EncMap` table
    EncMapHandle => EncMap, EncMapRaw;
    /// A row of the `Assembly` table
    AssemblyHandle => Assembly, AssemblyRaw;
    /// A row of the `AssemblyProcessor` table
    AssemblyProcessorHandle => AssemblyProcessor, AssemblyProcessorRaw;
    /// A row of the `AssemblyOS` table
    AssemblyOsHandle => AssemblyOs, AssemblyOsRaw;
    /// A row of the `AssemblyRef` table, or a projected assembly reference
    AssemblyRefHandle => AssemblyRef, AssemblyRefRaw, from_virtual_index;
    /// A row of the `AssemblyRefProcessor` table
    AssemblyRefProcessorHandle => AssemblyRefProcessor, AssemblyRefProcessorRaw;
    /// A row of the `AssemblyRefOS` table
    AssemblyRefOsHandle => AssemblyRefOs, AssemblyRefOsRaw;
    /// A row of the `File` table
    FileHandle => File, FileRaw;
    /// A row of the `ExportedType` table
    ExportedTypeHandle => ExportedType, ExportedTypeRaw;
    /// A row of the `ManifestResource` table
    ManifestResourceHandle => ManifestResource, ManifestResourceRaw;
    /// A row of the `NestedClass` table
    NestedClassHandle => NestedClass, NestedClassRaw;
    /// A row of the `GenericParam` table
    GenericParamHandle => GenericParam, GenericParamRaw;
    /// A row of the `MethodSpec` table
    MethodSpecHandle => MethodSpec, MethodSpecRaw;
    /// A row of the `GenericParamConstraint` table
    GenericParamConstraintHandle => GenericParamConstraint, GenericParamConstraintRaw;
    /// A row of the `Document` table
    DocumentHandle => Document, DocumentRaw;
    /// A row of the `MethodDebugInformation` table
    MethodDebugInformationHandle => MethodDebugInformation, MethodDebugInformationRaw;
    /// A row of the `LocalScope` table
    LocalScopeHandle => LocalScope, LocalScopeRaw;
    /// A row of the `LocalVariable` table
    LocalVariableHandle => LocalVariable, LocalVariableRaw;
    /// A row of the `LocalConstant` table
    LocalConstantHandle => LocalConstant, LocalConstantRaw;
    /// A row of the `ImportScope` table
    ImportScopeHandle => ImportScope, ImportScopeRaw;
    /// A row of the `StateMachineMethod` table
    StateMachineMethodHandle => StateMachineMethod, StateMachineMethodRaw;
    /// A row of the `CustomDebugInformation` table
    CustomDebugInformationHandle => CustomDebugInformation, CustomDebugInformationRaw;
}

macro_rules! heap_handles {
    (@virtual) => { false };
    (@virtual $virtual:ident) => { true };

    ($($(#[$meta:meta])* $name:ident => $heap:ident $(, $virtual:ident)?;)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
            pub struct $name(u32);

            impl $name {
                /// The nil handle
                pub const NIL: $name = $name(0);

                /// Create a handle for heap offset `offset`
                ///
                /// # Errors
                /// Returns [`Error::InvalidHandle`] if `offset` exceeds the range of the heap kind
                pub fn from_offset(offset: u32) -> Result<Self> {
                    if offset > HeapKind::$heap.max_offset() {
                        return Err(Error::InvalidHandle(format!(
                            "{} offset {:#x} out of range",
                            stringify!($name),
                            offset
                        )));
                    }
                    Ok($name(offset))
                }

                $(
                    /// Create a virtual handle addressing projection entry `index`
                    ///
                    /// # Errors
                    /// Returns [`Error::InvalidHandle`] if `index` exceeds the range of the heap kind
                    pub fn $virtual(index: u32) -> Result<Self> {
                        Ok($name($name::from_offset(index)?.0 | VIRTUAL_BIT))
                    }
                )?

                /// The heap offset, or the virtual index
                #[must_use]
                pub const fn offset(self) -> u32 {
                    self.0 & !VIRTUAL_BIT
                }

                /// Returns `true` for the nil handle
                #[must_use]
                pub const fn is_nil(self) -> bool {
                    self.0 == 0
                }

                /// Returns `true` if this handle addresses a projection entry
                #[must_use]
                pub const fn is_virtual(self) -> bool {
                    self.0 & VIRTUAL_BIT != 0
                }
            }

            impl From<$name> for Handle {
                fn from(handle: $name) -> Self {
                    if handle.is_nil() {
                        return Handle::NIL;
                    }
                    Handle::from_parts(
                        HandleKind::Heap(HeapKind::$heap),
                        handle.offset(),
                        handle.is_virtual(),
                    )
                }
            }

            impl TryFrom<Handle> for $name {
                type Error = Error;

                fn try_from(handle: Handle) -> Result<Self> {
                    if handle.is_nil() {
                        return Ok($name::NIL);
                    }

                    let supports_virtual = heap_handles!(@virtual $($virtual)?);
                    if handle.kind() != HandleKind::Heap(HeapKind::$heap)
                        || (handle.is_virtual() && !supports_virtual)
                    {
                        return Err(Error::InvalidCast {
                            from: handle.kind(),
                            to: stringify!($name),
                        });
                    }

                    let virtual_bit = if handle.is_virtual() { VIRTUAL_BIT } else { 0 };
                    Ok($name(handle.value() | virtual_bit))
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    if self.is_virtual() {
                        return write!(f, "{}(virtual {})", stringify!($name), self.offset());
                    }
                    write!(f, "{}({:#x})", stringify!($name), self.offset())
                }
            }
        )+
    };
}

heap_handles! {
    /// An offset into the `#Strings` heap, or a projected well-known string
    StringHandle => String, from_virtual_index;
    /// An offset into the `#Blob` heap, or a projected blob
    BlobHandle => Blob, from_virtual_index;
    /// A 1-based index into the `#GUID` heap
    GuidHandle => Guid;
    /// An offset into the `#US` heap
    UserStringHandle => UserString;
}
