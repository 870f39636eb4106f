//! Module, type and generic parameter tables, plus the edit-and-continue log.

use crate::metadata::{
    handles::{
        BlobHandle, EntityHandle, GenericParamHandle, GuidHandle, StringHandle, TypeDefHandle,
    },
    tables::{CodedIndexType, Column, TableId},
};

metadata_row! {
    /// The `Module` table, exactly one row describing the current module (ECMA-335 II.22.30)
    ModuleRaw, Module {
        /// Reserved, shall be zero
        generation: u16 => Column::U16,
        /// Name of the module
        name: StringHandle => Column::String,
        /// Module version id
        mvid: GuidHandle => Column::Guid,
        /// Edit-and-continue id
        encid: GuidHandle => Column::Guid,
        /// Edit-and-continue base id
        encbaseid: GuidHandle => Column::Guid,
    }
}

metadata_row! {
    /// The `TypeRef` table (ECMA-335 II.22.38)
    TypeRefRaw, TypeRef {
        /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef` defining the type
        resolution_scope: EntityHandle => Column::Coded(CodedIndexType::ResolutionScope),
        /// Name of the type
        type_name: StringHandle => Column::String,
        /// Namespace of the type
        type_namespace: StringHandle => Column::String,
    }
}

metadata_row! {
    /// The `TypeDef` table (ECMA-335 II.22.37)
    ///
    /// `field_list` and `method_list` start runs that end where the next row's run starts.
    TypeDefRaw, TypeDef {
        /// `TypeAttributes`
        flags: u32 => Column::U32,
        /// Name of the type
        type_name: StringHandle => Column::String,
        /// Namespace of the type
        type_namespace: StringHandle => Column::String,
        /// Base type, nil for interfaces and `System.Object`
        extends: EntityHandle => Column::Coded(CodedIndexType::TypeDefOrRef),
        /// First field owned by this type
        field_list: u32 => Column::List(TableId::Field),
        /// First method owned by this type
        method_list: u32 => Column::List(TableId::MethodDef),
    }
}

metadata_row! {
    /// The `InterfaceImpl` table, sorted by `class` (ECMA-335 II.22.23)
    InterfaceImplRaw, InterfaceImpl {
        /// The implementing type
        class: TypeDefHandle => Column::Table(TableId::TypeDef),
        /// The implemented interface
        interface: EntityHandle => Column::Coded(CodedIndexType::TypeDefOrRef),
    }
}

metadata_row! {
    /// The `ClassLayout` table, sorted by `parent` (ECMA-335 II.22.8)
    ClassLayoutRaw, ClassLayout {
        /// Field alignment
        packing_size: u16 => Column::U16,
        /// Size of the type in bytes
        class_size: u32 => Column::U32,
        /// The laid out type
        parent: TypeDefHandle => Column::Table(TableId::TypeDef),
    }
}

metadata_row! {
    /// The `TypeSpec` table (ECMA-335 II.22.39)
    TypeSpecRaw, TypeSpec {
        /// Type signature
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `NestedClass` table, sorted by `nested_class` (ECMA-335 II.22.32)
    NestedClassRaw, NestedClass {
        /// The nested type
        nested_class: TypeDefHandle => Column::Table(TableId::TypeDef),
        /// The type declaring it
        enclosing_class: TypeDefHandle => Column::Table(TableId::TypeDef),
    }
}

metadata_row! {
    /// The `GenericParam` table, sorted by `owner` then `number` (ECMA-335 II.22.20)
    GenericParamRaw, GenericParam {
        /// 0-based position in the parameter list
        number: u16 => Column::U16,
        /// `GenericParamAttributes`
        flags: u16 => Column::U16,
        /// `TypeDef` or `MethodDef` declaring the parameter
        owner: EntityHandle => Column::Coded(CodedIndexType::TypeOrMethodDef),
        /// Name of the parameter
        name: StringHandle => Column::String,
    }
}

metadata_row! {
    /// The `GenericParamConstraint` table, sorted by `owner` (ECMA-335 II.22.21)
    GenericParamConstraintRaw, GenericParamConstraint {
        /// The constrained parameter
        owner: GenericParamHandle => Column::Table(TableId::GenericParam),
        /// The constraint type
        constraint: EntityHandle => Column::Coded(CodedIndexType::TypeDefOrRef),
    }
}

metadata_row! {
    /// The `ENCLog` table
    EncLogRaw, EncLog {
        /// Token of the changed entity
        token_value: u32 => Column::U32,
        /// Kind of the change
        func_code: u32 => Column::U32,
    }
}

metadata_row! {
    /// The `ENCMap` table
    EncMapRaw, EncMap {
        /// Token of the mapped entity
        token_value: u32 => Column::U32,
    }
}
