//! Fields, methods, parameters, events, properties and the tables attached to them.

use crate::metadata::{
    handles::{
        BlobHandle, EntityHandle, EventHandle, FieldHandle, MethodDefHandle, ModuleRefHandle,
        ParamHandle, PropertyHandle, StringHandle, TypeDefHandle,
    },
    tables::{CodedIndexType, Column, TableId},
};

metadata_row! {
    /// The `FieldPtr` table, an indirection only present in unoptimized metadata
    FieldPtrRaw, FieldPtr {
        /// The field in logical position `rid`
        field: FieldHandle => Column::Table(TableId::Field),
    }
}

metadata_row! {
    /// The `Field` table (ECMA-335 II.22.15)
    FieldRaw, Field {
        /// `FieldAttributes`
        flags: u16 => Column::U16,
        /// Name of the field
        name: StringHandle => Column::String,
        /// Field signature
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `MethodPtr` table
    MethodPtrRaw, MethodPtr {
        /// The method in logical position `rid`
        method: MethodDefHandle => Column::Table(TableId::MethodDef),
    }
}

metadata_row! {
    /// The `MethodDef` table (ECMA-335 II.22.26)
    MethodDefRaw, MethodDef {
        /// RVA of the method body, 0 for abstract and extern methods
        rva: u32 => Column::U32,
        /// `MethodImplAttributes`
        impl_flags: u16 => Column::U16,
        /// `MethodAttributes`
        flags: u16 => Column::U16,
        /// Name of the method
        name: StringHandle => Column::String,
        /// Method signature
        signature: BlobHandle => Column::Blob,
        /// First parameter owned by this method
        param_list: u32 => Column::List(TableId::Param),
    }
}

metadata_row! {
    /// The `ParamPtr` table
    ParamPtrRaw, ParamPtr {
        /// The parameter in logical position `rid`
        param: ParamHandle => Column::Table(TableId::Param),
    }
}

metadata_row! {
    /// The `Param` table (ECMA-335 II.22.33)
    ParamRaw, Param {
        /// `ParamAttributes`
        flags: u16 => Column::U16,
        /// 1-based position, 0 refers to the return value
        sequence: u16 => Column::U16,
        /// Name of the parameter
        name: StringHandle => Column::String,
    }
}

metadata_row! {
    /// The `MemberRef` table (ECMA-335 II.22.25)
    MemberRefRaw, MemberRef {
        /// Type, module or method the member belongs to
        class: EntityHandle => Column::Coded(CodedIndexType::MemberRefParent),
        /// Name of the member
        name: StringHandle => Column::String,
        /// Field or method signature
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `Constant` table, sorted by `parent` (ECMA-335 II.22.9)
    ConstantRaw, Constant {
        /// `ELEMENT_TYPE_*` of the value, followed by a padding byte
        base_type: u8 => Column::U8,
        /// Field, parameter or property owning the value
        parent: EntityHandle => Column::Coded(CodedIndexType::HasConstant),
        /// Encoded value
        value: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `CustomAttribute` table, sorted by `parent` (ECMA-335 II.22.10)
    CustomAttributeRaw, CustomAttribute {
        /// The attributed entity
        parent: EntityHandle => Column::Coded(CodedIndexType::HasCustomAttribute),
        /// The attribute constructor
        constructor: EntityHandle => Column::Coded(CodedIndexType::CustomAttributeType),
        /// Encoded arguments
        value: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `FieldMarshal` table, sorted by `parent` (ECMA-335 II.22.17)
    FieldMarshalRaw, FieldMarshal {
        /// Field or parameter being marshalled
        parent: EntityHandle => Column::Coded(CodedIndexType::HasFieldMarshal),
        /// Marshalling descriptor
        native_type: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `DeclSecurity` table, sorted by `parent` (ECMA-335 II.22.11)
    DeclSecurityRaw, DeclSecurity {
        /// `SecurityAction`
        action: u16 => Column::U16,
        /// Type, method or assembly the permissions apply to
        parent: EntityHandle => Column::Coded(CodedIndexType::HasDeclSecurity),
        /// Serialized permission set
        permission_set: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `FieldLayout` table, sorted by `field` (ECMA-335 II.22.16)
    FieldLayoutRaw, FieldLayout {
        /// Byte offset of the field within its type
        field_offset: u32 => Column::U32,
        /// The laid out field
        field: FieldHandle => Column::Table(TableId::Field),
    }
}

metadata_row! {
    /// The `StandAloneSig` table (ECMA-335 II.22.36)
    StandAloneSigRaw, StandAloneSig {
        /// Local variable or call site signature
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `EventMap` table, sorted by `parent` (ECMA-335 II.22.12)
    EventMapRaw, EventMap {
        /// The type owning the events
        parent: TypeDefHandle => Column::Table(TableId::TypeDef),
        /// First event of the run
        event_list: u32 => Column::List(TableId::Event),
    }
}

metadata_row! {
    /// The `EventPtr` table
    EventPtrRaw, EventPtr {
        /// The event in logical position `rid`
        event: EventHandle => Column::Table(TableId::Event),
    }
}

metadata_row! {
    /// The `Event` table (ECMA-335 II.22.13)
    EventRaw, Event {
        /// `EventAttributes`
        flags: u16 => Column::U16,
        /// Name of the event
        name: StringHandle => Column::String,
        /// Delegate type of the event
        event_type: EntityHandle => Column::Coded(CodedIndexType::TypeDefOrRef),
    }
}

metadata_row! {
    /// The `PropertyMap` table, sorted by `parent` (ECMA-335 II.22.35)
    PropertyMapRaw, PropertyMap {
        /// The type owning the properties
        parent: TypeDefHandle => Column::Table(TableId::TypeDef),
        /// First property of the run
        property_list: u32 => Column::List(TableId::Property),
    }
}

metadata_row! {
    /// The `PropertyPtr` table
    PropertyPtrRaw, PropertyPtr {
        /// The property in logical position `rid`
        property: PropertyHandle => Column::Table(TableId::Property),
    }
}

metadata_row! {
    /// The `Property` table (ECMA-335 II.22.34)
    PropertyRaw, Property {
        /// `PropertyAttributes`
        flags: u16 => Column::U16,
        /// Name of the property
        name: StringHandle => Column::String,
        /// Property signature
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `MethodSemantics` table, sorted by `association` (ECMA-335 II.22.28)
    MethodSemanticsRaw, MethodSemantics {
        /// `MethodSemanticsAttributes`
        semantics: u16 => Column::U16,
        /// The accessor method
        method: MethodDefHandle => Column::Table(TableId::MethodDef),
        /// Event or property the accessor belongs to
        association: EntityHandle => Column::Coded(CodedIndexType::HasSemantics),
    }
}

metadata_row! {
    /// The `MethodImpl` table, sorted by `class` (ECMA-335 II.22.27)
    MethodImplRaw, MethodImpl {
        /// The type containing the override
        class: TypeDefHandle => Column::Table(TableId::TypeDef),
        /// The implementing method
        method_body: EntityHandle => Column::Coded(CodedIndexType::MethodDefOrRef),
        /// The overridden declaration
        method_declaration: EntityHandle => Column::Coded(CodedIndexType::MethodDefOrRef),
    }
}

metadata_row! {
    /// The `ImplMap` table, sorted by `member_forwarded` (ECMA-335 II.22.22)
    ImplMapRaw, ImplMap {
        /// `PInvokeAttributes`
        mapping_flags: u16 => Column::U16,
        /// The imported field or method
        member_forwarded: EntityHandle => Column::Coded(CodedIndexType::MemberForwarded),
        /// Name of the native entry point
        import_name: StringHandle => Column::String,
        /// The native module
        import_scope: ModuleRefHandle => Column::Table(TableId::ModuleRef),
    }
}

metadata_row! {
    /// The `FieldRVA` table, sorted by `field` (ECMA-335 II.22.18)
    FieldRvaRaw, FieldRva {
        /// RVA of the initial value
        rva: u32 => Column::U32,
        /// The initialized field
        field: FieldHandle => Column::Table(TableId::Field),
    }
}

metadata_row! {
    /// The `MethodSpec` table (ECMA-335 II.22.29)
    MethodSpecRaw, MethodSpec {
        /// The generic method
        method: EntityHandle => Column::Coded(CodedIndexType::MethodDefOrRef),
        /// Instantiation signature
        instantiation: BlobHandle => Column::Blob,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::{MetadataTable, TableInfo};

    #[test]
    fn crafted_method_def() {
        #[rustfmt::skip]
        let data = vec![
            0x50, 0x20, 0x00, 0x00, // rva
            0x00, 0x00,             // impl_flags
            0x86, 0x18,             // flags
            0x2A, 0x00,             // name
            0x01, 0x00,             // signature
            0x01, 0x00,             // param_list
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x06, 0x00,
            0x30, 0x00,
            0x04, 0x00,
            0x02, 0x00,
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::MethodDef, 2), (TableId::Param, 1)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<MethodDefRaw>::new(&data, 2, sizes).unwrap();

        let first = table.get(1).unwrap();
        assert_eq!(first.rid, 1);
        assert_eq!(first.rva, 0x2050);
        assert_eq!(first.flags, 0x1886);
        assert_eq!(first.name.offset(), 0x2A);
        assert_eq!(first.signature.offset(), 1);
        assert_eq!(first.param_list, 1);

        let second = table.get(2).unwrap();
        assert_eq!(second.rva, 0);
        assert_eq!(second.flags, 6);
        assert_eq!(second.param_list, 2);
        assert_eq!(second.token().value(), 0x0600_0002);
    }

    #[test]
    fn crafted_constant() {
        #[rustfmt::skip]
        let data = vec![
            0x08, 0x00, // base_type (ELEMENT_TYPE_I4) + padding
            0x05, 0x00, // parent, Param 1
            0x0C, 0x00, // value
        ];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::Param, 1)], false, false, false));
        let table = MetadataTable::<ConstantRaw>::new(&data, 1, sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.base_type, 0x08);
        assert_eq!(row.parent.table(), TableId::Param);
        assert_eq!(row.parent.row(), 1);
        assert_eq!(row.value.offset(), 0x0C);
    }

    #[test]
    fn crafted_method_semantics() {
        #[rustfmt::skip]
        let data = vec![
            0x08, 0x00, // semantics, Getter
            0x03, 0x00, // method
            0x05, 0x00, // association, Property 2
        ];

        let sizes = Arc::new(TableInfo::new_test(&[], false, false, false));
        let table = MetadataTable::<MethodSemanticsRaw>::new(&data, 1, sizes).unwrap();
        let row = table.get(1).unwrap();

        assert_eq!(row.semantics, 0x08);
        assert_eq!(row.method.row(), 3);
        assert_eq!(row.association.table(), TableId::Property);
        assert_eq!(row.association.row(), 2);
    }
}
