//! Portable PDB tables, found in the `#~` stream of a `#Pdb` metadata block.

use crate::metadata::{
    handles::{
        BlobHandle, DocumentHandle, EntityHandle, GuidHandle, ImportScopeHandle, MethodDefHandle,
        StringHandle,
    },
    tables::{CodedIndexType, Column, TableId},
};

metadata_row! {
    /// The `Document` table
    DocumentRaw, Document {
        /// Document name blob, a separator followed by a list of part blobs
        name: BlobHandle => Column::Blob,
        /// Algorithm of `hash`
        hash_algorithm: GuidHandle => Column::Guid,
        /// Hash of the document content
        hash: BlobHandle => Column::Blob,
        /// Source language
        language: GuidHandle => Column::Guid,
    }
}

metadata_row! {
    /// The `MethodDebugInformation` table, parallel to `MethodDef`
    MethodDebugInformationRaw, MethodDebugInformation {
        /// The single document of the method, nil if the sequence points name several
        document: DocumentHandle => Column::Table(TableId::Document),
        /// Encoded sequence points
        sequence_points: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `LocalScope` table, sorted by `method` then `start_offset`
    LocalScopeRaw, LocalScope {
        /// The method containing the scope
        method: MethodDefHandle => Column::Table(TableId::MethodDef),
        /// Namespace imports in effect
        import_scope: ImportScopeHandle => Column::Table(TableId::ImportScope),
        /// First local variable of the run
        variable_list: u32 => Column::List(TableId::LocalVariable),
        /// First local constant of the run
        constant_list: u32 => Column::List(TableId::LocalConstant),
        /// IL offset the scope starts at
        start_offset: u32 => Column::U32,
        /// IL length of the scope
        length: u32 => Column::U32,
    }
}

metadata_row! {
    /// The `LocalVariable` table
    LocalVariableRaw, LocalVariable {
        /// `LocalVariableAttributes`
        attributes: u16 => Column::U16,
        /// Slot index in the local signature
        index: u16 => Column::U16,
        /// Name of the variable
        name: StringHandle => Column::String,
    }
}

metadata_row! {
    /// The `LocalConstant` table
    LocalConstantRaw, LocalConstant {
        /// Name of the constant
        name: StringHandle => Column::String,
        /// Constant signature holding type and value
        signature: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `ImportScope` table
    ImportScopeRaw, ImportScope {
        /// Enclosing scope, nil at the root
        parent: ImportScopeHandle => Column::Table(TableId::ImportScope),
        /// Encoded imports
        imports: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `StateMachineMethod` table, sorted by `move_next_method`
    StateMachineMethodRaw, StateMachineMethod {
        /// The generated `MoveNext` method
        move_next_method: MethodDefHandle => Column::Table(TableId::MethodDef),
        /// The user-written method
        kickoff_method: MethodDefHandle => Column::Table(TableId::MethodDef),
    }
}

metadata_row! {
    /// The `CustomDebugInformation` table, sorted by `parent`
    CustomDebugInformationRaw, CustomDebugInformation {
        /// The entity the information is attached to
        parent: EntityHandle => Column::Coded(CodedIndexType::HasCustomDebugInformation),
        /// Kind of the information
        kind: GuidHandle => Column::Guid,
        /// Encoded information
        value: BlobHandle => Column::Blob,
    }
}
