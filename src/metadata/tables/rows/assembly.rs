//! Assembly manifest tables.

use crate::metadata::{
    handles::{AssemblyRefHandle, BlobHandle, EntityHandle, StringHandle},
    tables::{CodedIndexType, Column, TableId},
};

metadata_row! {
    /// The `Assembly` table, at most one row (ECMA-335 II.22.2)
    AssemblyRaw, Assembly {
        /// `AssemblyHashAlgorithm`
        hash_alg_id: u32 => Column::U32,
        /// Major version
        major_version: u16 => Column::U16,
        /// Minor version
        minor_version: u16 => Column::U16,
        /// Build number
        build_number: u16 => Column::U16,
        /// Revision number
        revision_number: u16 => Column::U16,
        /// `AssemblyFlags`
        flags: u32 => Column::U32,
        /// Full public key
        public_key: BlobHandle => Column::Blob,
        /// Simple name
        name: StringHandle => Column::String,
        /// Culture name, nil for neutral
        culture: StringHandle => Column::String,
    }
}

metadata_row! {
    /// The `AssemblyProcessor` table, ignored by the runtime
    AssemblyProcessorRaw, AssemblyProcessor {
        /// Processor id
        processor: u32 => Column::U32,
    }
}

metadata_row! {
    /// The `AssemblyOS` table, ignored by the runtime
    AssemblyOsRaw, AssemblyOs {
        /// Platform id
        os_platform_id: u32 => Column::U32,
        /// Major OS version
        os_major_version: u32 => Column::U32,
        /// Minor OS version
        os_minor_version: u32 => Column::U32,
    }
}

metadata_row! {
    /// The `AssemblyRef` table (ECMA-335 II.22.5)
    AssemblyRefRaw, AssemblyRef {
        /// Major version
        major_version: u16 => Column::U16,
        /// Minor version
        minor_version: u16 => Column::U16,
        /// Build number
        build_number: u16 => Column::U16,
        /// Revision number
        revision_number: u16 => Column::U16,
        /// `AssemblyFlags`
        flags: u32 => Column::U32,
        /// Public key or its token, see `flags`
        public_key_or_token: BlobHandle => Column::Blob,
        /// Simple name
        name: StringHandle => Column::String,
        /// Culture name
        culture: StringHandle => Column::String,
        /// Hash of the referenced assembly
        hash_value: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `AssemblyRefProcessor` table
    AssemblyRefProcessorRaw, AssemblyRefProcessor {
        /// Processor id
        processor: u32 => Column::U32,
        /// The owning reference
        assembly_ref: AssemblyRefHandle => Column::Table(TableId::AssemblyRef),
    }
}

metadata_row! {
    /// The `AssemblyRefOS` table
    AssemblyRefOsRaw, AssemblyRefOs {
        /// Platform id
        os_platform_id: u32 => Column::U32,
        /// Major OS version
        os_major_version: u32 => Column::U32,
        /// Minor OS version
        os_minor_version: u32 => Column::U32,
        /// The owning reference
        assembly_ref: AssemblyRefHandle => Column::Table(TableId::AssemblyRef),
    }
}

metadata_row! {
    /// The `File` table (ECMA-335 II.22.19)
    FileRaw, File {
        /// `FileAttributes`
        flags: u32 => Column::U32,
        /// File name
        name: StringHandle => Column::String,
        /// Hash of the file content
        hash_value: BlobHandle => Column::Blob,
    }
}

metadata_row! {
    /// The `ExportedType` table (ECMA-335 II.22.14)
    ExportedTypeRaw, ExportedType {
        /// `TypeAttributes`
        flags: u32 => Column::U32,
        /// Hint for the `TypeDef` row in the defining module
        type_def_id: u32 => Column::U32,
        /// Name of the type
        name: StringHandle => Column::String,
        /// Namespace of the type
        namespace: StringHandle => Column::String,
        /// `File`, `AssemblyRef` or enclosing `ExportedType`
        implementation: EntityHandle => Column::Coded(CodedIndexType::Implementation),
    }
}

metadata_row! {
    /// The `ManifestResource` table (ECMA-335 II.22.24)
    ManifestResourceRaw, ManifestResource {
        /// Offset of the resource in the resource section, or in its file
        offset_field: u32 => Column::U32,
        /// `ManifestResourceAttributes`
        flags: u32 => Column::U32,
        /// Name of the resource
        name: StringHandle => Column::String,
        /// Nil for embedded resources, else the `File` or `AssemblyRef` holding it
        implementation: EntityHandle => Column::Coded(CodedIndexType::Implementation),
    }
}

metadata_row! {
    /// The `ModuleRef` table (ECMA-335 II.22.31)
    ModuleRefRaw, ModuleRef {
        /// Name of the module
        name: StringHandle => Column::String,
    }
}
