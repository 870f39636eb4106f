//! `use cilmeta::prelude::*;` brings in the reader, the handles, the common rows and the
//! blob builders.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// Error of every fallible operation
pub use crate::Error;

/// `Result<T, Error>`
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The metadata reader, its options and the owning wrapper
pub use crate::metadata::reader::{
    MetadataReader, MetadataReaderOptions, MetadataStringDecoder, OwnedMetadata,
    ProjectionProvider, Utf8Decoder,
};

/// Cursor over blobs and signatures
pub use crate::Parser;

/// Metadata root constants
pub use crate::metadata::root::CIL_HEADER_MAGIC;

// ================================================================================================
// Handles
// ================================================================================================

/// Untyped handles, kinds and tokens
pub use crate::metadata::handles::{
    EntityHandle, Handle, HandleKind, HandleRange, HeapKind, RowHandle, Token,
};

/// Heap handles
pub use crate::metadata::handles::{BlobHandle, GuidHandle, StringHandle, UserStringHandle};

/// Handles of the type system tables
pub use crate::metadata::handles::{
    AssemblyRefHandle, CustomAttributeHandle, EventHandle, FieldHandle, GenericParamHandle,
    MemberRefHandle, MethodDefHandle, ParamHandle, PropertyHandle, TypeDefHandle, TypeRefHandle,
    TypeSpecHandle,
};

// ================================================================================================
// Tables
// ================================================================================================

/// Table numbers, coded indexes and the generic table view
pub use crate::metadata::tables::{CodedIndexType, MetadataTable, TableId};

/// The most frequently used rows
pub use crate::metadata::tables::{
    AssemblyRaw, AssemblyRefRaw, CustomAttributeRaw, FieldRaw, MemberRefRaw, MethodDefRaw,
    ModuleRaw, ParamRaw, TypeDefRaw, TypeRefRaw,
};

/// Stream level structures
pub use crate::metadata::streams::{HeapSizes, TablesHeader};

// ================================================================================================
// Emission
// ================================================================================================

/// Builders and writers
pub use crate::blob::{Blob, BlobBuilder, BlobWrite, BlobWriter, ChunkPool};

/// Constant values shared by the reader and the builders
pub use crate::codec::{ConstantTypeCode, ConstantValue};
