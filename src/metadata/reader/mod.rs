//! The metadata reader facade.
//!
//! [`MetadataReader`] is built once over a borrowed metadata block. Construction reads the root
//! header and the stream directory, validates the table stream and derives every reference
//! width; afterwards the reader is immutable and every query is a projection over the borrowed
//! bytes. A reader is `Send + Sync` and can be shared between threads.
//!
//! # Key Components
//!
//! - [`MetadataReader`] - heaps, tables, typed row access and range queries
//! - [`MetadataReaderOptions`] - strict ECMA-335 or projection aware
//! - [`MetadataStringDecoder`] / [`Utf8Decoder`] - pluggable `#Strings` decoding
//! - [`ProjectionProvider`] - resolves virtual handles
//! - [`OwnedMetadata`] - a reader together with the buffer it borrows
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::MetadataReader;
//!
//! # fn example(data: &[u8]) -> cilmeta::Result<()> {
//! let reader = MetadataReader::new(data)?;
//! println!("Metadata version {}", reader.metadata_version());
//!
//! for type_def in reader.type_definitions() {
//!     for method in reader.methods_of(type_def)? {
//!         let row = reader.method_definition(method)?;
//!         if reader.string_equals(row.name, ".ctor", false)? {
//!             println!("{:?} has a constructor", type_def);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod options;
mod owned;
mod queries;

use std::{borrow::Cow, sync::Arc};

use log::debug;
use widestring::U16String;

use crate::{
    codec::Parser,
    metadata::{
        handles::{
            AssemblyRefHandle, BlobHandle, EntityHandle, GuidHandle, HandleRange, RowHandle,
            StringHandle, UserStringHandle,
        },
        root::Root,
        streams::{Blob, Guid, PdbStream, StreamKind, Strings, TablesHeader, UserStrings},
        tables::AssemblyRefRaw,
    },
    Error, Result,
};

pub use options::{MetadataReaderOptions, MetadataStringDecoder, ProjectionProvider, Utf8Decoder};
pub use owned::OwnedMetadata;

/// The immutable query surface over one metadata block
///
/// Heaps that are absent from the block behave as empty heaps: offset 0 of each yields the
/// empty entry and any other offset is out of bounds. The table stream is mandatory.
pub struct MetadataReader<'a> {
    data: &'a [u8],
    options: MetadataReaderOptions,
    decoder: Arc<dyn MetadataStringDecoder>,
    projection: Option<Arc<dyn ProjectionProvider>>,
    root: Root,
    tables: TablesHeader<'a>,
    strings: Strings<'a>,
    user_strings: UserStrings<'a>,
    blobs: Blob<'a>,
    guids: Guid<'a>,
    pdb: Option<PdbStream>,
}

impl<'a> MetadataReader<'a> {
    /// Read a metadata block with [`MetadataReaderOptions::NONE`]
    ///
    /// # Arguments
    /// * `data` - The metadata block, starting with the `BSJB` signature
    ///
    /// # Errors
    /// See [`MetadataReader::with_options`]
    pub fn new(data: &'a [u8]) -> Result<MetadataReader<'a>> {
        MetadataReader::with_options(data, MetadataReaderOptions::NONE)
    }

    /// Read a metadata block
    ///
    /// # Arguments
    /// * `data`    - The metadata block, starting with the `BSJB` signature
    /// * `options` - How virtual handles are treated
    ///
    /// # Errors
    /// Returns [`Error::Empty`] for an empty block, and a format error
    /// ([`Error::is_format_error`]) for any inconsistency of the root header, the stream
    /// directory, the heaps or the table stream. No reader is returned in that case.
    pub fn with_options(
        data: &'a [u8],
        options: MetadataReaderOptions,
    ) -> Result<MetadataReader<'a>> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let root = Root::read(data)?;

        let mut strings = Strings::default();
        let mut user_strings = UserStrings::default();
        let mut blobs = Blob::default();
        let mut guids = Guid::default();
        let mut pdb = None;

        for header in &root.stream_headers {
            let content = header.data(data)?;
            match header.kind() {
                Some(_) if content.is_empty() => {
                    debug!("Stream {} is empty", header.name);
                }
                Some(StreamKind::Strings) => strings = Strings::from(content)?,
                Some(StreamKind::UserStrings) => user_strings = UserStrings::from(content)?,
                Some(StreamKind::Blob) => blobs = Blob::from(content)?,
                Some(StreamKind::Guid) => guids = Guid::from(content)?,
                Some(StreamKind::Pdb) => pdb = Some(PdbStream::read(content)?),
                _ => {}
            }
        }

        let Some(tables_stream) = root.tables_stream() else {
            return Err(malformed_error!("Metadata has no #~ or #- stream"));
        };
        let kind = tables_stream.kind().unwrap_or(StreamKind::Tables);
        let minimal_delta = root.stream(StreamKind::MinimalDelta).is_some();
        let tables = TablesHeader::read(
            tables_stream.data(data)?,
            kind,
            minimal_delta,
            pdb.as_ref(),
        )?;

        debug!(
            "Metadata {}: {} streams, {} tables, options {:?}",
            root.version,
            root.stream_headers.len(),
            tables.table_count(),
            options
        );

        Ok(MetadataReader {
            data,
            options,
            decoder: Arc::new(Utf8Decoder),
            projection: None,
            root,
            tables,
            strings,
            user_strings,
            blobs,
            guids,
            pdb,
        })
    }

    /// Replace the decoder used by [`MetadataReader::decode_string`]
    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn MetadataStringDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Install the provider resolving virtual handles
    ///
    /// Only consulted if the reader was built with
    /// [`MetadataReaderOptions::APPLY_WINDOWS_RUNTIME_PROJECTIONS`].
    #[must_use]
    pub fn with_projection(mut self, provider: Arc<dyn ProjectionProvider>) -> Self {
        self.projection = Some(provider);
        self
    }

    /// The metadata block this reader was built over
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The options this reader was built with
    #[must_use]
    pub fn options(&self) -> MetadataReaderOptions {
        self.options
    }

    /// The root header and stream directory
    #[must_use]
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The version string of the root header, e.g. `v4.0.30319`
    #[must_use]
    pub fn metadata_version(&self) -> &str {
        &self.root.version
    }

    /// Returns `true` if a `#JTD` stream forces every reference to 4 bytes
    #[must_use]
    pub fn is_minimal_delta(&self) -> bool {
        self.tables.info.is_minimal_delta()
    }

    /// The table stream
    #[must_use]
    pub fn tables(&self) -> &TablesHeader<'a> {
        &self.tables
    }

    /// The `#Strings` heap
    #[must_use]
    pub fn strings(&self) -> &Strings<'a> {
        &self.strings
    }

    /// The `#US` heap
    #[must_use]
    pub fn user_strings(&self) -> &UserStrings<'a> {
        &self.user_strings
    }

    /// The `#Blob` heap
    #[must_use]
    pub fn blobs(&self) -> &Blob<'a> {
        &self.blobs
    }

    /// The `#GUID` heap
    #[must_use]
    pub fn guids(&self) -> &Guid<'a> {
        &self.guids
    }

    /// The `#Pdb` stream of a standalone Portable PDB
    #[must_use]
    pub fn pdb(&self) -> Option<&PdbStream> {
        self.pdb.as_ref()
    }

    fn projection(&self) -> Result<&dyn ProjectionProvider> {
        match &self.projection {
            Some(provider)
                if self
                    .options
                    .contains(MetadataReaderOptions::APPLY_WINDOWS_RUNTIME_PROJECTIONS) =>
            {
                Ok(provider.as_ref())
            }
            _ => Err(Error::InvalidHandle(
                "virtual handle without an active projection".to_string(),
            )),
        }
    }

    fn virtual_string(&self, handle: StringHandle) -> Result<&'static str> {
        self.projection()?
            .string(handle.offset())
            .ok_or_else(|| Error::InvalidHandle(format!("{handle:?}")))
    }

    fn virtual_blob(&self, handle: BlobHandle) -> Result<&'static [u8]> {
        self.projection()?
            .blob(handle.offset())
            .ok_or_else(|| Error::InvalidHandle(format!("{handle:?}")))
    }

    /// The `#Strings` entry of `handle`, strictly validated as UTF-8
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for an offset past the heap, [`Error::Malformed`] for an
    /// unterminated entry or invalid UTF-8, and [`Error::InvalidHandle`] for a virtual handle
    /// that no active projection resolves
    pub fn get_string(&self, handle: StringHandle) -> Result<&'a str> {
        if handle.is_virtual() {
            return self.virtual_string(handle);
        }
        self.strings.get(handle.offset() as usize)
    }

    /// The `#Strings` entry of `handle`, decoded through the installed decoder
    ///
    /// # Errors
    /// Same as [`MetadataReader::get_string`], except that invalid UTF-8 is not an error
    pub fn decode_string(&self, handle: StringHandle) -> Result<Cow<'a, str>> {
        if handle.is_virtual() {
            return self.virtual_string(handle).map(Cow::Borrowed);
        }
        self.strings
            .decode(handle.offset() as usize, self.decoder.as_ref())
    }

    /// Compare the `#Strings` entry of `handle` with `text` without decoding it
    ///
    /// # Errors
    /// Same as [`MetadataReader::get_string`], except that invalid UTF-8 is not an error
    pub fn string_equals(&self, handle: StringHandle, text: &str, ignore_case: bool) -> Result<bool> {
        if handle.is_virtual() {
            let value = self.virtual_string(handle)?;
            return Ok(if ignore_case {
                value.to_lowercase() == text.to_lowercase()
            } else {
                value == text
            });
        }
        self.strings
            .equals(handle.offset() as usize, text, ignore_case)
    }

    /// Test whether the `#Strings` entry of `handle` starts with `prefix` without decoding it
    ///
    /// # Errors
    /// Same as [`MetadataReader::string_equals`]
    pub fn string_starts_with(
        &self,
        handle: StringHandle,
        prefix: &str,
        ignore_case: bool,
    ) -> Result<bool> {
        if handle.is_virtual() {
            let value = self.virtual_string(handle)?;
            return Ok(if ignore_case {
                value.to_lowercase().starts_with(&prefix.to_lowercase())
            } else {
                value.starts_with(prefix)
            });
        }
        self.strings
            .starts_with(handle.offset() as usize, prefix, ignore_case)
    }

    /// The bytes of the `#Blob` entry of `handle`
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for an offset past the heap or a truncated entry, and
    /// [`Error::InvalidHandle`] for an unresolved virtual handle
    pub fn get_blob(&self, handle: BlobHandle) -> Result<&'a [u8]> {
        if handle.is_virtual() {
            return self.virtual_blob(handle);
        }
        self.blobs.get(handle.offset() as usize)
    }

    /// A [`Parser`] over the `#Blob` entry of `handle`, e.g. for reading a signature
    ///
    /// # Errors
    /// Same as [`MetadataReader::get_blob`]
    pub fn blob_reader(&self, handle: BlobHandle) -> Result<Parser<'a>> {
        Ok(Parser::new(self.get_blob(handle)?))
    }

    /// The `#GUID` entry of `handle`, the nil handle yields the all-zero GUID
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for an index past the heap
    pub fn get_guid(&self, handle: GuidHandle) -> Result<uguid::Guid> {
        self.guids.get(handle.offset() as usize)
    }

    /// The `#US` entry of `handle` as UTF-16
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for an offset past the heap or a truncated entry
    pub fn get_user_string(&self, handle: UserStringHandle) -> Result<U16String> {
        self.user_strings.get(handle.offset() as usize)
    }

    /// Decode the row `handle` addresses
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the nil handle, a virtual handle, or a row past the
    /// end of the table
    pub fn row<H: RowHandle>(&self, handle: H) -> Result<H::Row> {
        let entity: EntityHandle = handle.into();
        if entity.is_virtual() {
            return Err(Error::InvalidHandle(format!(
                "virtual {:?} row {} has no physical row",
                H::TABLE,
                handle.row()
            )));
        }
        self.tables.table::<H::Row>().get(handle.row())
    }

    /// All rows of `H::TABLE` in logical order
    #[must_use]
    pub fn handles<H: RowHandle>(&self) -> HandleRange<'_, H> {
        self.tables.handles::<H>()
    }

    /// The `AssemblyRef` row of `handle`, virtual handles resolve through the projection
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if the row does not exist or a virtual handle is not
    /// resolved
    pub fn assembly_reference(&self, handle: AssemblyRefHandle) -> Result<AssemblyRefRaw> {
        if handle.is_virtual() {
            return self
                .projection()?
                .assembly_ref(handle.row())
                .ok_or_else(|| Error::InvalidHandle(format!("{handle:?}")));
        }
        self.tables.table::<AssemblyRefRaw>().get(handle.row())
    }
}

macro_rules! row_accessors {
    ($($(#[$meta:meta])* $name:ident($handle:ident) -> $row:ident;)+) => {
        impl MetadataReader<'_> {
            $(
                $(#[$meta])*
                ///
                /// # Errors
                /// Returns [`Error::InvalidHandle`] if the row does not exist
                pub fn $name(
                    &self,
                    handle: crate::metadata::handles::$handle,
                ) -> Result<crate::metadata::tables::$row> {
                    self.row(handle)
                }
            )+
        }
    };
}

macro_rules! all_handles {
    ($($(#[$meta:meta])* $name:ident -> $handle:ident;)+) => {
        impl MetadataReader<'_> {
            $(
                $(#[$meta])*
                #[must_use]
                pub fn $name(&self) -> HandleRange<'_, crate::metadata::handles::$handle> {
                    self.handles()
                }
            )+
        }
    };
}

row_accessors! {
    /// The `TypeDef` row of `handle`
    type_definition(TypeDefHandle) -> TypeDefRaw;
    /// The `TypeRef` row of `handle`
    type_reference(TypeRefHandle) -> TypeRefRaw;
    /// The `TypeSpec` row of `handle`
    type_specification(TypeSpecHandle) -> TypeSpecRaw;
    /// The `Field` row of `handle`
    field_definition(FieldHandle) -> FieldRaw;
    /// The `MethodDef` row of `handle`
    method_definition(MethodDefHandle) -> MethodDefRaw;
    /// The `Param` row of `handle`
    parameter(ParamHandle) -> ParamRaw;
    /// The `InterfaceImpl` row of `handle`
    interface_implementation(InterfaceImplHandle) -> InterfaceImplRaw;
    /// The `MemberRef` row of `handle`
    member_reference(MemberRefHandle) -> MemberRefRaw;
    /// The `Constant` row of `handle`
    constant(ConstantHandle) -> ConstantRaw;
    /// The `CustomAttribute` row of `handle`
    custom_attribute(CustomAttributeHandle) -> CustomAttributeRaw;
    /// The `DeclSecurity` row of `handle`
    decl_security_attribute(DeclSecurityHandle) -> DeclSecurityRaw;
    /// The `StandAloneSig` row of `handle`
    stand_alone_signature(StandAloneSigHandle) -> StandAloneSigRaw;
    /// The `Event` row of `handle`
    event_definition(EventHandle) -> EventRaw;
    /// The `Property` row of `handle`
    property_definition(PropertyHandle) -> PropertyRaw;
    /// The `MethodSemantics` row of `handle`
    method_semantics(MethodSemanticsHandle) -> MethodSemanticsRaw;
    /// The `MethodImpl` row of `handle`
    method_implementation(MethodImplHandle) -> MethodImplRaw;
    /// The `ModuleRef` row of `handle`
    module_reference(ModuleRefHandle) -> ModuleRefRaw;
    /// The `ImplMap` row of `handle`
    impl_map(ImplMapHandle) -> ImplMapRaw;
    /// The `File` row of `handle`
    assembly_file(FileHandle) -> FileRaw;
    /// The `ExportedType` row of `handle`
    exported_type(ExportedTypeHandle) -> ExportedTypeRaw;
    /// The `ManifestResource` row of `handle`
    manifest_resource(ManifestResourceHandle) -> ManifestResourceRaw;
    /// The `GenericParam` row of `handle`
    generic_parameter(GenericParamHandle) -> GenericParamRaw;
    /// The `MethodSpec` row of `handle`
    method_specification(MethodSpecHandle) -> MethodSpecRaw;
    /// The `GenericParamConstraint` row of `handle`
    generic_parameter_constraint(GenericParamConstraintHandle) -> GenericParamConstraintRaw;
    /// The `Document` row of `handle`
    document(DocumentHandle) -> DocumentRaw;
    /// The `MethodDebugInformation` row of `handle`
    method_debug_information(MethodDebugInformationHandle) -> MethodDebugInformationRaw;
    /// The `LocalScope` row of `handle`
    local_scope(LocalScopeHandle) -> LocalScopeRaw;
    /// The `LocalVariable` row of `handle`
    local_variable(LocalVariableHandle) -> LocalVariableRaw;
    /// The `LocalConstant` row of `handle`
    local_constant(LocalConstantHandle) -> LocalConstantRaw;
    /// The `ImportScope` row of `handle`
    import_scope(ImportScopeHandle) -> ImportScopeRaw;
    /// The `CustomDebugInformation` row of `handle`
    custom_debug_information(CustomDebugInformationHandle) -> CustomDebugInformationRaw;
}

all_handles! {
    /// All `TypeDef` rows
    type_definitions -> TypeDefHandle;
    /// All `TypeRef` rows
    type_references -> TypeRefHandle;
    /// All `TypeSpec` rows
    type_specifications -> TypeSpecHandle;
    /// All `Field` rows in logical order
    field_definitions -> FieldHandle;
    /// All `MethodDef` rows in logical order
    method_definitions -> MethodDefHandle;
    /// All `Event` rows in logical order
    event_definitions -> EventHandle;
    /// All `Property` rows in logical order
    property_definitions -> PropertyHandle;
    /// All `MemberRef` rows
    member_references -> MemberRefHandle;
    /// All `CustomAttribute` rows, in physical order
    custom_attributes -> CustomAttributeHandle;
    /// All `DeclSecurity` rows, in physical order
    decl_security_attributes -> DeclSecurityHandle;
    /// All `MethodImpl` rows
    method_implementations -> MethodImplHandle;
    /// All `ModuleRef` rows
    module_references -> ModuleRefHandle;
    /// All `AssemblyRef` rows
    assembly_references -> AssemblyRefHandle;
    /// All `File` rows
    assembly_files -> FileHandle;
    /// All `ExportedType` rows
    exported_types -> ExportedTypeHandle;
    /// All `ManifestResource` rows
    manifest_resources -> ManifestResourceHandle;
    /// All `GenericParam` rows
    generic_parameters -> GenericParamHandle;
    /// All `MethodSpec` rows
    method_specifications -> MethodSpecHandle;
    /// All `Document` rows
    documents -> DocumentHandle;
    /// All `MethodDebugInformation` rows
    method_debug_information_handles -> MethodDebugInformationHandle;
    /// All `LocalScope` rows
    local_scopes -> LocalScopeHandle;
    /// All `LocalVariable` rows
    local_variables -> LocalVariableHandle;
    /// All `LocalConstant` rows
    local_constants -> LocalConstantHandle;
    /// All `ImportScope` rows
    import_scopes -> ImportScopeHandle;
    /// All `CustomDebugInformation` rows
    custom_debug_information_handles -> CustomDebugInformationHandle;
}
