//! Row types of every metadata table.
//!
//! Each `*Raw` struct is generated from its column list by `metadata_row!`, which makes the
//! list the single schema: the field order is the storage order, the column kind decides the
//! width, and [`columns`] hands the same list to the layout code.

/// Generates a `*Raw` row struct and its [`RowReadable`] implementation
///
/// ```rust, ignore
/// metadata_row! {
///     /// The `ModuleRef` table
///     ModuleRefRaw, ModuleRef {
///         /// Name of the module
///         name: StringHandle => Column::String,
///     }
/// }
/// ```
macro_rules! metadata_row {
    (
        $(#[$meta:meta])*
        $name:ident, $table:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty => $column:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            /// The 1-based row id
            pub rid: u32,
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )+
        }

        impl $name {
            /// The metadata token of this row
            #[must_use]
            pub fn token(&self) -> crate::metadata::handles::Token {
                crate::metadata::handles::Token::new(
                    ((crate::metadata::tables::TableId::$table as u32) << 24) | self.rid,
                )
            }
        }

        impl crate::metadata::tables::RowReadable for $name {
            const TABLE: crate::metadata::tables::TableId = crate::metadata::tables::TableId::$table;
            const COLUMNS: &'static [crate::metadata::tables::Column] = &[$($column),+];

            fn row_read(
                data: &[u8],
                offset: &mut usize,
                rid: u32,
                sizes: &crate::metadata::tables::TableInfoRef,
            ) -> crate::Result<Self> {
                Ok($name {
                    rid,
                    $(
                        $field: crate::metadata::tables::ColumnValue::read_column(
                            data, offset, sizes, $column,
                        )?,
                    )+
                })
            }
        }
    };
}

mod assembly;
mod debug;
mod members;
mod types;

pub use assembly::*;
pub use debug::*;
pub use members::*;
pub use types::*;

use crate::metadata::tables::{Column, RowReadable, TableId};

/// The column schema of `table`
#[must_use]
pub fn columns(table: TableId) -> &'static [Column] {
    match table {
        TableId::Module => ModuleRaw::COLUMNS,
        TableId::TypeRef => TypeRefRaw::COLUMNS,
        TableId::TypeDef => TypeDefRaw::COLUMNS,
        TableId::FieldPtr => FieldPtrRaw::COLUMNS,
        TableId::Field => FieldRaw::COLUMNS,
        TableId::MethodPtr => MethodPtrRaw::COLUMNS,
        TableId::MethodDef => MethodDefRaw::COLUMNS,
        TableId::ParamPtr => ParamPtrRaw::COLUMNS,
        TableId::Param => ParamRaw::COLUMNS,
        TableId::InterfaceImpl => InterfaceImplRaw::COLUMNS,
        TableId::MemberRef => MemberRefRaw::COLUMNS,
        TableId::Constant => ConstantRaw::COLUMNS,
        TableId::CustomAttribute => CustomAttributeRaw::COLUMNS,
        TableId::FieldMarshal => FieldMarshalRaw::COLUMNS,
        TableId::DeclSecurity => DeclSecurityRaw::COLUMNS,
        TableId::ClassLayout => ClassLayoutRaw::COLUMNS,
        TableId::FieldLayout => FieldLayoutRaw::COLUMNS,
        TableId::StandAloneSig => StandAloneSigRaw::COLUMNS,
        TableId::EventMap => EventMapRaw::COLUMNS,
        TableId::EventPtr => EventPtrRaw::COLUMNS,
        TableId::Event => EventRaw::COLUMNS,
        TableId::PropertyMap => PropertyMapRaw::COLUMNS,
        TableId::PropertyPtr => PropertyPtrRaw::COLUMNS,
        TableId::Property => PropertyRaw::COLUMNS,
        TableId::MethodSemantics => MethodSemanticsRaw::COLUMNS,
        TableId::MethodImpl => MethodImplRaw::COLUMNS,
        TableId::ModuleRef => ModuleRefRaw::COLUMNS,
        TableId::TypeSpec => TypeSpecRaw::COLUMNS,
        TableId::ImplMap => ImplMapRaw::COLUMNS,
        TableId::FieldRva => FieldRvaRaw::COLUMNS,
        TableId::EncLog => EncLogRaw::COLUMNS,
        TableId::EncMap => EncMapRaw::COLUMNS,
        TableId::Assembly => AssemblyRaw::COLUMNS,
        TableId::AssemblyProcessor => AssemblyProcessorRaw::COLUMNS,
        TableId::AssemblyOs => AssemblyOsRaw::COLUMNS,
        TableId::AssemblyRef => AssemblyRefRaw::COLUMNS,
        TableId::AssemblyRefProcessor => AssemblyRefProcessorRaw::COLUMNS,
        TableId::AssemblyRefOs => AssemblyRefOsRaw::COLUMNS,
        TableId::File => FileRaw::COLUMNS,
        TableId::ExportedType => ExportedTypeRaw::COLUMNS,
        TableId::ManifestResource => ManifestResourceRaw::COLUMNS,
        TableId::NestedClass => NestedClassRaw::COLUMNS,
        TableId::GenericParam => GenericParamRaw::COLUMNS,
        TableId::MethodSpec => MethodSpecRaw::COLUMNS,
        TableId::GenericParamConstraint => GenericParamConstraintRaw::COLUMNS,
        TableId::Document => DocumentRaw::COLUMNS,
        TableId::MethodDebugInformation => MethodDebugInformationRaw::COLUMNS,
        TableId::LocalScope => LocalScopeRaw::COLUMNS,
        TableId::LocalVariable => LocalVariableRaw::COLUMNS,
        TableId::LocalConstant => LocalConstantRaw::COLUMNS,
        TableId::ImportScope => ImportScopeRaw::COLUMNS,
        TableId::StateMachineMethod => StateMachineMethodRaw::COLUMNS,
        TableId::CustomDebugInformation => CustomDebugInformationRaw::COLUMNS,
    }
}

/// The column a table is required to be sorted by, `None` for unkeyed tables
#[must_use]
pub fn key_column(table: TableId) -> Option<usize> {
    match table {
        TableId::InterfaceImpl
        | TableId::CustomAttribute
        | TableId::FieldMarshal
        | TableId::EventMap
        | TableId::PropertyMap
        | TableId::MethodImpl
        | TableId::NestedClass
        | TableId::GenericParamConstraint
        | TableId::LocalScope
        | TableId::StateMachineMethod
        | TableId::CustomDebugInformation => Some(0),
        TableId::Constant
        | TableId::DeclSecurity
        | TableId::FieldLayout
        | TableId::ImplMap
        | TableId::FieldRva => Some(1),
        TableId::ClassLayout | TableId::MethodSemantics | TableId::GenericParam => Some(2),
        _ => None,
    }
}
