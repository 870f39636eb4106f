use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{handles::EntityHandle, tables::TableId},
    Result,
};

/// The coded index kinds of ECMA-335 II.24.2.6.
///
/// A coded index column references a row in one of several tables. The low bits of the stored
/// value select the table (the tag), the remaining bits hold the row id. The number of tag bits
/// is the number of bits needed to number every slot of [`CodedIndexType::tables`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any table that may carry a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// `MethodDef` or `MemberRef`, tags 0, 1 and 4 are unused
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
    /// Any table that may carry custom debug information (Portable PDB)
    HasCustomDebugInformation,
}

const HAS_CUSTOM_ATTRIBUTE: &[Option<TableId>] = &[
    Some(TableId::MethodDef),
    Some(TableId::Field),
    Some(TableId::TypeRef),
    Some(TableId::TypeDef),
    Some(TableId::Param),
    Some(TableId::InterfaceImpl),
    Some(TableId::MemberRef),
    Some(TableId::Module),
    Some(TableId::DeclSecurity),
    Some(TableId::Property),
    Some(TableId::Event),
    Some(TableId::StandAloneSig),
    Some(TableId::ModuleRef),
    Some(TableId::TypeSpec),
    Some(TableId::Assembly),
    Some(TableId::AssemblyRef),
    Some(TableId::File),
    Some(TableId::ExportedType),
    Some(TableId::ManifestResource),
    Some(TableId::GenericParam),
    Some(TableId::GenericParamConstraint),
    Some(TableId::MethodSpec),
];

const HAS_CUSTOM_DEBUG_INFORMATION: &[Option<TableId>] = &[
    Some(TableId::MethodDef),
    Some(TableId::Field),
    Some(TableId::TypeRef),
    Some(TableId::TypeDef),
    Some(TableId::Param),
    Some(TableId::InterfaceImpl),
    Some(TableId::MemberRef),
    Some(TableId::Module),
    Some(TableId::DeclSecurity),
    Some(TableId::Property),
    Some(TableId::Event),
    Some(TableId::StandAloneSig),
    Some(TableId::ModuleRef),
    Some(TableId::TypeSpec),
    Some(TableId::Assembly),
    Some(TableId::AssemblyRef),
    Some(TableId::File),
    Some(TableId::ExportedType),
    Some(TableId::ManifestResource),
    Some(TableId::GenericParam),
    Some(TableId::GenericParamConstraint),
    Some(TableId::MethodSpec),
    Some(TableId::Document),
    Some(TableId::LocalScope),
    Some(TableId::LocalVariable),
    Some(TableId::LocalConstant),
    Some(TableId::ImportScope),
];

impl CodedIndexType {
    /// The tables addressed by this coded index, indexed by tag
    ///
    /// `None` marks a tag value that is reserved and never valid.
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => HAS_CUSTOM_ATTRIBUTE,
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => {
                &[Some(TableId::MethodDef), Some(TableId::MemberRef)]
            }
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
            CodedIndexType::HasCustomDebugInformation => HAS_CUSTOM_DEBUG_INFORMATION,
        }
    }

    /// Number of low bits holding the tag
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        let slots = self.tables().len();
        usize::BITS - (slots - 1).leading_zeros()
    }

    /// Row count from which a participating table forces 4 byte references
    ///
    /// A 2 byte coded index keeps `16 - tag_bits` bits for the row id, so every participating
    /// table must have fewer than `2^(16 - tag_bits)` rows.
    #[must_use]
    pub fn large_row_threshold(&self) -> u32 {
        1 << (16 - self.tag_bits())
    }

    /// Split a stored value into the referenced table and row id
    ///
    /// A zero row id decodes to the nil handle regardless of the tag.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the tag is reserved or the row id does not fit a
    /// handle
    pub fn decode(&self, value: u32) -> Result<EntityHandle> {
        let bits = self.tag_bits();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let row = value >> bits;

        if row == 0 {
            return Ok(EntityHandle::NIL);
        }

        match self.tables().get(tag).copied().flatten() {
            Some(table) => EntityHandle::new(table, row)
                .map_err(|_| malformed_error!("{:?} row {:#x} out of range", self, row)),
            None => Err(malformed_error!("Invalid tag {} for {:?}", tag, self)),
        }
    }

    /// Combine a table and row id into the stored representation
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `table` does not participate in this coded
    /// index, or if `row` does not leave room for the tag bits
    pub fn encode(&self, table: TableId, row: u32) -> Result<u32> {
        let Some(tag) = self
            .tables()
            .iter()
            .position(|candidate| *candidate == Some(table))
        else {
            return Err(invalid_argument_error!("{:?} is not part of {:?}", table, self));
        };

        let bits = self.tag_bits();
        if row.leading_zeros() < bits {
            return Err(invalid_argument_error!(
                "row {:#x} does not fit into {:?}",
                row,
                self
            ));
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok((row << bits) | tag as u32)
    }

    /// Encode an entity handle, nil handles encode to zero
    ///
    /// # Errors
    /// Same as [`CodedIndexType::encode`]
    pub fn encode_handle(&self, handle: EntityHandle) -> Result<u32> {
        if handle.is_nil() {
            return Ok(0);
        }
        self.encode(handle.table(), handle.row())
    }
}
