//! Range and lookup queries of the [`MetadataReader`].
//!
//! Two shapes of relation exist in the table stream:
//!
//! - list columns (`TypeDef.FieldList`, `MethodDef.ParamList`, ...) start a run in the target
//!   table that ends where the run of the next owner row starts
//! - keyed tables (`CustomAttribute`, `NestedClass`, ...) name their owner in a key column and
//!   are looked up by binary search, through a sort index where one was built
//!
//! A query that finds nothing returns an empty range or `None`.

use crate::{
    metadata::{
        handles::{
            BlobHandle, ConstantHandle, CustomAttributeHandle, CustomDebugInformationHandle,
            DeclSecurityHandle, EntityHandle, EventHandle, FieldHandle, GenericParamConstraintHandle,
            GenericParamHandle, HandleRange, InterfaceImplHandle, LocalConstantHandle,
            LocalScopeHandle, LocalVariableHandle, MethodDebugInformationHandle, MethodDefHandle,
            MethodImplHandle, MethodSemanticsHandle, ParamHandle, PropertyHandle, RowHandle,
            TypeDefHandle,
        },
        reader::MetadataReader,
        tables::{
            AssemblyRaw, ClassLayoutRaw, CodedIndexType, ConstantRaw, CustomAttributeRaw,
            EventMapRaw, FieldLayoutRaw, FieldMarshalRaw, FieldRvaRaw, ImplMapRaw, ModuleRaw,
            NestedClassRaw, PropertyMapRaw, RowReadable, StateMachineMethodRaw, TableId,
        },
    },
    Error, Result,
};

/// `TypeDef.FieldList`
const TYPE_DEF_FIELD_LIST: usize = 4;
/// `TypeDef.MethodList`
const TYPE_DEF_METHOD_LIST: usize = 5;
/// `MethodDef.ParamList`
const METHOD_DEF_PARAM_LIST: usize = 5;
/// `EventMap.EventList`
const EVENT_MAP_EVENT_LIST: usize = 1;
/// `PropertyMap.PropertyList`
const PROPERTY_MAP_PROPERTY_LIST: usize = 1;
/// `LocalScope.VariableList`
const LOCAL_SCOPE_VARIABLE_LIST: usize = 2;
/// `LocalScope.ConstantList`
const LOCAL_SCOPE_CONSTANT_LIST: usize = 3;

impl MetadataReader<'_> {
    fn check_owner(&self, table: TableId, rid: u32) -> Result<()> {
        let rows = self.tables.row_count(table);
        if rid == 0 || rid > rows {
            return Err(Error::InvalidHandle(format!(
                "{table:?} row {rid} out of range 1..={rows}"
            )));
        }
        Ok(())
    }

    /// The run of `H` rows started by list column `column` of row `rid` of `owner`
    fn list<H: RowHandle>(&self, owner: TableId, rid: u32, column: usize) -> Result<HandleRange<'_, H>> {
        self.check_owner(owner, rid)?;

        let limit = self.tables.logical_count(H::TABLE) + 1;
        let start = self.tables.column(owner, rid, column)?.clamp(1, limit);
        let end = if rid < self.tables.row_count(owner) {
            self.tables.column(owner, rid + 1, column)?.min(limit)
        } else {
            limit
        };

        Ok(self.tables.logical_range(H::TABLE, start, end))
    }

    /// The rows of `H` whose key column `index` holds `value`
    fn keyed<H: RowHandle>(&self, index: usize, value: u32) -> Result<HandleRange<'_, H>> {
        if value == 0 {
            return Ok(HandleRange::empty());
        }
        let range = self.tables.table::<H::Row>().equal_range(index, value)?;
        Ok(self.tables.keyed_range(range))
    }

    /// The first row of `T` whose key column `index` holds `value`
    fn keyed_row<T: RowReadable>(&self, index: usize, value: u32) -> Result<Option<T>> {
        if value == 0 {
            return Ok(None);
        }
        let table = self.tables.table::<T>();
        match table.find(index, value)? {
            Some(rid) => table.get(rid).map(Some),
            None => Ok(None),
        }
    }

    /// The stored value of `parent` in a coded index column of `kind`, 0 for virtual parents
    fn coded_key(kind: CodedIndexType, parent: EntityHandle) -> Result<u32> {
        if parent.is_virtual() {
            return Ok(0);
        }
        kind.encode_handle(parent)
    }

    /// The logical position of physical row `rid` of `table`
    fn logical_position(&self, table: TableId, rid: u32) -> Result<Option<u32>> {
        match table.ptr_table() {
            Some(ptr) if self.tables.row_count(ptr) > 0 => {
                for position in 1..=self.tables.row_count(ptr) {
                    if self.tables.column(ptr, position, 0)? == rid {
                        return Ok(Some(position));
                    }
                }
                Ok(None)
            }
            _ => Ok((rid <= self.tables.row_count(table)).then_some(rid)),
        }
    }

    /// The last row of `owner` whose list column `column` starts at or before `position`
    fn list_owner(&self, owner: TableId, column: usize, position: u32) -> Result<Option<u32>> {
        let (mut low, mut high) = (0, self.tables.row_count(owner));
        while low < high {
            let mid = low + (high - low) / 2;
            if self.tables.column(owner, mid + 1, column)? <= position {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        Ok((low > 0).then_some(low))
    }

    /// The `Module` row, `None` for a standalone Portable PDB
    ///
    /// # Errors
    /// Returns an error if the row cannot be decoded
    pub fn module_definition(&self) -> Result<Option<ModuleRaw>> {
        let table = self.tables.table::<ModuleRaw>();
        if table.row_count() == 0 {
            return Ok(None);
        }
        table.get(1).map(Some)
    }

    /// The `Assembly` row, `None` for a module that is not an assembly manifest
    ///
    /// # Errors
    /// Returns an error if the row cannot be decoded
    pub fn assembly_definition(&self) -> Result<Option<AssemblyRaw>> {
        let table = self.tables.table::<AssemblyRaw>();
        if table.row_count() == 0 {
            return Ok(None);
        }
        table.get(1).map(Some)
    }

    /// The fields declared by `type_def`
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `type_def` does not exist
    pub fn fields_of(&self, type_def: TypeDefHandle) -> Result<HandleRange<'_, FieldHandle>> {
        self.list(TableId::TypeDef, type_def.row(), TYPE_DEF_FIELD_LIST)
    }

    /// The methods declared by `type_def`
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `type_def` does not exist
    pub fn methods_of(&self, type_def: TypeDefHandle) -> Result<HandleRange<'_, MethodDefHandle>> {
        self.list(TableId::TypeDef, type_def.row(), TYPE_DEF_METHOD_LIST)
    }

    /// The parameters of `method`, including the return value row if present
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `method` does not exist
    pub fn parameters_of(&self, method: MethodDefHandle) -> Result<HandleRange<'_, ParamHandle>> {
        self.list(TableId::MethodDef, method.row(), METHOD_DEF_PARAM_LIST)
    }

    /// The events declared by `type_def`
    ///
    /// # Errors
    /// Returns an error if the `EventMap` or `Event` tables cannot be read
    pub fn events_of(&self, type_def: TypeDefHandle) -> Result<HandleRange<'_, EventHandle>> {
        match self
            .tables
            .table::<EventMapRaw>()
            .find(0, type_def.row())?
        {
            Some(map) => self.list(TableId::EventMap, map, EVENT_MAP_EVENT_LIST),
            None => Ok(HandleRange::empty()),
        }
    }

    /// The properties declared by `type_def`
    ///
    /// # Errors
    /// Returns an error if the `PropertyMap` or `Property` tables cannot be read
    pub fn properties_of(
        &self,
        type_def: TypeDefHandle,
    ) -> Result<HandleRange<'_, PropertyHandle>> {
        match self
            .tables
            .table::<PropertyMapRaw>()
            .find(0, type_def.row())?
        {
            Some(map) => self.list(TableId::PropertyMap, map, PROPERTY_MAP_PROPERTY_LIST),
            None => Ok(HandleRange::empty()),
        }
    }

    /// The type declaring `field`, found by binary search over `TypeDef.FieldList`
    ///
    /// # Errors
    /// Returns an error if the tables cannot be read
    pub fn declaring_type_of_field(&self, field: FieldHandle) -> Result<Option<TypeDefHandle>> {
        let Some(position) = self.logical_position(TableId::Field, field.row())? else {
            return Ok(None);
        };
        self.list_owner(TableId::TypeDef, TYPE_DEF_FIELD_LIST, position)?
            .map(TypeDefHandle::from_row)
            .transpose()
    }

    /// The type declaring `method`, found by binary search over `TypeDef.MethodList`
    ///
    /// # Errors
    /// Returns an error if the tables cannot be read
    pub fn declaring_type_of_method(
        &self,
        method: MethodDefHandle,
    ) -> Result<Option<TypeDefHandle>> {
        let Some(position) = self.logical_position(TableId::MethodDef, method.row())? else {
            return Ok(None);
        };
        self.list_owner(TableId::TypeDef, TYPE_DEF_METHOD_LIST, position)?
            .map(TypeDefHandle::from_row)
            .transpose()
    }

    /// The method owning `param`, found by binary search over `MethodDef.ParamList`
    ///
    /// # Errors
    /// Returns an error if the tables cannot be read
    pub fn declaring_method_of_parameter(
        &self,
        param: ParamHandle,
    ) -> Result<Option<MethodDefHandle>> {
        let Some(position) = self.logical_position(TableId::Param, param.row())? else {
            return Ok(None);
        };
        self.list_owner(TableId::MethodDef, METHOD_DEF_PARAM_LIST, position)?
            .map(MethodDefHandle::from_row)
            .transpose()
    }

    /// The type enclosing the nested type `type_def`, `None` for a top level type
    ///
    /// # Errors
    /// Returns an error if the `NestedClass` table cannot be read
    pub fn declaring_type(&self, type_def: TypeDefHandle) -> Result<Option<TypeDefHandle>> {
        Ok(self
            .keyed_row::<NestedClassRaw>(0, type_def.row())?
            .map(|row| row.enclosing_class))
    }

    /// The types nested directly in `type_def`
    ///
    /// `NestedClass` is keyed by the nested type, so this scans the whole table.
    ///
    /// # Errors
    /// Returns an error if the `NestedClass` table cannot be read
    pub fn nested_types_of(&self, type_def: TypeDefHandle) -> Result<Vec<TypeDefHandle>> {
        let table = self.tables.table::<NestedClassRaw>();
        let mut nested = Vec::new();
        for row in &table {
            let row = row?;
            if row.enclosing_class == type_def {
                nested.push(row.nested_class);
            }
        }
        Ok(nested)
    }

    /// The interfaces implemented by `type_def`
    ///
    /// # Errors
    /// Returns an error if the `InterfaceImpl` table cannot be read
    pub fn interface_implementations_of(
        &self,
        type_def: TypeDefHandle,
    ) -> Result<HandleRange<'_, InterfaceImplHandle>> {
        self.keyed::<InterfaceImplHandle>(0, type_def.row())
    }

    /// The method implementations (overrides) of `type_def`
    ///
    /// # Errors
    /// Returns an error if the `MethodImpl` table cannot be read
    pub fn method_implementations_of(
        &self,
        type_def: TypeDefHandle,
    ) -> Result<HandleRange<'_, MethodImplHandle>> {
        self.keyed::<MethodImplHandle>(0, type_def.row())
    }

    /// The explicit layout of `type_def`
    ///
    /// # Errors
    /// Returns an error if the `ClassLayout` table cannot be read
    pub fn class_layout(&self, type_def: TypeDefHandle) -> Result<Option<ClassLayoutRaw>> {
        self.keyed_row::<ClassLayoutRaw>(2, type_def.row())
    }

    /// The explicit offset of `field`
    ///
    /// # Errors
    /// Returns an error if the `FieldLayout` table cannot be read
    pub fn field_offset(&self, field: FieldHandle) -> Result<Option<u32>> {
        Ok(self
            .keyed_row::<FieldLayoutRaw>(1, field.row())?
            .map(|row| row.field_offset))
    }

    /// The RVA of the initial data of `field`
    ///
    /// # Errors
    /// Returns an error if the `FieldRVA` table cannot be read
    pub fn field_rva(&self, field: FieldHandle) -> Result<Option<u32>> {
        Ok(self
            .keyed_row::<FieldRvaRaw>(1, field.row())?
            .map(|row| row.rva))
    }

    /// The marshalling descriptor of a `Field` or `Param`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `parent` is neither a field nor a parameter
    pub fn field_marshal(&self, parent: impl Into<EntityHandle>) -> Result<Option<BlobHandle>> {
        let key = Self::coded_key(CodedIndexType::HasFieldMarshal, parent.into())?;
        Ok(self
            .keyed_row::<FieldMarshalRaw>(0, key)?
            .map(|row| row.native_type))
    }

    /// The default value of a `Field`, `Param` or `Property`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `parent` cannot have a constant
    pub fn constant_of(&self, parent: impl Into<EntityHandle>) -> Result<Option<ConstantHandle>> {
        let key = Self::coded_key(CodedIndexType::HasConstant, parent.into())?;
        if key == 0 {
            return Ok(None);
        }
        self.tables
            .table::<ConstantRaw>()
            .find(1, key)?
            .map(ConstantHandle::from_row)
            .transpose()
    }

    /// The P/Invoke mapping of a `Field` or `MethodDef`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `member` is neither a field nor a method
    pub fn impl_map_of(&self, member: impl Into<EntityHandle>) -> Result<Option<ImplMapRaw>> {
        let key = Self::coded_key(CodedIndexType::MemberForwarded, member.into())?;
        self.keyed_row::<ImplMapRaw>(1, key)
    }

    /// The custom attributes applied to `parent`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `parent` cannot carry custom attributes
    pub fn custom_attributes_of(
        &self,
        parent: impl Into<EntityHandle>,
    ) -> Result<HandleRange<'_, CustomAttributeHandle>> {
        let key = Self::coded_key(CodedIndexType::HasCustomAttribute, parent.into())?;
        self.keyed::<CustomAttributeHandle>(0, key)
    }

    /// The security declarations of a `TypeDef`, `MethodDef` or `Assembly`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `parent` cannot carry security declarations
    pub fn decl_security_of(
        &self,
        parent: impl Into<EntityHandle>,
    ) -> Result<HandleRange<'_, DeclSecurityHandle>> {
        let key = Self::coded_key(CodedIndexType::HasDeclSecurity, parent.into())?;
        self.keyed::<DeclSecurityHandle>(1, key)
    }

    /// The generic parameters of a `TypeDef` or `MethodDef`, ordered by number
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `owner` is neither a type nor a method
    pub fn generic_parameters_of(
        &self,
        owner: impl Into<EntityHandle>,
    ) -> Result<HandleRange<'_, GenericParamHandle>> {
        let key = Self::coded_key(CodedIndexType::TypeOrMethodDef, owner.into())?;
        self.keyed::<GenericParamHandle>(2, key)
    }

    /// The constraints of `parameter`
    ///
    /// # Errors
    /// Returns an error if the `GenericParamConstraint` table cannot be read
    pub fn generic_parameter_constraints_of(
        &self,
        parameter: GenericParamHandle,
    ) -> Result<HandleRange<'_, GenericParamConstraintHandle>> {
        self.keyed::<GenericParamConstraintHandle>(0, parameter.row())
    }

    /// The accessors (getter, setter, adder, ...) of an `Event` or `Property`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `association` is neither an event nor a property
    pub fn method_semantics_of(
        &self,
        association: impl Into<EntityHandle>,
    ) -> Result<HandleRange<'_, MethodSemanticsHandle>> {
        let key = Self::coded_key(CodedIndexType::HasSemantics, association.into())?;
        self.keyed::<MethodSemanticsHandle>(2, key)
    }

    /// The local scopes of `method`
    ///
    /// # Errors
    /// Returns an error if the `LocalScope` table cannot be read
    pub fn local_scopes_of(
        &self,
        method: MethodDefHandle,
    ) -> Result<HandleRange<'_, LocalScopeHandle>> {
        self.keyed::<LocalScopeHandle>(0, method.row())
    }

    /// The local variables of `scope`
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `scope` does not exist
    pub fn local_variables_of(
        &self,
        scope: LocalScopeHandle,
    ) -> Result<HandleRange<'_, LocalVariableHandle>> {
        self.list(TableId::LocalScope, scope.row(), LOCAL_SCOPE_VARIABLE_LIST)
    }

    /// The local constants of `scope`
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] if `scope` does not exist
    pub fn local_constants_of(
        &self,
        scope: LocalScopeHandle,
    ) -> Result<HandleRange<'_, LocalConstantHandle>> {
        self.list(TableId::LocalScope, scope.row(), LOCAL_SCOPE_CONSTANT_LIST)
    }

    /// The custom debug information attached to `parent`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `parent` cannot carry custom debug information
    pub fn custom_debug_information_of(
        &self,
        parent: impl Into<EntityHandle>,
    ) -> Result<HandleRange<'_, CustomDebugInformationHandle>> {
        let key = Self::coded_key(CodedIndexType::HasCustomDebugInformation, parent.into())?;
        self.keyed::<CustomDebugInformationHandle>(0, key)
    }

    /// The `MethodDebugInformation` row of `method`, which shares its row id
    #[must_use]
    pub fn method_debug_information_of(
        &self,
        method: MethodDefHandle,
    ) -> Option<MethodDebugInformationHandle> {
        let rid = method.row();
        if rid == 0 || rid > self.tables.row_count(TableId::MethodDebugInformation) {
            return None;
        }
        MethodDebugInformationHandle::from_row(rid).ok()
    }

    /// The kickoff method of the state machine whose `MoveNext` is `move_next`
    ///
    /// # Errors
    /// Returns an error if the `StateMachineMethod` table cannot be read
    pub fn kickoff_method(&self, move_next: MethodDefHandle) -> Result<Option<MethodDefHandle>> {
        Ok(self
            .keyed_row::<StateMachineMethodRaw>(0, move_next.row())?
            .map(|row| row.kickoff_method))
    }

    /// Find a type definition by namespace and name
    ///
    /// Scans `TypeDef` comparing the encoded names, nothing is decoded or allocated.
    ///
    /// # Errors
    /// Returns an error if a row or a name cannot be read
    pub fn find_type_definition(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<TypeDefHandle>> {
        for handle in self.type_definitions() {
            let row = self.type_definition(handle)?;
            if self.string_equals(row.type_name, name, false)?
                && self.string_equals(row.type_namespace, namespace, false)?
            {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    /// The decoded rows of the custom attributes applied to `parent`
    ///
    /// # Errors
    /// Same as [`MetadataReader::custom_attributes_of`]
    pub fn custom_attribute_rows_of(
        &self,
        parent: impl Into<EntityHandle>,
    ) -> Result<Vec<CustomAttributeRaw>> {
        self.custom_attributes_of(parent)?
            .map(|handle| self.custom_attribute(handle))
            .collect()
    }
}
