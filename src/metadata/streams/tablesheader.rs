use bitflags::bitflags;
use log::{debug, trace, warn};
use strum::IntoEnumIterator;

use crate::{
    codec::io::{read_le, read_le_at},
    metadata::{
        handles::{HandleRange, RowHandle, RowMap, ROW_ID_MASK},
        streams::{PdbStream, StreamKind},
        tables::{
            columns, key_column, read_column_raw, MetadataTable, RowReadable, TableId, TableInfo,
            TableInfoRef, TableLayout, PTR_TABLES_MASK, TABLE_SLOTS, VALID_TABLES_MASK,
        },
    },
    Result,
};

bitflags! {
    /// The `HeapSizes` byte of the table stream header
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct HeapSizes: u8 {
        /// `#Strings` indexes are 4 bytes
        const STRING_HEAP_LARGE = 0x01;
        /// `#GUID` indexes are 4 bytes
        const GUID_HEAP_LARGE = 0x02;
        /// `#Blob` indexes are 4 bytes
        const BLOB_HEAP_LARGE = 0x04;
        /// The stream is an edit-and-continue delta
        const ENC_DELTAS = 0x20;
        /// A 4 byte value follows the row counts
        const EXTRA_DATA = 0x40;
        /// The stream may contain rows marked as deleted
        const DELETED_MARKS = 0x80;
    }
}

/// Size of the fixed part of the header, before the row counts
const FIXED_HEADER_SIZE: usize = 24;

/// The `TablesHeader` structure represents the header of the '#~' (or '#-') stream, which
/// contains all the metadata tables.
///
/// Construction validates the header and lays out every present table, so a constructed
/// `TablesHeader` is fully usable: every table lies within the stream and every row can be
/// addressed. Tables are views, rows are decoded when they are accessed.
///
/// ### Basic Table Access
/// ```rust,no_run
/// use cilmeta::metadata::{streams::TablesHeader, tables::{TableId, TypeDefRaw}};
///
/// # fn example(tables_header: &TablesHeader) -> cilmeta::Result<()> {
/// if tables_header.has_table(TableId::TypeDef) {
///     let typedef_table = tables_header.table::<TypeDefRaw>();
///     println!("TypeDef table has {} rows", typedef_table.row_count());
///
///     let first_type = typedef_table.get(1)?;
///     println!("First type: flags={:#x}, name={:?}", first_type.flags, first_type.type_name);
/// }
/// # Ok(())
/// # }
/// ```
///
/// ### Parallel Processing with Rayon
/// ```rust,no_run
/// use cilmeta::metadata::{streams::TablesHeader, tables::FieldRaw};
/// use rayon::prelude::*;
///
/// # fn example(tables_header: &TablesHeader) -> cilmeta::Result<()> {
/// let static_fields = tables_header
///     .table::<FieldRaw>()
///     .par_iter()
///     .filter(|field| matches!(field, Ok(field) if field.flags & 0x0010 != 0))
///     .count();
/// println!("Found {} static fields", static_fields);
/// # Ok(())
/// # }
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.6 && II.22
#[derive(Debug)]
pub struct TablesHeader<'a> {
    /// Major version of table schemata, shall be 2
    pub major_version: u8,
    /// Minor version of table schemata, shall be 0
    pub minor_version: u8,
    /// Width flags of the heap indexes
    pub heap_sizes: HeapSizes,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of tables stored in key order
    pub sorted: u64,
    /// The value following the row counts if [`HeapSizes::EXTRA_DATA`] is set
    pub extra_data: Option<u32>,
    /// Row counts and reference widths
    pub info: TableInfoRef,
    kind: StreamKind,
    row_counts: [u32; TABLE_SLOTS],
    tables: [&'a [u8]; TABLE_SLOTS],
    sort_indexes: Vec<Option<Vec<u32>>>,
}

impl<'a> TablesHeader<'a> {
    /// Create a `TablesHeader` for a standalone `#~` stream
    ///
    /// # Arguments
    /// * 'data' - The content of the stream
    ///
    /// # Errors
    /// See [`TablesHeader::read`]
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        TablesHeader::read(data, StreamKind::Tables, false, None)
    }

    /// Parse and validate a table stream
    ///
    /// # Arguments
    /// * 'data'            - The content of the stream
    /// * 'kind'            - [`StreamKind::Tables`] or [`StreamKind::UncompressedTables`]
    /// * 'minimal_delta'   - A `#JTD` stream is present, every reference is 4 bytes
    /// * 'pdb'             - The `#Pdb` stream, its external row counts size the references into
    ///   the type system tables
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for a truncated header, and
    /// [`crate::Error::Malformed`] for unknown tables, `*Ptr` tables in a `#~` stream, row
    /// counts beyond 24 bits, or tables that do not fit the stream
    pub fn read(
        data: &'a [u8],
        kind: StreamKind,
        minimal_delta: bool,
        pdb: Option<&PdbStream>,
    ) -> Result<TablesHeader<'a>> {
        if data.len() < FIXED_HEADER_SIZE {
            return Err(out_of_bounds_error!());
        }

        let major_version = read_le::<u8>(&data[4..])?;
        let minor_version = read_le::<u8>(&data[5..])?;
        let heap_sizes = HeapSizes::from_bits_retain(read_le::<u8>(&data[6..])?);
        let valid = read_le::<u64>(&data[8..])?;
        let sorted = read_le::<u64>(&data[16..])?;

        if valid & !VALID_TABLES_MASK != 0 {
            return Err(malformed_error!(
                "Unknown tables present - {:#018x}",
                valid & !VALID_TABLES_MASK
            ));
        }

        if kind == StreamKind::Tables && valid & PTR_TABLES_MASK != 0 {
            return Err(malformed_error!(
                "Pointer tables are only allowed in an uncompressed #- stream"
            ));
        }

        let mut offset = FIXED_HEADER_SIZE;
        let mut row_counts = [0u32; TABLE_SLOTS];
        for table in TableId::iter().filter(|table| valid & table.mask() != 0) {
            let rows = read_le_at::<u32>(data, &mut offset)?;
            if rows > ROW_ID_MASK {
                return Err(malformed_error!("{:?} has too many rows - {}", table, rows));
            }
            row_counts[table as usize] = rows;
        }

        let extra_data = if heap_sizes.contains(HeapSizes::EXTRA_DATA) {
            Some(read_le_at::<u32>(data, &mut offset)?)
        } else {
            None
        };

        let mut width_rows = row_counts;
        if let Some(pdb) = pdb {
            for table in TableId::iter() {
                if pdb.referenced_type_system_tables & table.mask() != 0 {
                    width_rows[table as usize] = pdb.type_system_table_rows[table as usize];
                }
            }
        }

        let info = TableInfoRef::new(TableInfo::new(width_rows, heap_sizes, minimal_delta));
        debug!(
            "Table stream {}.{}, {} tables, heap sizes {:?}, minimal delta {}",
            major_version,
            minor_version,
            valid.count_ones(),
            heap_sizes,
            minimal_delta
        );

        let mut tables: [&'a [u8]; TABLE_SLOTS] = [&[]; TABLE_SLOTS];
        for table in TableId::iter() {
            let rows = row_counts[table as usize];
            if rows == 0 {
                continue;
            }

            let size = rows as usize * info.row_size(table) as usize;
            let Some(rows_data) = offset
                .checked_add(size)
                .and_then(|end| data.get(offset..end))
            else {
                return Err(malformed_error!(
                    "{:?} ({} rows at {:#x}) exceeds the table stream of {:#x} bytes",
                    table,
                    rows,
                    offset,
                    data.len()
                ));
            };

            trace!(
                "{:?}: {} rows of {} bytes at {:#x}",
                table,
                rows,
                info.row_size(table),
                offset
            );
            tables[table as usize] = rows_data;
            offset += size;
        }

        let mut header = TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            extra_data,
            info,
            kind,
            row_counts,
            tables,
            sort_indexes: vec![None; TABLE_SLOTS],
        };
        header.build_sort_indexes()?;

        Ok(header)
    }

    /// Build a key order for every keyed table that is neither declared nor actually sorted
    fn build_sort_indexes(&mut self) -> Result<()> {
        for table in TableId::iter() {
            let rows = self.row_counts[table as usize];
            let Some(key) = key_column(table) else {
                continue;
            };
            if rows < 2 || self.sorted & table.mask() != 0 {
                continue;
            }

            let layout = TableLayout::new(columns(table), &self.info);
            let (Some(column_offset), Some(column)) =
                (layout.column_offset(key), columns(table).get(key))
            else {
                continue;
            };

            let data = self.tables[table as usize];
            let row_size = layout.row_size() as usize;
            let mut keys = Vec::with_capacity(rows as usize);
            for rid in 1..=rows {
                let mut offset = (rid as usize - 1) * row_size + column_offset as usize;
                keys.push((read_column_raw(data, &mut offset, &self.info, *column)?, rid));
            }

            if keys.windows(2).all(|pair| pair[0].0 <= pair[1].0) {
                continue;
            }

            warn!(
                "{:?} is not sorted by its key column, building a sort index over {} rows",
                table, rows
            );
            keys.sort_by_key(|(key, _)| *key);
            self.sort_indexes[table as usize] = Some(keys.into_iter().map(|(_, rid)| rid).collect());
        }

        Ok(())
    }

    /// The stream kind this header was read from
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Get the number of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Check if a specific table is present
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.valid & table_id.mask() != 0
    }

    /// Check if the header declares `table_id` as stored in key order
    #[must_use]
    pub fn is_declared_sorted(&self, table_id: TableId) -> bool {
        self.sorted & table_id.mask() != 0
    }

    /// Get an iterator over all present tables
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|&table_id| self.has_table(table_id))
    }

    /// Number of rows of `table_id` in this stream, 0 if absent
    ///
    /// External row counts of a `#Pdb` stream are not included.
    #[must_use]
    pub fn row_count(&self, table_id: TableId) -> u32 {
        self.row_counts[table_id as usize]
    }

    /// The raw rows of `table_id`
    #[must_use]
    pub fn table_data(&self, table_id: TableId) -> &'a [u8] {
        self.tables[table_id as usize]
    }

    /// The key order built for `table_id`, `None` if the physical order is key order
    #[must_use]
    pub fn sort_index(&self, table_id: TableId) -> Option<&[u32]> {
        self.sort_indexes[table_id as usize].as_deref()
    }

    /// Get a specific table
    ///
    /// An absent table yields an empty view. Keyed lookups on the returned table go through
    /// the sort index if one was built.
    ///
    /// ```rust,no_run
    /// use cilmeta::metadata::{streams::TablesHeader, tables::TypeDefRaw};
    ///
    /// # fn example(tables: &TablesHeader) -> cilmeta::Result<()> {
    /// for type_def in tables.table::<TypeDefRaw>().iter().take(5) {
    ///     let type_def = type_def?;
    ///     println!("Type: flags={:#x}, name={:?}", type_def.flags, type_def.type_name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn table<T: RowReadable>(&self) -> MetadataTable<'_, T> {
        let slot = T::TABLE as usize;
        // sizes were validated while reading the header
        MetadataTable::new(self.tables[slot], self.row_counts[slot], self.info.clone())
            .map_or_else(
                |_| MetadataTable::empty(self.info.clone()),
                |table| table.with_order(self.sort_indexes[slot].as_deref()),
            )
    }

    /// Number of rows of `table_id` in logical order, the `*Ptr` table decides if present
    #[must_use]
    pub fn logical_count(&self, table_id: TableId) -> u32 {
        match table_id.ptr_table() {
            Some(ptr) if self.row_count(ptr) > 0 => self.row_count(ptr),
            _ => self.row_count(table_id),
        }
    }

    /// Raw value of column `index` of row `rid` of any table
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] for a row outside the table and
    /// [`crate::Error::InvalidArgument`] for a column past the schema
    pub fn column(&self, table_id: TableId, rid: u32, index: usize) -> Result<u32> {
        let rows = self.row_count(table_id);
        if rid == 0 || rid > rows {
            return Err(crate::Error::InvalidHandle(format!(
                "{:?} row {} out of range 1..={}",
                table_id, rid, rows
            )));
        }

        let layout = TableLayout::new(columns(table_id), &self.info);
        let (Some(column_offset), Some(column)) =
            (layout.column_offset(index), columns(table_id).get(index))
        else {
            return Err(invalid_argument_error!("{:?} has no column {}", table_id, index));
        };

        let mut offset = (rid as usize - 1) * layout.row_size() as usize + column_offset as usize;
        read_column_raw(self.tables[table_id as usize], &mut offset, &self.info, *column)
    }

    /// All rows of `H::TABLE` in logical order
    #[must_use]
    pub fn handles<H: RowHandle>(&self) -> HandleRange<'_, H> {
        self.logical_range(H::TABLE, 1, self.logical_count(H::TABLE) + 1)
    }

    /// Logical positions `start..end` of `target`, resolved through its `*Ptr` table if present
    pub(crate) fn logical_range<H: RowHandle>(
        &self,
        target: TableId,
        start: u32,
        end: u32,
    ) -> HandleRange<'_, H> {
        let map = match target.ptr_table() {
            Some(ptr) if self.row_count(ptr) > 0 => RowMap::Ptr {
                data: self.table_data(ptr),
                width: usize::from(self.info.table_index_bytes(target)),
            },
            _ => RowMap::Identity,
        };
        HandleRange::new(start..end.max(start), map)
    }

    /// Positions `range` of a keyed table, resolved through its sort index if present
    pub(crate) fn keyed_range<H: RowHandle>(&self, range: std::ops::Range<u32>) -> HandleRange<'_, H> {
        let map = match self.sort_index(H::TABLE) {
            Some(order) => RowMap::Index(order),
            None => RowMap::Identity,
        };
        HandleRange::new(range, map)
    }
}
