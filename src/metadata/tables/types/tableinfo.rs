use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::{
    streams::HeapSizes,
    tables::{columns, Column, CodedIndexType, TableId},
};

/// Highest table number plus one, the size of every per-table array
pub const TABLE_SLOTS: usize = 64;

/// Row counts and derived reference widths of one table stream
///
/// Every column whose width is not fixed (heap indexes, simple table indexes, list indexes and
/// coded indexes) is sized once here, and every row reader asks this structure instead of
/// re-deriving the width.
///
/// The rules:
/// - heap indexes are 4 bytes if the matching [`HeapSizes`] flag is set
/// - a simple table index is 4 bytes if the target has 65536 rows or more
/// - a list index is 4 bytes if the target or its `*Ptr` table has 65536 rows or more
/// - a coded index is 2 bytes only if every participating table has fewer rows than
///   [`CodedIndexType::large_row_threshold`]
///
/// A minimal delta (`#JTD`) forces every one of these widths to 4 bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct TableInfo {
    rows: [u32; TABLE_SLOTS],
    heap_sizes: HeapSizes,
    minimal_delta: bool,
    table_index: [u8; TABLE_SLOTS],
    coded_index: [u8; CodedIndexType::COUNT],
}

/// Cheap-copy reference to a `TableInfo` structure
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Derive all reference widths
    ///
    /// ## Arguments
    /// * `rows`          - row count per table number, including the external type system
    ///   row counts of a `#Pdb` stream
    /// * `heap_sizes`    - the heap size flags of the table stream header
    /// * `minimal_delta` - `true` if the metadata contains a `#JTD` stream
    #[must_use]
    pub fn new(rows: [u32; TABLE_SLOTS], heap_sizes: HeapSizes, minimal_delta: bool) -> Self {
        let mut info = TableInfo {
            rows,
            heap_sizes,
            minimal_delta,
            table_index: [2; TABLE_SLOTS],
            coded_index: [2; CodedIndexType::COUNT],
        };

        for table in TableId::iter() {
            let is_large = minimal_delta || info.rows(table) > u32::from(u16::MAX);
            info.table_index[table as usize] = if is_large { 4 } else { 2 };
        }

        for coded in CodedIndexType::iter() {
            let threshold = coded.large_row_threshold();
            let is_large = minimal_delta
                || coded
                    .tables()
                    .iter()
                    .flatten()
                    .any(|table| info.rows(*table) >= threshold);
            info.coded_index[coded as usize] = if is_large { 4 } else { 2 };
        }

        info
    }

    #[cfg(test)]
    /// Special constructor for unit-tests
    ///
    /// ## Arguments
    /// * 'valid_tables'    - A slice of touples, which provides (table_id, row_count) of the valid tables
    /// * 'large_str'       - Specify if the #String heap indexes are 4 or 2 bytes
    /// * 'large_blob'      - Specify if the #Blob heap indexes are 4 or 2 bytes
    /// * 'large_guid'      - Specify if the #GUID heap indexes are 4 or 2 bytes
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut rows = [0; TABLE_SLOTS];
        for (table, count) in valid_tables {
            rows[*table as usize] = *count;
        }

        let mut heap_sizes = HeapSizes::empty();
        heap_sizes.set(HeapSizes::STRING_HEAP_LARGE, large_str);
        heap_sizes.set(HeapSizes::BLOB_HEAP_LARGE, large_blob);
        heap_sizes.set(HeapSizes::GUID_HEAP_LARGE, large_guid);

        TableInfo::new(rows, heap_sizes, false)
    }

    /// Row count of `table`, 0 if absent
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize]
    }

    /// The heap size flags these widths were derived from
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        self.heap_sizes
    }

    /// Returns `true` if every reference width is forced to 4 bytes
    #[must_use]
    pub fn is_minimal_delta(&self) -> bool {
        self.minimal_delta
    }

    fn heap_bytes(&self, flag: HeapSizes) -> u8 {
        if self.minimal_delta || self.heap_sizes.contains(flag) {
            4
        } else {
            2
        }
    }

    /// Width of a `#Strings` index
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        self.heap_bytes(HeapSizes::STRING_HEAP_LARGE)
    }

    /// Width of a `#GUID` index
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        self.heap_bytes(HeapSizes::GUID_HEAP_LARGE)
    }

    /// Width of a `#Blob` index
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        self.heap_bytes(HeapSizes::BLOB_HEAP_LARGE)
    }

    /// Width of a simple index into `table`
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        self.table_index[table as usize]
    }

    /// Width of a list index into `table`, which may go through its `*Ptr` table
    #[must_use]
    pub fn list_index_bytes(&self, table: TableId) -> u8 {
        match table.ptr_table() {
            Some(ptr) => self
                .table_index_bytes(table)
                .max(self.table_index_bytes(ptr)),
            None => self.table_index_bytes(table),
        }
    }

    /// Width of a coded index of kind `coded`
    #[must_use]
    pub fn coded_index_bytes(&self, coded: CodedIndexType) -> u8 {
        self.coded_index[coded as usize]
    }

    /// Width of one column
    #[must_use]
    pub fn column_bytes(&self, column: Column) -> u8 {
        match column {
            Column::U8 | Column::U16 => 2,
            Column::U32 => 4,
            Column::String => self.str_bytes(),
            Column::Guid => self.guid_bytes(),
            Column::Blob => self.blob_bytes(),
            Column::Table(table) => self.table_index_bytes(table),
            Column::List(table) => self.list_index_bytes(table),
            Column::Coded(coded) => self.coded_index_bytes(coded),
        }
    }

    /// Size of one row of `table` in bytes
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        columns(table)
            .iter()
            .map(|column| u32::from(self.column_bytes(*column)))
            .sum()
    }
}
