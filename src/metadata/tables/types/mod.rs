//! Table schema and row access.
//!
//! Every table is described by a list of [`Column`]s. Together with the row counts and heap
//! widths in [`TableInfo`] the columns give a [`TableLayout`], and [`MetadataTable`] reads
//! rows through that layout, one at a time or spread over the rayon pool.
//!
//! ```text
//! TableInfo + &[Column] -> TableLayout -> MetadataTable<T: RowReadable>
//! ```
//!
//! ## Walking a table
//!
//! ```rust,no_run
//! use cilmeta::metadata::tables::TypeDefRaw;
//! use rayon::prelude::*;
//!
//! # fn example(reader: &cilmeta::MetadataReader) -> cilmeta::Result<()> {
//! let table = reader.tables().table::<TypeDefRaw>();
//!
//! // one row after the other
//! for row in &table {
//!     println!("TypeDef {}", row?.rid);
//! }
//!
//! // or on the thread pool, stopping at the first damaged row
//! table.par_iter().try_for_each(|row| {
//!     let _ = row?.flags;
//!     Ok::<(), cilmeta::Error>(())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! Table numbers and columns follow ECMA-335 II.22 and the Portable PDB format.

mod codedindex;
mod column;
mod tableid;
mod tableinfo;

use std::{marker::PhantomData, ops::Range};

use rayon::iter::{plumbing, IndexedParallelIterator, ParallelIterator};

use crate::{Error, Result};

pub use codedindex::{CodedIndexType, CodedIndexTypeIter};
pub use column::{read_column_raw, Column, ColumnValue};
pub use tableid::{
    TableId, TableIdIter, DEBUG_TABLES_MASK, PTR_TABLES_MASK, TYPE_SYSTEM_TABLES_MASK,
    VALID_TABLES_MASK,
};
pub use tableinfo::{TableInfo, TableInfoRef, TABLE_SLOTS};

/// Largest number of columns of any table (`Assembly`, `AssemblyRef`)
pub const MAX_COLUMNS: usize = 9;

/// A row type decoded from one table
///
/// Implemented by every `*Raw` row. `COLUMNS` fixes both the byte layout and the order in
/// which `row_read` consumes the row.
pub trait RowReadable: Sized + Send + Sync {
    /// The table holding rows of this type
    const TABLE: TableId;

    /// The columns of one row, in storage order
    const COLUMNS: &'static [Column];

    /// Bytes per row once heap and table index widths in `sizes` are known
    fn row_size(sizes: &TableInfoRef) -> u32 {
        Self::COLUMNS
            .iter()
            .map(|column| u32::from(sizes.column_bytes(*column)))
            .sum()
    }

    /// Decode the row starting at `*offset` and move `offset` behind it
    ///
    /// `rid` is the 1-based row number stored in the result.
    ///
    /// ## Errors
    ///
    /// Fails when `data` ends inside the row or a coded index uses a reserved tag
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// Column offsets and stride of one table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout {
    columns: &'static [Column],
    offsets: [u8; MAX_COLUMNS],
    widths: [u8; MAX_COLUMNS],
    row_size: u32,
}

impl TableLayout {
    /// Resolve the columns of `columns` against `sizes`
    #[must_use]
    pub fn new(columns: &'static [Column], sizes: &TableInfo) -> Self {
        let mut offsets = [0; MAX_COLUMNS];
        let mut widths = [0; MAX_COLUMNS];
        let mut next = 0u8;

        for (index, column) in columns.iter().take(MAX_COLUMNS).enumerate() {
            let width = sizes.column_bytes(*column);
            offsets[index] = next;
            widths[index] = width;
            next += width;
        }

        TableLayout {
            columns,
            offsets,
            widths,
            row_size: u32::from(next),
        }
    }

    /// Size of one row
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// The columns of this table
    #[must_use]
    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Byte offset of column `index` inside a row
    #[must_use]
    pub fn column_offset(&self, index: usize) -> Option<u32> {
        if index >= self.columns.len() {
            return None;
        }
        Some(u32::from(self.offsets[index]))
    }

    /// Width of column `index`
    #[must_use]
    pub fn column_width(&self, index: usize) -> Option<u8> {
        if index >= self.columns.len() {
            return None;
        }
        Some(self.widths[index])
    }
}

/// The rows of one table, decoded as `T` on access
///
/// Nothing is cached. A keyed table that was not stored in key order carries the sort index
/// built at load time, and key lookups go through it.
pub struct MetadataTable<'a, T> {
    /// exactly `row_count * row_size` bytes
    data: &'a [u8],
    row_count: u32,
    layout: TableLayout,
    sizes: TableInfoRef,
    /// Row ids in key order, if the physical order is not key order
    order: Option<&'a [u32]>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for MetadataTable<'_, T> {
    fn clone(&self) -> Self {
        MetadataTable {
            data: self.data,
            row_count: self.row_count,
            layout: self.layout,
            sizes: self.sizes.clone(),
            order: self.order,
            _phantom: PhantomData,
        }
    }
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// View `row_count` rows at the start of `data`
    ///
    /// ## Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `data` is too small for `row_count` rows
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let layout = TableLayout::new(T::COLUMNS, &sizes);
        let size = u64::from(row_count) * u64::from(layout.row_size());
        let Ok(size) = usize::try_from(size) else {
            return Err(out_of_bounds_error!());
        };

        if size > data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(MetadataTable {
            data: &data[..size],
            row_count,
            layout,
            sizes,
            order: None,
            _phantom: PhantomData,
        })
    }

    /// An empty table, used for tables absent from the stream
    #[must_use]
    pub fn empty(sizes: TableInfoRef) -> Self {
        MetadataTable {
            data: &[],
            row_count: 0,
            layout: TableLayout::new(T::COLUMNS, &sizes),
            sizes,
            order: None,
            _phantom: PhantomData,
        }
    }

    pub(crate) fn with_order(mut self, order: Option<&'a [u32]>) -> Self {
        self.order = order;
        self
    }

    /// `row_count * row_size`
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.layout.row_size())
    }

    /// Bytes per row
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.layout.row_size()
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Column offsets and row size of this table
    #[must_use]
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// The raw rows
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Row ids in key order, `None` if the physical order is key order
    #[must_use]
    pub fn order(&self) -> Option<&'a [u32]> {
        self.order
    }

    fn check_rid(&self, rid: u32) -> Result<()> {
        if rid == 0 || rid > self.row_count {
            return Err(Error::InvalidHandle(format!(
                "{:?} row {} out of range 1..={}",
                T::TABLE,
                rid,
                self.row_count
            )));
        }
        Ok(())
    }

    /// Decode row `rid`, counting from 1
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidHandle`] for row 0 or a row past the end of the table, and
    /// any error of [`RowReadable::row_read`]
    pub fn get(&self, rid: u32) -> Result<T> {
        self.check_rid(rid)?;
        let mut offset = (rid as usize - 1) * self.layout.row_size() as usize;
        T::row_read(self.data, &mut offset, rid, &self.sizes)
    }

    /// Raw value of column `index` of row `rid`
    ///
    /// The value is read at `(rid - 1) * row_size + column_offset` without decoding the rest
    /// of the row.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidHandle`] for an invalid row and [`Error::InvalidArgument`] for
    /// a column index past the schema
    pub fn column(&self, rid: u32, index: usize) -> Result<u32> {
        self.check_rid(rid)?;
        let (Some(column_offset), Some(column)) =
            (self.layout.column_offset(index), T::COLUMNS.get(index))
        else {
            return Err(invalid_argument_error!(
                "{:?} has no column {}",
                T::TABLE,
                index
            ));
        };

        let mut offset =
            (rid as usize - 1) * self.layout.row_size() as usize + column_offset as usize;
        read_column_raw(self.data, &mut offset, &self.sizes, *column)
    }

    fn row_at(&self, position: u32) -> u32 {
        match self.order {
            Some(order) => order.get(position as usize).copied().unwrap_or(0),
            None => position + 1,
        }
    }

    fn key_at(&self, position: u32, index: usize) -> Result<u32> {
        self.column(self.row_at(position), index)
    }

    fn partition_point(&self, index: usize, below: impl Fn(u32) -> bool) -> Result<u32> {
        let (mut low, mut high) = (0, self.row_count);
        while low < high {
            let mid = low + (high - low) / 2;
            if below(self.key_at(mid, index)?) {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        Ok(low)
    }

    /// Positions (in key order) of the rows whose column `index` equals `value`
    ///
    /// Binary search over the key column. The positions are 1-based and map to row ids
    /// through [`MetadataTable::order`] when the table carries a sort index.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a column index past the schema
    pub fn equal_range(&self, index: usize, value: u32) -> Result<Range<u32>> {
        if self.row_count == 0 {
            return Ok(0..0);
        }

        let start = self.partition_point(index, |key| key < value)?;
        let end = self.partition_point(index, |key| key <= value)?;
        Ok(start + 1..end + 1)
    }

    /// Row id of the first row whose column `index` equals `value`
    ///
    /// ## Errors
    ///
    /// Same as [`MetadataTable::equal_range`]
    pub fn find(&self, index: usize, value: u32) -> Result<Option<u32>> {
        let range = self.equal_range(index, value)?;
        if range.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.row_at(range.start - 1)))
    }

    /// Returns `true` if column `index` never decreases in physical row order
    ///
    /// ## Errors
    ///
    /// Same as [`MetadataTable::column`]
    pub fn is_sorted_by(&self, index: usize) -> Result<bool> {
        let mut previous = 0;
        for rid in 1..=self.row_count {
            let key = self.column(rid, index)?;
            if key < previous {
                return Ok(false);
            }
            previous = key;
        }
        Ok(true)
    }

    /// All rows in physical order
    #[must_use]
    pub fn iter(&self) -> TableIterator<'_, 'a, T> {
        TableIterator {
            table: self,
            range: 0..self.row_count,
        }
    }

    /// All rows, decoded on the rayon pool
    ///
    /// Each item is a [`Result`]; `try_for_each` stops at the first damaged row.
    #[must_use]
    pub fn par_iter(&self) -> TableParIterator<'_, 'a, T> {
        TableParIterator {
            table: self,
            range: 0..self.row_count,
        }
    }
}

impl<'t, 'a, T: RowReadable> IntoIterator for &'t MetadataTable<'a, T> {
    type Item = Result<T>;
    type IntoIter = TableIterator<'t, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// See [`MetadataTable::iter`]
pub struct TableIterator<'t, 'a, T> {
    table: &'t MetadataTable<'a, T>,
    range: Range<u32>,
}

impl<T: RowReadable> Iterator for TableIterator<'_, '_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.range.next()?;
        Some(self.table.get(index + 1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.range.len();
        (len, Some(len))
    }
}

impl<T: RowReadable> ExactSizeIterator for TableIterator<'_, '_, T> {}

impl<T: RowReadable> DoubleEndedIterator for TableIterator<'_, '_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.range.next_back()?;
        Some(self.table.get(index + 1))
    }
}

/// See [`MetadataTable::par_iter`]
pub struct TableParIterator<'t, 'a, T> {
    table: &'t MetadataTable<'a, T>,
    range: Range<u32>,
}

impl<T: RowReadable> ParallelIterator for TableParIterator<'_, '_, T> {
    type Item = Result<T>;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: plumbing::UnindexedConsumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }

    fn opt_len(&self) -> Option<usize> {
        Some(self.range.len())
    }
}

impl<T: RowReadable> IndexedParallelIterator for TableParIterator<'_, '_, T> {
    fn len(&self) -> usize {
        self.range.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: plumbing::Consumer<Self::Item>,
    {
        plumbing::bridge(self, consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: plumbing::ProducerCallback<Self::Item>,
    {
        callback.callback(TableProducer {
            table: self.table,
            range: self.range,
        })
    }
}

/// Splits a row range for rayon's work stealing
struct TableProducer<'t, 'a, T> {
    table: &'t MetadataTable<'a, T>,
    range: Range<u32>,
}

impl<'t, 'a, T: RowReadable> plumbing::Producer for TableProducer<'t, 'a, T> {
    type Item = Result<T>;
    type IntoIter = TableIterator<'t, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        TableIterator {
            table: self.table,
            range: self.range,
        }
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        // row positions fit u32
        #[allow(clippy::cast_possible_truncation)]
        let mid = self.range.start + index as u32;
        let left = TableProducer {
            table: self.table,
            range: self.range.start..mid,
        };
        let right = TableProducer {
            table: self.table,
            range: mid..self.range.end,
        };
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rayon::prelude::*;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::metadata::{
        handles::TypeDefHandle,
        tables::{columns, NestedClassRaw, TypeDefRaw},
    };

    #[test]
    fn column_budget() {
        for table in TableId::iter() {
            assert!(columns(table).len() <= MAX_COLUMNS, "{table:?}");
        }
    }

    #[test]
    fn layout_offsets() {
        let sizes = TableInfo::new_test(&[(TableId::Field, 70000)], true, false, false);
        let layout = TableLayout::new(TypeDefRaw::COLUMNS, &sizes);

        let offsets: Vec<u32> = (0..6).filter_map(|i| layout.column_offset(i)).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12, 14, 18]);
        assert_eq!(layout.column_width(4), Some(4));
        assert_eq!(layout.row_size(), 20);
        assert_eq!(layout.column_offset(6), None);
    }

    #[test]
    fn crafted_short() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x00, 0x10, 0x00, // flags
            0x0A, 0x00,             // type_name
            0x15, 0x00,             // type_namespace
            0x05, 0x00,             // extends: TypeRef 1
            0x02, 0x00,             // field_list
            0x01, 0x00,             // method_list
        ];

        let sizes = Arc::new(TableInfo::new_test(
            &[(TableId::TypeRef, 1), (TableId::Field, 3), (TableId::MethodDef, 2)],
            false,
            false,
            false,
        ));
        let table = MetadataTable::<TypeDefRaw>::new(&data, 1, sizes).unwrap();

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.flags, 0x0010_0001);
        assert_eq!(row.type_name.offset(), 0x0A);
        assert_eq!(row.type_namespace.offset(), 0x15);
        assert_eq!(row.extends.table(), TableId::TypeRef);
        assert_eq!(row.extends.row(), 1);
        assert_eq!(row.field_list, 2);
        assert_eq!(row.method_list, 1);
        assert_eq!(row.token().value(), 0x0200_0001);

        assert_eq!(table.column(1, 2).unwrap(), 0x15);
        assert_eq!(table.column(1, 3).unwrap(), 0x05);
        assert!(table.column(1, 6).is_err());
        assert!(matches!(table.get(0), Err(Error::InvalidHandle(_))));
        assert!(matches!(table.get(2), Err(Error::InvalidHandle(_))));
    }

    #[test]
    fn too_small() {
        let sizes = Arc::new(TableInfo::new_test(&[], false, false, false));
        assert!(MetadataTable::<TypeDefRaw>::new(&[0; 13], 1, sizes).is_err());
    }

    fn nested_classes() -> Vec<u8> {
        // NestedClass, EnclosingClass
        let mut data = Vec::new();
        for (nested, enclosing) in [(2u16, 1u16), (3, 1), (5, 4), (6, 4), (7, 4), (9, 8)] {
            data.extend_from_slice(&nested.to_le_bytes());
            data.extend_from_slice(&enclosing.to_le_bytes());
        }
        data
    }

    #[test]
    fn binary_search() {
        let data = nested_classes();
        let sizes = Arc::new(TableInfo::new_test(&[(TableId::TypeDef, 9)], false, false, false));
        let table = MetadataTable::<NestedClassRaw>::new(&data, 6, sizes).unwrap();

        assert!(table.is_sorted_by(0).unwrap());
        assert!(table.is_sorted_by(1).unwrap());
        assert_eq!(table.equal_range(0, 5).unwrap(), 3..4);
        assert_eq!(table.equal_range(0, 4).unwrap(), 3..3);
        assert_eq!(table.find(0, 7).unwrap(), Some(5));
        assert_eq!(table.find(0, 1).unwrap(), None);
        assert_eq!(table.equal_range(1, 4).unwrap(), 3..6);
    }

    #[test]
    fn binary_search_through_order() {
        // physical rows: enclosing 4, 1, 4, 1
        let mut data = Vec::new();
        for (nested, enclosing) in [(5u16, 4u16), (2, 1), (6, 4), (3, 1)] {
            data.extend_from_slice(&nested.to_le_bytes());
            data.extend_from_slice(&enclosing.to_le_bytes());
        }
        let order = [2u32, 4, 1, 3];

        let sizes = Arc::new(TableInfo::new_test(&[(TableId::TypeDef, 6)], false, false, false));
        let table = MetadataTable::<NestedClassRaw>::new(&data, 4, sizes)
            .unwrap()
            .with_order(Some(&order));

        assert!(!table.is_sorted_by(1).unwrap());
        assert_eq!(table.equal_range(1, 4).unwrap(), 3..5);
        assert_eq!(table.find(1, 1).unwrap(), Some(2));
        assert_eq!(table.find(1, 4).unwrap(), Some(1));
    }

    #[test]
    fn iterators() {
        let data = nested_classes();
        let sizes = Arc::new(TableInfo::new_test(&[(TableId::TypeDef, 9)], false, false, false));
        let table = MetadataTable::<NestedClassRaw>::new(&data, 6, sizes).unwrap();

        let nested: Vec<u32> = table
            .iter()
            .map(|row| row.unwrap().nested_class.row())
            .collect();
        assert_eq!(nested, vec![2, 3, 5, 6, 7, 9]);
        assert_eq!(table.iter().len(), 6);
        assert_eq!(table.iter().next_back().unwrap().unwrap().rid, 6);

        let enclosed_by_four = table
            .par_iter()
            .filter(|row| {
                row.as_ref()
                    .is_ok_and(|row| row.enclosing_class == TypeDefHandle::from_row(4).unwrap())
            })
            .count();
        assert_eq!(enclosed_by_four, 3);

        let result: Result<()> = table.par_iter().try_for_each(|row| row.map(|_| ()));
        assert!(result.is_ok());

        let mut parallel: Vec<u32> = table
            .par_iter()
            .map(|row| row.map(|row| row.rid).unwrap_or(0))
            .collect();
        parallel.sort_unstable();
        assert_eq!(parallel, vec![1, 2, 3, 4, 5, 6]);
    }
}
