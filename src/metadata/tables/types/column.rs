use crate::{
    codec::io::{read_le_at, read_le_at_dyn},
    metadata::{
        handles::{BlobHandle, EntityHandle, GuidHandle, RowHandle, StringHandle},
        tables::{CodedIndexType, TableId, TableInfo},
    },
    Result,
};

/// The storage class of one table column
///
/// The schema of every table is a static list of these, the width of each is resolved
/// through [`TableInfo::column_bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    /// One byte followed by one padding byte (only `Constant.Type`)
    U8,
    /// Fixed 2 bytes
    U16,
    /// Fixed 4 bytes
    U32,
    /// `#Strings` heap offset
    String,
    /// `#GUID` heap index
    Guid,
    /// `#Blob` heap offset
    Blob,
    /// Simple index into one table
    Table(TableId),
    /// First row of a run in one table, ended by the value of the next row
    List(TableId),
    /// Coded index into one of several tables
    Coded(CodedIndexType),
}

/// Reads the raw value of one column and advances `offset` past it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the column does not fit `data`
pub fn read_column_raw(
    data: &[u8],
    offset: &mut usize,
    sizes: &TableInfo,
    column: Column,
) -> Result<u32> {
    match column {
        Column::U8 => {
            let value = read_le_at::<u8>(data, offset)?;
            let _padding = read_le_at::<u8>(data, offset)?;
            Ok(u32::from(value))
        }
        _ => read_le_at_dyn(data, offset, sizes.column_bytes(column) == 4),
    }
}

/// Conversion from a column to the type of a row field
pub trait ColumnValue: Sized {
    /// Read one column and advance `offset` past it
    ///
    /// # Errors
    /// Returns an error if the column does not fit `data` or its value is not valid for `Self`
    fn read_column(data: &[u8], offset: &mut usize, sizes: &TableInfo, column: Column)
        -> Result<Self>;
}

impl ColumnValue for u32 {
    fn read_column(
        data: &[u8],
        offset: &mut usize,
        sizes: &TableInfo,
        column: Column,
    ) -> Result<Self> {
        read_column_raw(data, offset, sizes, column)
    }
}

impl ColumnValue for u16 {
    fn read_column(
        data: &[u8],
        offset: &mut usize,
        sizes: &TableInfo,
        column: Column,
    ) -> Result<Self> {
        let value = read_column_raw(data, offset, sizes, column)?;
        u16::try_from(value).map_err(|_| malformed_error!("{:#x} exceeds a u16 column", value))
    }
}

impl ColumnValue for u8 {
    fn read_column(
        data: &[u8],
        offset: &mut usize,
        sizes: &TableInfo,
        column: Column,
    ) -> Result<Self> {
        let value = read_column_raw(data, offset, sizes, column)?;
        u8::try_from(value).map_err(|_| malformed_error!("{:#x} exceeds a u8 column", value))
    }
}

macro_rules! heap_column {
    ($($handle:ident),+) => {
        $(
            impl ColumnValue for $handle {
                fn read_column(
                    data: &[u8],
                    offset: &mut usize,
                    sizes: &TableInfo,
                    column: Column,
                ) -> Result<Self> {
                    let value = read_column_raw(data, offset, sizes, column)?;
                    $handle::from_offset(value)
                        .map_err(|_| malformed_error!("{} {:#x} out of range", stringify!($handle), value))
                }
            }
        )+
    };
}

heap_column!(StringHandle, BlobHandle, GuidHandle);

impl ColumnValue for EntityHandle {
    fn read_column(
        data: &[u8],
        offset: &mut usize,
        sizes: &TableInfo,
        column: Column,
    ) -> Result<Self> {
        let value = read_column_raw(data, offset, sizes, column)?;
        match column {
            Column::Coded(coded) => coded.decode(value),
            Column::Table(table) | Column::List(table) => EntityHandle::new(table, value)
                .map_err(|_| malformed_error!("{:?} row {:#x} out of range", table, value)),
            _ => Err(malformed_error!("{:?} does not hold a table reference", column)),
        }
    }
}

impl<H: RowHandle> ColumnValue for H {
    fn read_column(
        data: &[u8],
        offset: &mut usize,
        sizes: &TableInfo,
        column: Column,
    ) -> Result<Self> {
        let value = read_column_raw(data, offset, sizes, column)?;
        H::from_row(value)
            .map_err(|_| malformed_error!("{:?} row {:#x} out of range", H::TABLE, value))
    }
}
