//! Fixed-width primitive reads and writes.
//!
//! All metadata structures store multi-byte integers in little-endian order. The few
//! big-endian reads and writes exist for the compressed integer encodings and for a handful
//! of signature contexts that explicitly require them.
//!
//! Every function takes an explicit offset which is advanced past the consumed bytes on
//! success and left untouched on failure.

use crate::Result;

/// Primitive values that can be read from and written to metadata byte sequences.
///
/// Implemented for all fixed-width integers and both IEEE floating point types. The
/// associated `Bytes` array doubles as the size of the encoded value.
pub trait CilIO: Sized + Copy {
    /// The fixed size array holding the encoded value
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from its little-endian representation
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Decode a value from its big-endian representation
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    /// Encode this value in little-endian order
    fn to_le_bytes(self) -> Self::Bytes;
    /// Encode this value in big-endian order
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )+
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Returns the sub-slice `offset..offset + len` or [`crate::Error::OutOfBounds`].
fn window(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(out_of_bounds_error!()),
    }
}

fn window_mut(data: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&mut data[offset..end]),
        _ => Err(out_of_bounds_error!()),
    }
}

/// Read a little-endian `T` from the start of `data`
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    read_le_at(data, &mut 0)
}

/// Read a little-endian `T` at `offset` and advance it
///
/// # Arguments
/// * `data`    - The buffer to read from
/// * `offset`  - The position to read at, advanced by `size_of::<T>()` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value crosses the end of `data`
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let len = std::mem::size_of::<T>();
    let Ok(bytes) = T::Bytes::try_from(window(data, *offset, len)?) else {
        return Err(out_of_bounds_error!());
    };

    *offset += len;
    Ok(T::from_le_bytes(bytes))
}

/// Read a 2 or 4 byte little-endian reference, widened to `u32`
///
/// Heap offsets and table indexes are stored in either width depending on the size of the
/// referenced heap or table.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value crosses the end of `data`
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    if is_large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}

/// Read a big-endian `T` from the start of `data`
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`
pub fn read_be<T: CilIO>(data: &[u8]) -> Result<T> {
    read_be_at(data, &mut 0)
}

/// Read a big-endian `T` at `offset` and advance it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value crosses the end of `data`
pub fn read_be_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let len = std::mem::size_of::<T>();
    let Ok(bytes) = T::Bytes::try_from(window(data, *offset, len)?) else {
        return Err(out_of_bounds_error!());
    };

    *offset += len;
    Ok(T::from_be_bytes(bytes))
}

/// Write `value` in little-endian order at `offset` and advance it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();
    window_mut(data, *offset, bytes.len())?.copy_from_slice(bytes);

    *offset += bytes.len();
    Ok(())
}

/// Write a 2 or 4 byte little-endian reference at `offset` and advance it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`, or
/// [`crate::Error::InvalidArgument`] if `value` does not fit into a small reference
pub fn write_le_at_dyn(data: &mut [u8], offset: &mut usize, value: u32, is_large: bool) -> Result<()> {
    if is_large {
        return write_le_at::<u32>(data, offset, value);
    }

    let Ok(small) = u16::try_from(value) else {
        return Err(invalid_argument_error!(
            "reference {:#x} does not fit into 2 bytes",
            value
        ));
    };
    write_le_at::<u16>(data, offset, small)
}

/// Write `value` in big-endian order at `offset` and advance it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`
pub fn write_be_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_be_bytes();
    let bytes = bytes.as_ref();
    window_mut(data, *offset, bytes.len())?.copy_from_slice(bytes);

    *offset += bytes.len();
    Ok(())
}

/// Borrow `len` bytes at `offset` and advance it
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the range crosses the end of `data`
pub fn read_bytes_at<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8]> {
    let bytes = window(data, *offset, len)?;
    *offset += len;
    Ok(bytes)
}
