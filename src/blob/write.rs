use crate::{
    codec::{
        compressed::{encode_compressed_int, encode_compressed_uint},
        io::CilIO,
        utf8::{encode_utf16_as_utf8, utf8_len_of_utf16},
        ConstantValue,
    },
    Result,
};

/// Largest run [`BlobWrite::write_bytes_repeated`] hands to a single write
const REPEAT_BLOCK: usize = 64;

/// The write surface shared by [`super::BlobBuilder`] and [`super::BlobWriter`]
///
/// Implementors provide [`BlobWrite::write_bytes`] and [`BlobWrite::position`], every other
/// write is expressed through them. All multi-byte values are little-endian unless the name
/// says otherwise.
///
/// A write that emits its value in several pieces first checks the total size through
/// [`BlobWrite::ensure_available`], so a failing write leaves nothing behind.
pub trait BlobWrite {
    /// Append `bytes`
    ///
    /// # Errors
    /// [`crate::Error::WriterOutOfBounds`] if a fixed extent is exceeded, or
    /// [`crate::Error::LockError`] if a chunk pool is poisoned
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes written so far
    fn position(&self) -> usize;

    /// Fail unless `len` more bytes can be written
    ///
    /// Growable writers accept any length.
    ///
    /// # Errors
    /// [`crate::Error::WriterOutOfBounds`] if a fixed extent has less than `len` bytes left
    fn ensure_available(&mut self, len: usize) -> Result<()> {
        let _ = len;
        Ok(())
    }

    /// Append a little-endian `T`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_le<T: CilIO>(&mut self, value: T) -> Result<()>
    where
        Self: Sized,
    {
        self.write_bytes(value.to_le_bytes().as_ref())
    }

    /// Append a big-endian `T`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_be<T: CilIO>(&mut self, value: T) -> Result<()>
    where
        Self: Sized,
    {
        self.write_bytes(value.to_be_bytes().as_ref())
    }

    /// Append a `u8`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Append an `i8`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append a `bool` as one byte
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    /// Append a `u16`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append an `i16`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append a `u32`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append an `i32`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append a `u64`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append an `i64`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append an `f32`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append an `f64`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Append a big-endian `u16`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Append a big-endian `u32`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Append `count` copies of `value`
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_bytes_repeated(&mut self, value: u8, count: usize) -> Result<()> {
        self.ensure_available(count)?;
        let block = [value; REPEAT_BLOCK];
        let mut remaining = count;
        while remaining > 0 {
            let step = remaining.min(REPEAT_BLOCK);
            self.write_bytes(&block[..step])?;
            remaining -= step;
        }
        Ok(())
    }

    /// Append a compressed unsigned integer (ECMA-335 II.23.2) in its smallest form
    ///
    /// # Errors
    /// [`crate::Error::InvalidCompressedInteger`] if `value` exceeds `0x1FFF_FFFF`
    fn write_compressed_integer(&mut self, value: u32) -> Result<()> {
        let mut encoded = [0u8; 4];
        let len = encode_compressed_uint(value, &mut encoded)?;
        self.write_bytes(&encoded[..len])
    }

    /// Append a compressed signed integer (ECMA-335 II.23.2)
    ///
    /// # Errors
    /// [`crate::Error::InvalidCompressedInteger`] if `value` does not fit 29 signed bits
    fn write_compressed_signed_integer(&mut self, value: i32) -> Result<()> {
        let mut encoded = [0u8; 4];
        let len = encode_compressed_int(value, &mut encoded)?;
        self.write_bytes(&encoded[..len])
    }

    /// Append a table or heap reference in 2 or 4 bytes
    ///
    /// # Errors
    /// [`crate::Error::InvalidArgument`] if `value` does not fit a small reference
    fn write_reference(&mut self, value: u32, is_small: bool) -> Result<()> {
        if is_small {
            let small = u16::try_from(value).map_err(|_| {
                invalid_argument_error!("reference {:#x} does not fit 2 bytes", value)
            })?;
            self.write_u16(small)
        } else {
            self.write_u32(value)
        }
    }

    /// Append the UTF-8 bytes of `value`, without length or terminator
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_utf8(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Append UTF-16 `units` transcoded to UTF-8
    ///
    /// With `allow_unpaired_surrogates` an unpaired surrogate keeps its 3 byte form, otherwise
    /// it becomes U+FFFD.
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_utf16_as_utf8(&mut self, units: &[u16], allow_unpaired_surrogates: bool) -> Result<()> {
        let mut encoded = Vec::with_capacity(utf8_len_of_utf16(units));
        encode_utf16_as_utf8(units, allow_unpaired_surrogates, &mut encoded);
        self.write_bytes(&encoded)
    }

    /// Append the UTF-16LE code units of `value`, without length or terminator
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_utf16(&mut self, value: &str) -> Result<()> {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        self.write_bytes(&encoded)
    }

    /// Append a `SerString` (ECMA-335 II.23.3): compressed length and UTF-8, `0xFF` for `None`
    ///
    /// # Errors
    /// See [`BlobWrite::write_compressed_integer`]
    fn write_serialized_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.write_u8(0xFF),
            Some(value) => {
                let len = u32::try_from(value.len())
                    .map_err(|_| invalid_argument_error!("string of {} bytes", value.len()))?;
                let mut prefix = [0u8; 4];
                let prefix_len = encode_compressed_uint(len, &mut prefix)?;
                self.ensure_available(prefix_len + value.len())?;
                self.write_bytes(&prefix[..prefix_len])?;
                self.write_utf8(value)
            }
        }
    }

    /// Append a `#US` heap entry (ECMA-335 II.24.2.4)
    ///
    /// The compressed length covers the UTF-16LE data and the trailing byte, which is 1 if any
    /// code unit needs more than 8-bit handling.
    ///
    /// # Errors
    /// See [`BlobWrite::write_compressed_integer`]
    fn write_user_string(&mut self, value: &str) -> Result<()> {
        let units: Vec<u16> = value.encode_utf16().collect();
        let len = units
            .len()
            .checked_mul(2)
            .and_then(|len| len.checked_add(1))
            .and_then(|len| u32::try_from(len).ok())
            .ok_or_else(|| invalid_argument_error!("user string of {} units", units.len()))?;

        let mut prefix = [0u8; 4];
        let prefix_len = encode_compressed_uint(len, &mut prefix)?;
        let mut entry = Vec::with_capacity(prefix_len + len as usize);
        entry.extend_from_slice(&prefix[..prefix_len]);
        entry.extend(units.iter().flat_map(|unit| unit.to_le_bytes()));
        entry.push(u8::from(units.iter().any(|&unit| needs_wide_handling(unit))));
        self.write_bytes(&entry)
    }

    /// Append a GUID in its 16 byte on-disk layout
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_guid(&mut self, guid: &uguid::Guid) -> Result<()> {
        self.write_bytes(&guid.to_bytes())
    }

    /// Append the blob of a `Constant` row
    ///
    /// # Errors
    /// See [`BlobWrite::write_bytes`]
    fn write_constant(&mut self, value: &ConstantValue) -> Result<()> {
        match value {
            ConstantValue::Boolean(value) => self.write_bool(*value),
            ConstantValue::Char(value) | ConstantValue::UInt16(value) => self.write_u16(*value),
            ConstantValue::SByte(value) => self.write_i8(*value),
            ConstantValue::Byte(value) => self.write_u8(*value),
            ConstantValue::Int16(value) => self.write_i16(*value),
            ConstantValue::Int32(value) => self.write_i32(*value),
            ConstantValue::UInt32(value) => self.write_u32(*value),
            ConstantValue::Int64(value) => self.write_i64(*value),
            ConstantValue::UInt64(value) => self.write_u64(*value),
            ConstantValue::Single(value) => self.write_f32(*value),
            ConstantValue::Double(value) => self.write_f64(*value),
            ConstantValue::String(value) => {
                let encoded: Vec<u8> = value
                    .as_slice()
                    .iter()
                    .flat_map(|unit| unit.to_le_bytes())
                    .collect();
                self.write_bytes(&encoded)
            }
            ConstantValue::NullReference => self.write_u32(0),
        }
    }

    /// Append zeros up to the next multiple of `alignment`
    ///
    /// # Errors
    /// [`crate::Error::InvalidArgument`] if `alignment` is not a power of two
    fn align(&mut self, alignment: usize) -> Result<()> {
        if !alignment.is_power_of_two() {
            return Err(invalid_argument_error!(
                "alignment {} is not a power of two",
                alignment
            ));
        }
        let padding = (alignment - self.position() % alignment) % alignment;
        self.write_bytes_repeated(0, padding)
    }

    /// Append zeros until [`BlobWrite::position`] equals `position`
    ///
    /// # Errors
    /// [`crate::Error::InvalidArgument`] if `position` is behind the current position
    fn pad_to(&mut self, position: usize) -> Result<()> {
        let current = self.position();
        if position < current {
            return Err(invalid_argument_error!(
                "cannot pad to {:#x}, already at {:#x}",
                position,
                current
            ));
        }
        self.write_bytes_repeated(0, position - current)
    }
}

/// ECMA-335 II.24.2.4: the units that set the trailing byte of a `#US` entry
fn needs_wide_handling(unit: u16) -> bool {
    unit > 0xFF || matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D | 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobBuilder;

    fn written(write: impl FnOnce(&mut BlobBuilder) -> Result<()>) -> Vec<u8> {
        let mut builder = BlobBuilder::with_capacity(16);
        write(&mut builder).unwrap();
        builder.to_vec()
    }

    #[test]
    fn primitives() {
        let cases: Vec<(Vec<u8>, Vec<u8>)> = vec![
            (written(|b| b.write_u8(0xAB)), vec![0xAB]),
            (written(|b| b.write_i8(-1)), vec![0xFF]),
            (written(|b| b.write_bool(true)), vec![0x01]),
            (written(|b| b.write_u16(0x1234)), vec![0x34, 0x12]),
            (written(|b| b.write_i16(-2)), vec![0xFE, 0xFF]),
            (written(|b| b.write_u32(0x1234_5678)), vec![0x78, 0x56, 0x34, 0x12]),
            (written(|b| b.write_u32_be(0x1234_5678)), vec![0x12, 0x34, 0x56, 0x78]),
            (written(|b| b.write_u16_be(0x1234)), vec![0x12, 0x34]),
            (written(|b| b.write_i64(-1)), vec![0xFF; 8]),
            (written(|b| b.write_f32(1.0)), vec![0x00, 0x00, 0x80, 0x3F]),
            (written(|b| b.write_le(0xBEEFu16)), vec![0xEF, 0xBE]),
            (written(|b| b.write_be(0xBEEFu16)), vec![0xBE, 0xEF]),
        ];

        for (actual, expected) in cases {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn compressed() {
        let cases = vec![
            (0x03u32, vec![0x03]),
            (0x7F, vec![0x7F]),
            (0x80, vec![0x80, 0x80]),
            (0x2E57, vec![0xAE, 0x57]),
            (0x3FFF, vec![0xBF, 0xFF]),
            (0x4000, vec![0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, vec![0xDF, 0xFF, 0xFF, 0xFF]),
        ];

        for (value, expected) in cases {
            assert_eq!(written(|b| b.write_compressed_integer(value)), expected);
        }

        let mut builder = BlobBuilder::new();
        assert!(builder.write_compressed_integer(0x2000_0000).is_err());
        assert_eq!(builder.count(), 0);

        assert_eq!(written(|b| b.write_compressed_signed_integer(3)), vec![0x06]);
        assert_eq!(written(|b| b.write_compressed_signed_integer(-3)), vec![0x7B]);
        assert_eq!(written(|b| b.write_compressed_signed_integer(64)), vec![0x80, 0x80]);
    }

    #[test]
    fn references() {
        assert_eq!(written(|b| b.write_reference(0x1234, true)), vec![0x34, 0x12]);
        assert_eq!(
            written(|b| b.write_reference(0x1234, false)),
            vec![0x34, 0x12, 0x00, 0x00]
        );

        let mut builder = BlobBuilder::new();
        assert!(matches!(
            builder.write_reference(0x1_0000, true),
            Err(crate::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn strings() {
        assert_eq!(written(|b| b.write_utf8("Ab")), vec![b'A', b'b']);
        assert_eq!(written(|b| b.write_utf16("Ab")), vec![b'A', 0, b'b', 0]);
        assert_eq!(written(|b| b.write_serialized_string(None)), vec![0xFF]);
        assert_eq!(
            written(|b| b.write_serialized_string(Some("abc"))),
            vec![0x03, b'a', b'b', b'c']
        );
        assert_eq!(written(|b| b.write_serialized_string(Some(""))), vec![0x00]);
        assert_eq!(
            written(|b| b.write_utf16_as_utf8(&[0x0041, 0xD800], false)),
            vec![0x41, 0xEF, 0xBF, 0xBD]
        );
        assert_eq!(
            written(|b| b.write_utf16_as_utf8(&[0x0041, 0xD800], true)),
            vec![0x41, 0xED, 0xA0, 0x80]
        );
    }

    #[test]
    fn user_strings() {
        assert_eq!(
            written(|b| b.write_user_string("Hi")),
            vec![0x05, b'H', 0, b'i', 0, 0]
        );
        assert_eq!(
            written(|b| b.write_user_string("it's")),
            vec![0x09, b'i', 0, b't', 0, 0x27, 0, b's', 0, 1]
        );
        assert_eq!(
            written(|b| b.write_user_string("\u{4E2D}")),
            vec![0x03, 0x2D, 0x4E, 1]
        );
        assert_eq!(written(|b| b.write_user_string("")), vec![0x01, 0]);
    }

    #[test]
    fn constants() {
        let cases = vec![
            (ConstantValue::Boolean(true), vec![0x01]),
            (ConstantValue::Char(0x41), vec![0x41, 0x00]),
            (ConstantValue::Int32(-2), vec![0xFE, 0xFF, 0xFF, 0xFF]),
            (ConstantValue::UInt64(1), vec![1, 0, 0, 0, 0, 0, 0, 0]),
            (ConstantValue::Double(1.0), 1.0f64.to_le_bytes().to_vec()),
            (
                ConstantValue::String(widestring::U16String::from_str("ok")),
                vec![b'o', 0, b'k', 0],
            ),
            (ConstantValue::NullReference, vec![0, 0, 0, 0]),
        ];

        for (value, expected) in cases {
            assert_eq!(written(|b| b.write_constant(&value)), expected, "{value:?}");
        }
    }

    #[test]
    fn alignment() {
        let mut builder = BlobBuilder::new();
        builder.write_u8(1).unwrap();
        builder.align(4).unwrap();
        assert_eq!(builder.count(), 4);
        builder.align(4).unwrap();
        assert_eq!(builder.count(), 4);
        assert!(builder.align(3).is_err());

        builder.pad_to(10).unwrap();
        assert_eq!(builder.to_vec(), vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            builder.pad_to(2),
            Err(crate::Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn repeated() {
        let bytes = written(|b| b.write_bytes_repeated(0xCC, 150));
        assert_eq!(bytes.len(), 150);
        assert!(bytes.iter().all(|&b| b == 0xCC));
        assert!(written(|b| b.write_bytes_repeated(0xCC, 0)).is_empty());
    }
}
