//! Cursor based reader over blobs, signatures and other byte sequences.
//!
//! [`Parser`] keeps a position into a borrowed slice and offers bounds checked reads of
//! every primitive used by the metadata format, including the compressed integer
//! encodings and the length prefixed string forms found in custom attribute values.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::Parser;
//!
//! let data = [0x83, 0xE8, 0x05, b'H', b'e', b'l', b'l', b'o'];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 1000);
//! assert_eq!(parser.read_serialized_string()?, Some("Hello"));
//! assert!(!parser.has_more_data());
//! # Ok::<(), cilmeta::Error>(())
//! ```

use widestring::U16String;

use crate::{
    codec::{
        compressed::{decode_compressed_int, decode_compressed_uint},
        io::{read_be_at, read_bytes_at, read_le_at, CilIO},
    },
    metadata::{
        handles::{BlobHandle, EntityHandle},
        tables::TableId,
    },
    Result,
};

/// A bounds checked read cursor over a byte slice
///
/// All reads advance the position on success. A failed read leaves the position where it
/// was, use [`Parser::transactional`] to roll back a sequence of reads.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`
    ///
    /// # Arguments
    /// * `data` - The bytes to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are bytes left to read
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of bytes left to read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Current position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data, independent of the position
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor to `pos`
    ///
    /// Seeking to the end of the data is allowed, reading from there is not.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the data
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Skip one byte
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Skip `step` bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `step` bytes are left
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Advance to the next multiple of `alignment`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `alignment` is zero, or
    /// [`crate::Error::OutOfBounds`] if the padding crosses the end of the data
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment == 0 {
            return Err(invalid_argument_error!("alignment must not be zero"));
        }

        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Run `f`, restoring the position if it fails
    ///
    /// # Errors
    /// Returns whatever `f` returned
    pub fn transactional<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_position = self.position;
        let result = f(self);
        if result.is_err() {
            self.position = saved_position;
        }
        result
    }

    /// Read the next byte without consuming it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_bounds_error!())
    }

    /// Read a little-endian `T` without consuming it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `T` crosses the end of the data
    pub fn peek_le<T: CilIO>(&self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position.clone())
    }

    /// Read a little-endian `T`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `T` crosses the end of the data
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a big-endian `T`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `T` crosses the end of the data
    pub fn read_be<T: CilIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Read a single byte boolean, any non-zero value is `true`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_le::<u8>()? != 0)
    }

    /// Read a UTF-16 code unit, unpaired surrogates decode to U+FFFD
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than two bytes are left
    pub fn read_char(&mut self) -> Result<char> {
        let unit = self.read_le::<u16>()?;
        Ok(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Borrow the next `length` bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes are left
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        read_bytes_at(self.data, &mut self.position, length)
    }

    /// Read a GUID in its mixed-endian on-disk layout
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 16 bytes are left
    pub fn read_guid(&mut self) -> Result<uguid::Guid> {
        let bytes = self.read_bytes(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(uguid::Guid::from_bytes(raw))
    }

    /// Read a compressed unsigned integer (ECMA-335 II.23.2)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input, or
    /// [`crate::Error::InvalidCompressedInteger`] for an invalid lead byte
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let (value, size) = decode_compressed_uint(&self.data[self.position.min(self.data.len())..])?;
        self.position += size;
        Ok(value)
    }

    /// Read a compressed signed integer (ECMA-335 II.23.2)
    ///
    /// # Errors
    /// Same as [`Parser::read_compressed_uint`]
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let (value, size) = decode_compressed_int(&self.data[self.position.min(self.data.len())..])?;
        self.position += size;
        Ok(value)
    }

    /// Read a `TypeDefOrRefOrSpecEncoded` value (ECMA-335 II.23.2.8)
    ///
    /// The two low bits select `TypeDef`, `TypeRef` or `TypeSpec`, the remaining bits hold the
    /// row id.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for the unused tag `3`, in addition to the errors of
    /// [`Parser::read_compressed_uint`]
    pub fn read_compressed_token(&mut self) -> Result<EntityHandle> {
        let start = self.position;
        let encoded = self.read_compressed_uint()?;

        let table = match encoded & 0x3 {
            0x0 => TableId::TypeDef,
            0x1 => TableId::TypeRef,
            0x2 => TableId::TypeSpec,
            _ => {
                self.position = start;
                return Err(malformed_error!(
                    "Invalid TypeDefOrRefOrSpec encoding - {:#x}",
                    encoded
                ));
            }
        };

        EntityHandle::new(table, encoded >> 2)
    }

    /// Read a compressed length followed by a reference into the `#Blob` heap
    ///
    /// # Errors
    /// Same as [`Parser::read_compressed_uint`], plus [`crate::Error::InvalidHandle`] if the
    /// offset exceeds the `#Blob` heap range
    pub fn read_blob_handle(&mut self) -> Result<BlobHandle> {
        BlobHandle::from_offset(self.read_compressed_uint()?)
    }

    /// Read `length` bytes as strict UTF-8
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input, or [`crate::Error::Malformed`]
    /// if the bytes are not valid UTF-8
    pub fn read_utf8(&mut self, length: usize) -> Result<&'a str> {
        let start = self.position;
        let bytes = self.read_bytes(length)?;
        std::str::from_utf8(bytes).map_err(|e| {
            self.position = start;
            malformed_error!("Invalid UTF-8 string at offset {}: {}", start, e)
        })
    }

    /// Read `length` bytes as UTF-16LE, unpaired surrogates are preserved
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncated input, or [`crate::Error::Malformed`]
    /// if `length` is odd
    pub fn read_utf16(&mut self, length: usize) -> Result<U16String> {
        if length % 2 != 0 {
            return Err(malformed_error!(
                "UTF-16 string length {} is not a multiple of two",
                length
            ));
        }

        let bytes = self.read_bytes(length)?;
        Ok(U16String::from_vec(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect::<Vec<u16>>(),
        ))
    }

    /// Read a NUL terminated UTF-8 string
    ///
    /// A missing terminator at the end of the data is accepted.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the bytes are not valid UTF-8
    pub fn read_string_utf8(&mut self) -> Result<&'a str> {
        let rest = &self.data[self.position.min(self.data.len())..];
        let length = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());

        let string = self.read_utf8(length)?;
        if self.has_more_data() {
            self.position += 1;
        }
        Ok(string)
    }

    /// Read a `SerString` as used by custom attribute values (ECMA-335 II.23.3)
    ///
    /// A compressed byte length followed by UTF-8, or the single byte `0xFF` for a null string.
    ///
    /// # Errors
    /// Same as [`Parser::read_utf8`] and [`Parser::read_compressed_uint`]
    pub fn read_serialized_string(&mut self) -> Result<Option<&'a str>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        self.transactional(|parser| {
            let length = parser.read_compressed_uint()? as usize;
            parser.read_utf8(length).map(Some)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_compressed_uint() {
        let test_cases = vec![
            (vec![0x03], 3),
            (vec![0x7F], 0x7F),
            (vec![0x80, 0x80], 0x80),
            (vec![0xAE, 0x57], 0x2E57),
            (vec![0xBF, 0xFF], 0x3FFF),
            (vec![0xC0, 0x00, 0x40, 0x00], 0x4000),
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_uint().unwrap(), expected);
            assert_eq!(parser.pos(), input.len());
        }
    }

    #[test]
    fn read_compressed_int() {
        let test_cases = vec![
            (vec![0x06], 3),
            (vec![0x7B], -3),
            (vec![0x80, 0x80], 64),
            (vec![0x01], -64),
            (vec![0xC0, 0x00, 0x40, 0x00], 8192),
            (vec![0x80, 0x01], -8192),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_int().unwrap(), expected);
        }
    }

    #[test]
    fn read_compressed_failures_keep_position() {
        let mut parser = Parser::new(&[0x01, 0xC0, 0x00]);
        assert_eq!(parser.read_compressed_uint().unwrap(), 1);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(parser.pos(), 1);

        let mut parser = Parser::new(&[0xF0]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::InvalidCompressedInteger(0xF0))
        ));

        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.read_compressed_int(),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn read_compressed_token() {
        let test_cases = vec![
            (vec![0x49], TableId::TypeRef, 0x12),
            (vec![0x08], TableId::TypeDef, 0x02),
            (vec![0x0E], TableId::TypeSpec, 0x03),
        ];

        for (input, table, row) in test_cases {
            let mut parser = Parser::new(&input);
            let handle = parser.read_compressed_token().unwrap();
            assert_eq!(handle.table(), table);
            assert_eq!(handle.row(), row);
        }

        let mut parser = Parser::new(&[0x07]);
        assert!(matches!(
            parser.read_compressed_token(),
            Err(Error::Malformed { .. })
        ));
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn read_strings() {
        let data = b"Hello\0World";
        let mut parser = Parser::new(data);
        assert_eq!(parser.read_string_utf8().unwrap(), "Hello");
        assert_eq!(parser.read_string_utf8().unwrap(), "World");
        assert!(!parser.has_more_data());

        let mut parser = Parser::new(&[0x02, 0xC3, 0x28]);
        assert!(matches!(
            parser.read_serialized_string(),
            Err(Error::Malformed { .. })
        ));
        assert_eq!(parser.pos(), 0);

        let mut parser = Parser::new(&[0xFF, 0x00]);
        assert_eq!(parser.read_serialized_string().unwrap(), None);
        assert_eq!(parser.read_serialized_string().unwrap(), Some(""));
    }

    #[test]
    fn read_utf16() {
        let data = [0x48, 0x00, 0x69, 0x00, 0x00, 0xD8];
        let mut parser = Parser::new(&data);
        let text = parser.read_utf16(6).unwrap();
        assert_eq!(text.as_slice(), &[0x48, 0x69, 0xD800]);

        let mut parser = Parser::new(&data);
        assert!(matches!(parser.read_utf16(3), Err(Error::Malformed { .. })));
    }

    #[test]
    fn cursor_movement() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = Parser::new(&data);

        parser.advance().unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);
        assert_eq!(parser.peek_le::<u16>().unwrap(), 0x0605);
        assert_eq!(parser.read_be::<u16>().unwrap(), 0x0506);

        assert!(parser.advance_by(3).is_err());
        parser.seek(8).unwrap();
        assert!(parser.peek_byte().is_err());
        assert!(parser.seek(9).is_err());

        let result: Result<u32> = parser.transactional(|p| {
            p.seek(0)?;
            p.read_le::<u64>()?;
            p.read_le::<u32>()
        });
        assert!(result.is_err());
        assert_eq!(parser.pos(), 8);
    }

    #[test]
    fn read_guid() {
        let data = [
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF,
        ];
        let mut parser = Parser::new(&data);
        assert_eq!(
            parser.read_guid().unwrap(),
            uguid::guid!("00112233-4455-6677-8899-aabbccddeeff")
        );
    }
}
