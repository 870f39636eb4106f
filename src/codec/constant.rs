//! Values of the `Constant` table (ECMA-335 II.22.9).
//!
//! The table stores an element type code next to a blob holding the raw little-endian value.
//! [`ConstantValue`] is the decoded pair; [`crate::Parser::read_constant`] reads one and
//! [`crate::blob::BlobWrite::write_constant`] emits one.

use strum::{EnumCount, EnumIter};
use widestring::U16String;

use crate::{Parser, Result};

/// The element type codes valid in the `Type` column of the `Constant` table
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum ConstantTypeCode {
    /// `ELEMENT_TYPE_BOOLEAN`
    Boolean = 0x02,
    /// `ELEMENT_TYPE_CHAR`
    Char = 0x03,
    /// `ELEMENT_TYPE_I1`
    SByte = 0x04,
    /// `ELEMENT_TYPE_U1`
    Byte = 0x05,
    /// `ELEMENT_TYPE_I2`
    Int16 = 0x06,
    /// `ELEMENT_TYPE_U2`
    UInt16 = 0x07,
    /// `ELEMENT_TYPE_I4`
    Int32 = 0x08,
    /// `ELEMENT_TYPE_U4`
    UInt32 = 0x09,
    /// `ELEMENT_TYPE_I8`
    Int64 = 0x0A,
    /// `ELEMENT_TYPE_U8`
    UInt64 = 0x0B,
    /// `ELEMENT_TYPE_R4`
    Single = 0x0C,
    /// `ELEMENT_TYPE_R8`
    Double = 0x0D,
    /// `ELEMENT_TYPE_STRING`
    String = 0x0E,
    /// `ELEMENT_TYPE_CLASS`, only valid for a null reference
    NullReference = 0x12,
}

impl TryFrom<u8> for ConstantTypeCode {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0x02 => ConstantTypeCode::Boolean,
            0x03 => ConstantTypeCode::Char,
            0x04 => ConstantTypeCode::SByte,
            0x05 => ConstantTypeCode::Byte,
            0x06 => ConstantTypeCode::Int16,
            0x07 => ConstantTypeCode::UInt16,
            0x08 => ConstantTypeCode::Int32,
            0x09 => ConstantTypeCode::UInt32,
            0x0A => ConstantTypeCode::Int64,
            0x0B => ConstantTypeCode::UInt64,
            0x0C => ConstantTypeCode::Single,
            0x0D => ConstantTypeCode::Double,
            0x0E => ConstantTypeCode::String,
            0x12 => ConstantTypeCode::NullReference,
            _ => return Err(malformed_error!("Invalid constant type code - {:#x}", value)),
        })
    }
}

/// A decoded constant
#[derive(Clone, PartialEq, Debug)]
pub enum ConstantValue {
    /// A boolean, stored as one byte
    Boolean(bool),
    /// A UTF-16 code unit
    Char(u16),
    /// `i8`
    SByte(i8),
    /// `u8`
    Byte(u8),
    /// `i16`
    Int16(i16),
    /// `u16`
    UInt16(u16),
    /// `i32`
    Int32(i32),
    /// `u32`
    UInt32(u32),
    /// `i64`
    Int64(i64),
    /// `u64`
    UInt64(u64),
    /// `f32`
    Single(f32),
    /// `f64`
    Double(f64),
    /// A string, stored as UTF-16LE without length or terminator
    String(U16String),
    /// A null object reference, stored as a 4 byte zero
    NullReference,
}

impl ConstantValue {
    /// The type code stored next to this value in the `Constant` table
    #[must_use]
    pub fn type_code(&self) -> ConstantTypeCode {
        match self {
            ConstantValue::Boolean(_) => ConstantTypeCode::Boolean,
            ConstantValue::Char(_) => ConstantTypeCode::Char,
            ConstantValue::SByte(_) => ConstantTypeCode::SByte,
            ConstantValue::Byte(_) => ConstantTypeCode::Byte,
            ConstantValue::Int16(_) => ConstantTypeCode::Int16,
            ConstantValue::UInt16(_) => ConstantTypeCode::UInt16,
            ConstantValue::Int32(_) => ConstantTypeCode::Int32,
            ConstantValue::UInt32(_) => ConstantTypeCode::UInt32,
            ConstantValue::Int64(_) => ConstantTypeCode::Int64,
            ConstantValue::UInt64(_) => ConstantTypeCode::UInt64,
            ConstantValue::Single(_) => ConstantTypeCode::Single,
            ConstantValue::Double(_) => ConstantTypeCode::Double,
            ConstantValue::String(_) => ConstantTypeCode::String,
            ConstantValue::NullReference => ConstantTypeCode::NullReference,
        }
    }
}

impl Parser<'_> {
    /// Read a constant of type `code`, consuming the remaining data for strings
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value is truncated, or
    /// [`crate::Error::Malformed`] for a null reference that is not zero
    pub fn read_constant(&mut self, code: ConstantTypeCode) -> Result<ConstantValue> {
        Ok(match code {
            ConstantTypeCode::Boolean => ConstantValue::Boolean(self.read_bool()?),
            ConstantTypeCode::Char => ConstantValue::Char(self.read_le::<u16>()?),
            ConstantTypeCode::SByte => ConstantValue::SByte(self.read_le::<i8>()?),
            ConstantTypeCode::Byte => ConstantValue::Byte(self.read_le::<u8>()?),
            ConstantTypeCode::Int16 => ConstantValue::Int16(self.read_le::<i16>()?),
            ConstantTypeCode::UInt16 => ConstantValue::UInt16(self.read_le::<u16>()?),
            ConstantTypeCode::Int32 => ConstantValue::Int32(self.read_le::<i32>()?),
            ConstantTypeCode::UInt32 => ConstantValue::UInt32(self.read_le::<u32>()?),
            ConstantTypeCode::Int64 => ConstantValue::Int64(self.read_le::<i64>()?),
            ConstantTypeCode::UInt64 => ConstantValue::UInt64(self.read_le::<u64>()?),
            ConstantTypeCode::Single => ConstantValue::Single(self.read_le::<f32>()?),
            ConstantTypeCode::Double => ConstantValue::Double(self.read_le::<f64>()?),
            ConstantTypeCode::String => ConstantValue::String(self.read_utf16(self.remaining())?),
            ConstantTypeCode::NullReference => {
                let value = self.read_le::<u32>()?;
                if value != 0 {
                    return Err(malformed_error!(
                        "Null reference constant holds {:#x}",
                        value
                    ));
                }
                ConstantValue::NullReference
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for code in ConstantTypeCode::iter() {
            assert_eq!(ConstantTypeCode::try_from(code as u8).unwrap(), code);
        }
        assert!(ConstantTypeCode::try_from(0x01).is_err());
        assert!(ConstantTypeCode::try_from(0x11).is_err());
    }

    #[test]
    fn read_constants() {
        let test_cases = vec![
            (ConstantTypeCode::Boolean, vec![0x01], ConstantValue::Boolean(true)),
            (ConstantTypeCode::Int32, vec![0xFE, 0xFF, 0xFF, 0xFF], ConstantValue::Int32(-2)),
            (
                ConstantTypeCode::Double,
                1.5f64.to_le_bytes().to_vec(),
                ConstantValue::Double(1.5),
            ),
            (
                ConstantTypeCode::String,
                vec![0x4F, 0x00, 0x4B, 0x00],
                ConstantValue::String(U16String::from_str("OK")),
            ),
            (ConstantTypeCode::NullReference, vec![0; 4], ConstantValue::NullReference),
        ];

        for (code, input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            let value = parser.read_constant(code).unwrap();
            assert_eq!(value, expected);
            assert_eq!(value.type_code(), code);
        }

        let mut parser = Parser::new(&[1, 0, 0, 0]);
        assert!(parser.read_constant(ConstantTypeCode::NullReference).is_err());
    }
}
