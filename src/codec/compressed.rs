//! ECMA-335 compressed integers (II.23.2).
//!
//! Unsigned values use one, two or four big-endian bytes, selected by magnitude:
//!
//! | Range                     | Encoding                          |
//! |---------------------------|-----------------------------------|
//! | `0x00..=0x7F`             | `0xxxxxxx`                        |
//! | `0x80..=0x3FFF`           | `10xxxxxx xxxxxxxx`               |
//! | `0x4000..=0x1FFF_FFFF`    | `110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx` |
//!
//! Signed values are rotated left by one bit with the sign in bit zero, so that the value
//! fits the 6, 13 or 28 significant bits of the matching unsigned size class.

use crate::{Error, Result};

/// Largest value that can be stored as a compressed unsigned integer
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;
/// Smallest value that can be stored as a compressed signed integer
pub const MIN_COMPRESSED_INT: i32 = -0x1000_0000;
/// Largest value that can be stored as a compressed signed integer
pub const MAX_COMPRESSED_INT: i32 = 0x0FFF_FFFF;

const ONE_BYTE_MAX: u32 = 0x7F;
const TWO_BYTE_MAX: u32 = 0x3FFF;

const B6: i32 = (1 << 6) - 1;
const B13: i32 = (1 << 13) - 1;
const B28: i32 = (1 << 28) - 1;

/// Number of bytes `value` occupies as a compressed unsigned integer
///
/// # Errors
/// Returns [`Error::InvalidCompressedInteger`] if `value` exceeds [`MAX_COMPRESSED_UINT`]
pub fn compressed_uint_size(value: u32) -> Result<usize> {
    match value {
        0..=ONE_BYTE_MAX => Ok(1),
        0x80..=TWO_BYTE_MAX => Ok(2),
        0x4000..=MAX_COMPRESSED_UINT => Ok(4),
        _ => Err(Error::InvalidCompressedInteger(i64::from(value))),
    }
}

/// Number of bytes `value` occupies as a compressed signed integer
///
/// # Errors
/// Returns [`Error::InvalidCompressedInteger`] if `value` needs more than 29 bits
pub fn compressed_int_size(value: i32) -> Result<usize> {
    let sign_mask = value >> 31;
    if (value & !B6) == (sign_mask & !B6) {
        Ok(1)
    } else if (value & !B13) == (sign_mask & !B13) {
        Ok(2)
    } else if (value & !B28) == (sign_mask & !B28) {
        Ok(4)
    } else {
        Err(Error::InvalidCompressedInteger(i64::from(value)))
    }
}

/// Encode `value` as a compressed unsigned integer into `out`, returning the used length
///
/// Always selects the smallest encoding that can hold the value.
///
/// # Errors
/// Returns [`Error::InvalidCompressedInteger`] if `value` exceeds [`MAX_COMPRESSED_UINT`]
pub fn encode_compressed_uint(value: u32, out: &mut [u8; 4]) -> Result<usize> {
    let size = compressed_uint_size(value)?;
    match size {
        1 => {
            #[allow(clippy::cast_possible_truncation)]
            {
                out[0] = value as u8;
            }
        }
        2 => {
            #[allow(clippy::cast_possible_truncation)]
            let encoded = (0x8000 | value) as u16;
            out[..2].copy_from_slice(&encoded.to_be_bytes());
        }
        _ => out.copy_from_slice(&(0xC000_0000 | value).to_be_bytes()),
    }

    Ok(size)
}

/// Encode `value` as a compressed signed integer into `out`, returning the used length
///
/// # Errors
/// Returns [`Error::InvalidCompressedInteger`] if `value` is outside of
/// [`MIN_COMPRESSED_INT`]`..=`[`MAX_COMPRESSED_INT`]
pub fn encode_compressed_int(value: i32, out: &mut [u8; 4]) -> Result<usize> {
    let sign = value >> 31;
    let size = compressed_int_size(value)?;

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    match size {
        1 => out[0] = (((value & B6) << 1) | (sign & 1)) as u8,
        2 => {
            let encoded = (0x8000 | ((value & B13) << 1) | (sign & 1)) as u16;
            out[..2].copy_from_slice(&encoded.to_be_bytes());
        }
        _ => {
            let encoded = 0xC000_0000 | ((((value & B28) << 1) | (sign & 1)) as u32);
            out.copy_from_slice(&encoded.to_be_bytes());
        }
    }

    Ok(size)
}

/// Decode a compressed unsigned integer from the start of `data`
///
/// Returns the value and the number of consumed bytes.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if `data` is too short, or
/// [`Error::InvalidCompressedInteger`] if the first byte is not a valid lead byte (`111xxxxx`)
pub fn decode_compressed_uint(data: &[u8]) -> Result<(u32, usize)> {
    let Some(&first) = data.first() else {
        return Err(out_of_bounds_error!());
    };

    if first & 0x80 == 0 {
        return Ok((u32::from(first), 1));
    }

    if first & 0xC0 == 0x80 {
        if data.len() < 2 {
            return Err(out_of_bounds_error!());
        }
        let value = (u32::from(first & 0x3F) << 8) | u32::from(data[1]);
        return Ok((value, 2));
    }

    if first & 0xE0 == 0xC0 {
        if data.len() < 4 {
            return Err(out_of_bounds_error!());
        }
        let value = (u32::from(first & 0x1F) << 24)
            | (u32::from(data[1]) << 16)
            | (u32::from(data[2]) << 8)
            | u32::from(data[3]);
        return Ok((value, 4));
    }

    Err(Error::InvalidCompressedInteger(i64::from(first)))
}

/// Decode a compressed signed integer from the start of `data`
///
/// Returns the value and the number of consumed bytes.
///
/// # Errors
/// Same as [`decode_compressed_uint`]
pub fn decode_compressed_int(data: &[u8]) -> Result<(i32, usize)> {
    let (raw, size) = decode_compressed_uint(data)?;

    #[allow(clippy::cast_possible_wrap)]
    let mut value = (raw >> 1) as i32;
    if raw & 1 != 0 {
        value |= match size {
            1 => !(B6),
            2 => !(B13),
            _ => !(B28),
        };
    }

    Ok((value, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u32) -> Vec<u8> {
        let mut out = [0u8; 4];
        let len = encode_compressed_uint(value, &mut out).unwrap();
        out[..len].to_vec()
    }

    fn encode_signed(value: i32) -> Vec<u8> {
        let mut out = [0u8; 4];
        let len = encode_compressed_int(value, &mut out).unwrap();
        out[..len].to_vec()
    }

    #[test]
    fn unsigned_samples() {
        // ECMA-335 II.23.2
        let test_cases = vec![
            (0x03, vec![0x03]),
            (0x7F, vec![0x7F]),
            (0x80, vec![0x80, 0x80]),
            (0x2E57, vec![0xAE, 0x57]),
            (0x3FFF, vec![0xBF, 0xFF]),
            (0x4000, vec![0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, vec![0xDF, 0xFF, 0xFF, 0xFF]),
        ];

        for (value, expected) in test_cases {
            assert_eq!(encode(value), expected, "encoding {value:#x}");
            assert_eq!(
                decode_compressed_uint(&expected).unwrap(),
                (value, expected.len())
            );
        }
    }

    #[test]
    fn signed_samples() {
        // ECMA-335 II.23.2
        let test_cases = vec![
            (3, vec![0x06]),
            (-3, vec![0x7B]),
            (64, vec![0x80, 0x80]),
            (-64, vec![0x01]),
            (8192, vec![0xC0, 0x00, 0x40, 0x00]),
            (-8192, vec![0x80, 0x01]),
            (268_435_455, vec![0xDF, 0xFF, 0xFF, 0xFE]),
            (-268_435_456, vec![0xC0, 0x00, 0x00, 0x01]),
        ];

        for (value, expected) in test_cases {
            assert_eq!(encode_signed(value), expected, "encoding {value}");
            assert_eq!(
                decode_compressed_int(&expected).unwrap(),
                (value, expected.len())
            );
        }
    }

    #[test]
    fn smallest_width_is_chosen() {
        for (value, size) in [(0, 1), (0x7F, 1), (0x80, 2), (0x3FFF, 2), (0x4000, 4)] {
            assert_eq!(compressed_uint_size(value).unwrap(), size);
        }
        for (value, size) in [(-64, 1), (63, 1), (64, 2), (-65, 2), (-8192, 2), (8191, 2), (8192, 4)] {
            assert_eq!(compressed_int_size(value).unwrap(), size, "{value}");
        }
    }

    #[test]
    fn unsigned_boundaries_round_trip() {
        let mut value = 0u32;
        while value <= MAX_COMPRESSED_UINT {
            for candidate in [value.saturating_sub(1), value, value + 1] {
                if candidate > MAX_COMPRESSED_UINT {
                    continue;
                }
                let encoded = encode(candidate);
                assert_eq!(decode_compressed_uint(&encoded).unwrap().0, candidate);
            }
            value = value * 2 + 1;
        }
    }

    #[test]
    fn signed_boundaries_round_trip() {
        let mut magnitude = 1i32;
        while magnitude <= MAX_COMPRESSED_INT {
            for candidate in [magnitude - 1, magnitude, -magnitude, -magnitude - 1] {
                if !(MIN_COMPRESSED_INT..=MAX_COMPRESSED_INT).contains(&candidate) {
                    continue;
                }
                let encoded = encode_signed(candidate);
                assert_eq!(decode_compressed_int(&encoded).unwrap().0, candidate, "{candidate}");
            }
            magnitude = magnitude * 2 + 1;
        }
    }

    #[test]
    fn out_of_range() {
        let mut out = [0u8; 4];
        assert!(matches!(
            encode_compressed_uint(0x2000_0000, &mut out),
            Err(Error::InvalidCompressedInteger(0x2000_0000))
        ));
        assert!(matches!(
            encode_compressed_int(MAX_COMPRESSED_INT + 1, &mut out),
            Err(Error::InvalidCompressedInteger(_))
        ));
        assert!(matches!(
            encode_compressed_int(MIN_COMPRESSED_INT - 1, &mut out),
            Err(Error::InvalidCompressedInteger(_))
        ));
    }

    #[test]
    fn invalid_input() {
        assert!(matches!(
            decode_compressed_uint(&[0xE0, 0, 0, 0]),
            Err(Error::InvalidCompressedInteger(0xE0))
        ));
        assert!(matches!(decode_compressed_uint(&[]), Err(Error::OutOfBounds)));
        assert!(matches!(
            decode_compressed_uint(&[0x80]),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            decode_compressed_uint(&[0xC0, 0x00, 0x00]),
            Err(Error::OutOfBounds)
        ));
    }
}
