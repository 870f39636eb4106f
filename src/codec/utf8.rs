//! UTF-16 to UTF-8 transcoding for metadata strings.
//!
//! Strings handed to the writer side come as UTF-16 code units and may contain unpaired
//! surrogates. With `allow_unpaired_surrogates` set such a code unit is written in its
//! three byte form (the generalized UTF-8 used by the runtime), otherwise it is replaced
//! with U+FFFD. Neither mode ever fails.

use std::borrow::Cow;

const REPLACEMENT: u16 = 0xFFFD;

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Walks `units` and hands every encoded code point (as UTF-8 bytes) to `emit`
fn transcode(units: &[u16], allow_unpaired_surrogates: bool, mut emit: impl FnMut(&[u8])) {
    let mut index = 0;
    while index < units.len() {
        let unit = units[index];
        index += 1;

        if unit < 0x80 {
            #[allow(clippy::cast_possible_truncation)]
            emit(&[unit as u8]);
            continue;
        }

        if unit < 0x800 {
            #[allow(clippy::cast_possible_truncation)]
            emit(&[0xC0 | (unit >> 6) as u8, 0x80 | (unit & 0x3F) as u8]);
            continue;
        }

        let mut single = unit;
        if is_high_surrogate(unit) && index < units.len() && is_low_surrogate(units[index]) {
            let code_point = 0x10000
                + ((u32::from(unit) - 0xD800) << 10)
                + (u32::from(units[index]) - 0xDC00);
            index += 1;

            #[allow(clippy::cast_possible_truncation)]
            emit(&[
                0xF0 | (code_point >> 18) as u8,
                0x80 | ((code_point >> 12) & 0x3F) as u8,
                0x80 | ((code_point >> 6) & 0x3F) as u8,
                0x80 | (code_point & 0x3F) as u8,
            ]);
            continue;
        }

        if (is_high_surrogate(unit) || is_low_surrogate(unit)) && !allow_unpaired_surrogates {
            single = REPLACEMENT;
        }

        #[allow(clippy::cast_possible_truncation)]
        emit(&[
            0xE0 | (single >> 12) as u8,
            0x80 | ((single >> 6) & 0x3F) as u8,
            0x80 | (single & 0x3F) as u8,
        ]);
    }
}

/// Number of bytes the UTF-8 form of `units` occupies
///
/// The result is the same for both surrogate modes, a replacement character and an
/// unpaired surrogate are both three bytes long.
#[must_use]
pub fn utf8_len_of_utf16(units: &[u16]) -> usize {
    let mut len = 0;
    transcode(units, true, |bytes| len += bytes.len());
    len
}

/// Append the UTF-8 form of `units` to `out`
///
/// # Arguments
/// * `units`                       - UTF-16 code units, possibly containing unpaired surrogates
/// * `allow_unpaired_surrogates`   - Keep unpaired surrogates instead of replacing them with U+FFFD
/// * `out`                         - The buffer receiving the encoded bytes
pub fn encode_utf16_as_utf8(units: &[u16], allow_unpaired_surrogates: bool, out: &mut Vec<u8>) {
    transcode(units, allow_unpaired_surrogates, |bytes| {
        out.extend_from_slice(bytes);
    });
}

/// Decode `bytes` as UTF-8, replacing invalid sequences with U+FFFD
///
/// Borrows when the input is valid, which is the common case for metadata.
#[must_use]
pub fn decode_utf8_lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
