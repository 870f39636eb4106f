//! The `#US` heap.
//!
//! String literals loaded by `ldstr` (ECMA-335 II.24.2.4). An entry is a compressed byte
//! count followed by UTF-16LE code units and one flag byte.

use widestring::U16String;

use crate::{codec::Parser, Result};

/// A view over the `#US` heap
///
/// Code units are returned as stored, unpaired surrogates included. The flag byte is not
/// interpreted.
///
/// ```rust
/// use cilmeta::metadata::streams::UserStrings;
///
/// let heap = UserStrings::from(&[0x00, 0x05, b'o', 0x00, b'k', 0x00, 0x00])?;
/// assert_eq!(heap.get_string(1)?, "ok");
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Wrap the content of a `#US` stream
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] unless `data` starts with the empty entry
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        match data.first() {
            Some(0) => Ok(UserStrings { data }),
            _ => Err(malformed_error!(
                "#US heap of {} bytes does not start with the empty entry",
                data.len()
            )),
        }
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a heap without content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Prefix length and stored bytes (code units and flag) of the entry at `offset`
    fn entry(&self, offset: usize) -> Result<(usize, &'a [u8])> {
        if offset == 0 && self.data.is_empty() {
            return Ok((0, &[]));
        }

        let Some(tail) = self.data.get(offset..).filter(|tail| !tail.is_empty()) else {
            return Err(out_of_bounds_error!());
        };

        let mut prefix = Parser::new(tail);
        let length = prefix.read_compressed_uint()? as usize;
        let header = prefix.pos();
        Ok((header, prefix.read_bytes(length)?))
    }

    /// The code units of the entry at `offset`
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an offset past the heap or an entry longer
    /// than the heap
    pub fn get(&self, offset: usize) -> Result<U16String> {
        let (_, stored) = self.entry(offset)?;
        // some producers omit the flag byte of the empty literal
        let units = stored.len() & !1;
        Parser::new(&stored[..units]).read_utf16(units)
    }

    /// The entry at `offset` as UTF-8, unpaired surrogates become U+FFFD
    ///
    /// # Errors
    /// Same as [`UserStrings::get`]
    pub fn get_string(&self, offset: usize) -> Result<String> {
        Ok(self.get(offset)?.to_string_lossy())
    }

    /// Offset of the entry behind the one at `offset`, `None` past the last entry
    #[must_use]
    pub fn next_offset(&self, offset: usize) -> Option<usize> {
        let (header, stored) = self.entry(offset).ok()?;
        let next = offset + header + stored.len();
        (next < self.data.len()).then_some(next)
    }

    /// All entries as `(offset, units)`; zero padding between and after entries is skipped
    #[must_use]
    pub fn iter(&self) -> UserStringsIterator<'a> {
        UserStringsIterator {
            heap: *self,
            offset: 1,
        }
    }
}

/// Iterator over the entries of a [`UserStrings`] heap, see [`UserStrings::iter`]
pub struct UserStringsIterator<'a> {
    heap: UserStrings<'a>,
    offset: usize,
}

impl Iterator for UserStringsIterator<'_> {
    type Item = Result<(usize, U16String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.heap.data;
        self.offset += data
            .get(self.offset..)?
            .iter()
            .take_while(|&&byte| byte == 0)
            .count();

        let offset = self.offset;
        if offset >= data.len() {
            return None;
        }

        match self.heap.entry(offset) {
            Ok((header, stored)) => {
                self.offset += header + stored.len();
                Some(self.heap.get(offset).map(|units| (offset, units)))
            }
            Err(error) => {
                self.offset = data.len();
                Some(Err(error))
            }
        }
    }
}
