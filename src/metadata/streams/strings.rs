//! The `#Strings` heap.
//!
//! Identifiers (type, member, namespace and file names) stored as zero terminated UTF-8
//! (ECMA-335 II.24.2.3). Tables address an entry by its byte offset, and an offset may point
//! into the middle of another entry to share its suffix.

use std::borrow::Cow;

use crate::{metadata::reader::MetadataStringDecoder, Result};

/// A view over the `#Strings` heap
///
/// Only the entry that is asked for gets validated. The comparison helpers work on the stored
/// bytes and do not allocate for ASCII input.
///
/// ```rust
/// use cilmeta::metadata::streams::Strings;
///
/// let heap = Strings::from(b"\0Dictionary`2\0")?;
/// assert_eq!(heap.get(1)?, "Dictionary`2");
/// assert!(heap.equals(1, "DICTIONARY`2", true)?);
/// assert!(heap.starts_with(1, "Dict", false)?);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wrap the content of a `#Strings` stream
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] unless `data` starts with the empty string
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        match data.first() {
            Some(0) => Ok(Strings { data }),
            _ => Err(malformed_error!(
                "#Strings heap of {} bytes does not start with the empty string",
                data.len()
            )),
        }
    }

    /// Size of the heap in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a heap without content, used when the stream is absent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The stored bytes of the entry at `offset`, terminator excluded
    ///
    /// Offset 0 is the empty string, even for an absent heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an offset past the heap and
    /// [`crate::Error::Malformed`] for an entry running into the end of the heap
    pub fn get_bytes(&self, offset: usize) -> Result<&'a [u8]> {
        if offset == 0 && self.data.is_empty() {
            return Ok(&[]);
        }

        let Some(tail) = self.data.get(offset..) else {
            return Err(out_of_bounds_error!());
        };

        let Some(end) = tail.iter().position(|&byte| byte == 0) else {
            return Err(malformed_error!("#Strings entry at {} has no terminator", offset));
        };
        Ok(&tail[..end])
    }

    /// The entry at `offset` as `&str`
    ///
    /// # Errors
    /// Same as [`Strings::get_bytes`], plus [`crate::Error::Malformed`] when the entry is not
    /// valid UTF-8
    pub fn get(&self, offset: usize) -> Result<&'a str> {
        let bytes = self.get_bytes(offset)?;
        std::str::from_utf8(bytes)
            .map_err(|_| malformed_error!("#Strings entry at {} is not UTF-8", offset))
    }

    /// The entry at `offset` run through `decoder`
    ///
    /// # Errors
    /// Same as [`Strings::get_bytes`]
    pub fn decode(
        &self,
        offset: usize,
        decoder: &dyn MetadataStringDecoder,
    ) -> Result<Cow<'a, str>> {
        Ok(decoder.decode(self.get_bytes(offset)?))
    }

    /// Returns `true` if the entry at `offset` is `text`
    ///
    /// # Errors
    /// Same as [`Strings::get_bytes`]
    pub fn equals(&self, offset: usize, text: &str, ignore_case: bool) -> Result<bool> {
        let stored = self.get_bytes(offset)?;
        Ok(match ignore_case {
            false => stored == text.as_bytes(),
            true if stored.is_ascii() && text.is_ascii() => {
                stored.eq_ignore_ascii_case(text.as_bytes())
            }
            true => fold(&String::from_utf8_lossy(stored)).eq(fold(text)),
        })
    }

    /// Returns `true` if the entry at `offset` begins with `prefix`
    ///
    /// # Errors
    /// Same as [`Strings::get_bytes`]
    pub fn starts_with(&self, offset: usize, prefix: &str, ignore_case: bool) -> Result<bool> {
        let stored = self.get_bytes(offset)?;
        if !ignore_case {
            return Ok(stored.starts_with(prefix.as_bytes()));
        }

        if stored.is_ascii() && prefix.is_ascii() {
            return Ok(stored
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes())));
        }

        let lossy = String::from_utf8_lossy(stored);
        let mut chars = fold(&lossy);
        Ok(fold(prefix).all(|wanted| chars.next() == Some(wanted)))
    }

    /// Offset of the entry behind the one at `offset`, `None` past the last entry
    #[must_use]
    pub fn next_offset(&self, offset: usize) -> Option<usize> {
        let length = self.data.get(offset..)?.iter().position(|&byte| byte == 0)?;
        let next = offset + length + 1;
        (next < self.data.len()).then_some(next)
    }

    /// All entries as `(offset, text)`, starting behind the empty string
    #[must_use]
    pub fn iter(&self) -> StringsIterator<'a> {
        StringsIterator {
            heap: *self,
            offset: 1,
        }
    }
}

fn fold(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(char::to_lowercase)
}

impl<'a> IntoIterator for &Strings<'a> {
    type Item = Result<(usize, &'a str)>;
    type IntoIter = StringsIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Strings`] heap, see [`Strings::iter`]
pub struct StringsIterator<'a> {
    heap: Strings<'a>,
    offset: usize,
}

impl<'a> Iterator for StringsIterator<'a> {
    type Item = Result<(usize, &'a str)>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        if offset >= self.heap.len() {
            return None;
        }

        match self.heap.get_bytes(offset) {
            Ok(bytes) => {
                self.offset += bytes.len() + 1;
                Some(self.heap.get(offset).map(|text| (offset, text)))
            }
            Err(error) => {
                self.offset = self.heap.len();
                Some(Err(error))
            }
        }
    }
}
