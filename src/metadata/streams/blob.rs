//! The `#Blob` heap.
//!
//! Signatures, marshalling descriptors, custom attribute values and constants live here. Every
//! entry starts with its byte length as a compressed unsigned integer (ECMA-335 II.24.2.4), and
//! tables refer to an entry by the offset of that length prefix.

use crate::{codec::Parser, Result};

/// A view over the `#Blob` heap
///
/// Entries are decoded on access; constructing the view only checks the leading empty entry.
///
/// ```rust
/// use cilmeta::metadata::streams::Blob;
///
/// let heap = Blob::from(&[0x00, 0x03, 0x20, 0x00, 0x01])?;
/// assert_eq!(heap.get(1)?, &[0x20, 0x00, 0x01]);
///
/// let mut signature = heap.reader(1)?;
/// assert_eq!(signature.read_le::<u8>()?, 0x20);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wrap the content of a `#Blob` stream
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `data` does not start with the empty entry
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        match data.first() {
            Some(0) => Ok(Blob { data }),
            _ => Err(malformed_error!(
                "#Blob heap of {} bytes does not start with the empty blob",
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

    /// The content of the entry at `offset`, without its length prefix
    ///
    /// Offset 0 is the empty blob, even for an absent heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` lies past the heap or the entry claims
    /// more bytes than remain, and [`crate::Error::InvalidCompressedInteger`] for an
    /// undecodable length prefix
    pub fn get(&self, offset: usize) -> Result<&'a [u8]> {
        self.entry(offset).map(|(_, content)| content)
    }

    /// A [`Parser`] over the content of the entry at `offset`
    ///
    /// # Errors
    /// Same as [`Blob::get`]
    pub fn reader(&self, offset: usize) -> Result<Parser<'a>> {
        self.get(offset).map(Parser::new)
    }

    /// Prefix length and content of the entry at `offset`
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

        match tail.get(header..header.saturating_add(length)) {
            Some(content) => Ok((header, content)),
            None => Err(out_of_bounds_error!()),
        }
    }

    /// The offset of the entry behind the one at `offset`; `None` at the end of the heap
    /// or if the entry cannot be decoded
    #[must_use]
    pub fn next_offset(&self, offset: usize) -> Option<usize> {
        let (header, content) = self.entry(offset).ok()?;
        let next = offset + header + content.len();
        (next < self.data.len()).then_some(next)
    }

    /// All entries as `(offset, content)`, starting behind the empty entry
    ///
    /// A broken entry is yielded as an error and ends the iteration.
    ///
    /// ```rust
    /// use cilmeta::metadata::streams::Blob;
    ///
    /// let heap = Blob::from(&[0x00, 0x01, 0xAA, 0x02, 0xBB, 0xCC])?;
    /// let offsets = heap
    ///     .iter()
    ///     .map(|entry| entry.map(|(offset, _)| offset))
    ///     .collect::<cilmeta::Result<Vec<_>>>()?;
    /// assert_eq!(offsets, [1, 3]);
    /// # Ok::<(), cilmeta::Error>(())
    /// ```
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator {
            heap: *self,
            offset: 1,
        }
    }
}

impl<'a> IntoIterator for &Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Blob`] heap, see [`Blob::iter`]
pub struct BlobIterator<'a> {
    heap: Blob<'a>,
    offset: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        if offset >= self.heap.len() {
            return None;
        }

        Some(match self.heap.entry(offset) {
            Ok((header, content)) => {
                self.offset += header + content.len();
                Ok((offset, content))
            }
            Err(error) => {
                self.offset = self.heap.len();
                Err(error)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A heap holding `entries`, each written with its compressed length
    fn heap(entries: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![0];
        for entry in entries {
            let length = entry.len() as u32;
            match length {
                0..=0x7F => data.push(length as u8),
                0x80..=0x3FFF => data.extend_from_slice(&(0x8000 | length as u16).to_be_bytes()),
                _ => data.extend_from_slice(&(0xC000_0000 | length).to_be_bytes()),
            }
            data.extend_from_slice(entry);
        }
        data
    }

    #[test]
    fn length_prefixes() {
        let medium = vec![0x5A; 300];
        let large = vec![0xA5; 0x4001];
        let data = heap(&[&[0x01, 0x02], &[], &medium, &large]);
        let blob = Blob::from(&data).unwrap();

        let cases: Vec<(usize, &[u8])> = vec![
            (0, &[]),
            (1, &[0x01, 0x02]),
            (4, &[]),
            (5, &medium),
            (307, &large),
        ];
        for (offset, expected) in cases {
            assert_eq!(blob.get(offset).unwrap(), expected, "offset {offset}");
        }

        assert_eq!(blob.next_offset(1), Some(4));
        assert_eq!(blob.next_offset(5), Some(307));
        assert_eq!(blob.next_offset(307), None);
    }

    #[test]
    fn broken_entries() {
        assert!(Blob::from(&[]).is_err());
        assert!(Blob::from(&[0x01, 0x00]).is_err());

        let truncated = Blob::from(&[0x00, 0x05, 0x41, 0x42]).unwrap();
        assert!(truncated.get(1).is_err());
        assert!(truncated.get(4).is_err());
        assert!(truncated.get(99).is_err());

        let undecodable = Blob::from(&[0x00, 0xFF, 0x00]).unwrap();
        assert!(undecodable.get(1).is_err());
        assert_eq!(undecodable.next_offset(1), None);
    }

    #[test]
    fn iteration() {
        let data = heap(&[b"AB", &[], b"C"]);
        let blob = Blob::from(&data).unwrap();

        let entries: Vec<(usize, &[u8])> = blob.iter().map(Result::unwrap).collect();
        assert_eq!(entries, [(1, &b"AB"[..]), (4, &[][..]), (5, &b"C"[..])]);
        assert_eq!((&blob).into_iter().count(), 3);
    }

    #[test]
    fn iteration_stops_at_broken_entry() {
        let blob = Blob::from(&[0x00, 0x01, 0x41, 0x09, 0x42]).unwrap();
        let mut entries = blob.iter();

        assert_eq!(entries.next().unwrap().unwrap(), (1, &[0x41][..]));
        assert!(entries.next().unwrap().is_err());
        assert!(entries.next().is_none());
    }

    #[test]
    fn signature_reader() {
        let blob = Blob::from(&[0x00, 0x03, 0x20, 0x81, 0x7F]).unwrap();
        let mut reader = blob.reader(1).unwrap();
        assert_eq!(reader.read_le::<u8>().unwrap(), 0x20);
        assert_eq!(reader.read_compressed_uint().unwrap(), 0x017F);
        assert!(!reader.has_more_data());
    }

    #[test]
    fn absent_heap() {
        let blob = Blob::default();
        assert!(blob.is_empty());
        assert!(blob.get(0).unwrap().is_empty());
        assert!(blob.get(1).is_err());
        assert!(blob.iter().next().is_none());
    }
}
