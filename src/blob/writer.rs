use crate::{blob::BlobWrite, Error, Result};

/// A cursor over a fixed region of bytes
///
/// Writes advance the cursor and never grow the region: a write that does not fit fails with
/// [`Error::WriterOutOfBounds`] and leaves the writer unchanged. Typically obtained from
/// [`super::BlobBuilder::blob_writer`] to fill in a reserved [`super::Blob`].
///
/// ```rust
/// use cilmeta::blob::{BlobWrite, BlobWriter};
///
/// let mut buffer = [0u8; 4];
/// let mut writer = BlobWriter::new(&mut buffer);
/// writer.write_u16(0x1234)?;
/// assert_eq!(writer.remaining(), 2);
/// assert!(writer.write_u32(0).is_err());
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Debug)]
pub struct BlobWriter<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> BlobWriter<'a> {
    /// Create a writer over `data`, starting at offset 0
    pub fn new(data: &'a mut [u8]) -> Self {
        BlobWriter { data, position: 0 }
    }

    /// The current write offset
    #[must_use]
    pub fn offset(&self) -> usize {
        self.position
    }

    /// Move the write offset, `offset` may equal [`BlobWriter::length`]
    ///
    /// # Errors
    /// Returns [`Error::WriterOutOfBounds`] if `offset` lies past the region
    pub fn set_offset(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::WriterOutOfBounds {
                requested: offset,
                available: self.data.len(),
            });
        }
        self.position = offset;
        Ok(())
    }

    /// Size of the region
    #[must_use]
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Bytes left behind the write offset
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// The bytes before the write offset
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.data[..self.position]
    }

    /// Zero the region and rewind to offset 0
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.position = 0;
    }

    /// Copy the whole region
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Returns `true` if both regions hold the same bytes
    #[must_use]
    pub fn content_equals(&self, other: &BlobWriter<'_>) -> bool {
        *self.data == *other.data
    }
}

impl BlobWrite for BlobWriter<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let available = self.remaining();
        if bytes.len() > available {
            return Err(Error::WriterOutOfBounds {
                requested: bytes.len(),
                available,
            });
        }

        let end = self.position + bytes.len();
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    fn position(&self) -> usize {
        self.position
    }

    fn ensure_available(&mut self, len: usize) -> Result<()> {
        let available = self.remaining();
        if len > available {
            return Err(Error::WriterOutOfBounds {
                requested: len,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use widestring::U16String;

    use super::*;
    use crate::codec::ConstantValue;

    #[test]
    fn bounded() {
        let mut buffer = [0xAAu8; 6];
        let mut writer = BlobWriter::new(&mut buffer);

        writer.write_u32(0x0403_0201).unwrap();
        assert_eq!(writer.offset(), 4);
        assert_eq!(writer.remaining(), 2);

        assert!(matches!(
            writer.write_bytes(&[1, 2, 3]),
            Err(Error::WriterOutOfBounds {
                requested: 3,
                available: 2
            })
        ));
        assert_eq!(writer.offset(), 4);
        assert_eq!(writer.written(), &[1, 2, 3, 4]);

        writer.write_u16(0x0605).unwrap();
        assert_eq!(writer.remaining(), 0);
        assert!(writer.write_u8(0).unwrap_err().is_usage_error());
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn offsets() {
        let mut buffer = [0u8; 4];
        let mut writer = BlobWriter::new(&mut buffer);

        writer.set_offset(2).unwrap();
        writer.write_u8(0xFF).unwrap();
        writer.set_offset(4).unwrap();
        assert!(writer.set_offset(5).is_err());
        assert_eq!(writer.to_vec(), vec![0, 0, 0xFF, 0]);
        assert_eq!(writer.length(), 4);

        writer.clear();
        assert_eq!(writer.offset(), 0);
        assert_eq!(writer.to_vec(), vec![0; 4]);
    }

    #[test]
    fn equality() {
        let mut left = [0u8; 3];
        let mut right = [0u8; 3];
        let mut a = BlobWriter::new(&mut left);
        let mut b = BlobWriter::new(&mut right);

        a.write_utf8("abc").unwrap();
        b.write_u8(b'a').unwrap();
        assert!(!a.content_equals(&b));
        b.write_utf8("bc").unwrap();
        assert!(a.content_equals(&b));
    }

    #[test]
    fn composite_writes_fail_whole() {
        let mut buffer = [0xEEu8; 3];
        let mut writer = BlobWriter::new(&mut buffer);

        assert!(matches!(
            writer.write_serialized_string(Some("abcdef")),
            Err(Error::WriterOutOfBounds {
                requested: 7,
                available: 3
            })
        ));
        assert!(writer.write_user_string("abc").is_err());
        assert!(writer
            .write_constant(&ConstantValue::String(U16String::from_str("xy")))
            .is_err());
        assert!(writer.write_bytes_repeated(0, 100).is_err());
        assert!(writer.pad_to(4).is_err());
        assert_eq!(writer.offset(), 0);
        assert_eq!(writer.to_vec(), vec![0xEE; 3]);

        writer.write_serialized_string(Some("ab")).unwrap();
        assert_eq!(writer.offset(), 3);
        assert_eq!(writer.written(), &[0x02, b'a', b'b']);
    }

    #[test]
    fn aligned_writes() {
        let mut buffer = [0xEEu8; 8];
        let mut writer = BlobWriter::new(&mut buffer);
        writer.write_u8(1).unwrap();
        writer.align(4).unwrap();
        assert_eq!(writer.offset(), 4);
        assert!(writer.pad_to(9).is_err());
        assert_eq!(writer.written(), &[1, 0, 0, 0]);
    }
}
