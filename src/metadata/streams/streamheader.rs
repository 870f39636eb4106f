//! Stream Header for .NET Metadata Streams
//!
//! Provides parsing of the stream directory entries, which describe the name, offset and size
//! of each metadata stream.
//!
//! # Reference
//! - [ECMA-335 II.24.2.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{codec::io::read_le_at, Result};

/// Longest stream name including its terminator
const MAX_NAME_LEN: usize = 32;

/// The streams this library understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `#Strings`
    Strings,
    /// `#US`
    UserStrings,
    /// `#Blob`
    Blob,
    /// `#GUID`
    Guid,
    /// `#~`, the optimized table stream
    Tables,
    /// `#-`, the unoptimized table stream used by edit-and-continue
    UncompressedTables,
    /// `#JTD`, marks a minimal delta, its content is empty
    MinimalDelta,
    /// `#Pdb`, the Portable PDB header
    Pdb,
}

impl StreamKind {
    /// Map a stream name to its kind, `None` for names that are not recognized
    #[must_use]
    pub fn from_name(name: &str) -> Option<StreamKind> {
        match name {
            "#Strings" => Some(StreamKind::Strings),
            "#US" => Some(StreamKind::UserStrings),
            "#Blob" => Some(StreamKind::Blob),
            "#GUID" => Some(StreamKind::Guid),
            "#~" => Some(StreamKind::Tables),
            "#-" => Some(StreamKind::UncompressedTables),
            "#JTD" => Some(StreamKind::MinimalDelta),
            "#Pdb" => Some(StreamKind::Pdb),
            _ => None,
        }
    }
}

/// A stream header provides the name, and the position and length of a particular table or
/// heap. The length of a stream header is not fixed, the name is NUL terminated and padded to
/// the next 4 byte boundary.
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.2
///
/// # Examples
///
/// ```rust
/// use cilmeta::metadata::streams::StreamHeader;
///
/// let data = [0x6C, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, b'#', b'~', 0x00, 0x00];
/// let mut offset = 0;
/// let header = StreamHeader::read(&data, &mut offset)?;
/// assert_eq!(header.name, "#~");
/// assert_eq!(offset, 12);
/// # Ok::<(), cilmeta::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of this stream in bytes
    pub size: u32,
    /// Name of the stream, at most 31 ASCII characters
    pub name: String,
}

impl StreamHeader {
    /// Read one directory entry at `offset` and advance past its padded name
    ///
    /// Names that are not recognized are accepted here, see [`StreamHeader::kind`].
    ///
    /// # Arguments
    /// * 'data'    - The metadata block
    /// * 'offset'  - Position of the entry, advanced to the next entry
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the entry is truncated, or
    /// [`crate::Error::Malformed`] if the name is not terminated within 32 bytes or is not ASCII
    pub fn read(data: &[u8], offset: &mut usize) -> Result<StreamHeader> {
        let stream_offset = read_le_at::<u32>(data, offset)?;
        let size = read_le_at::<u32>(data, offset)?;

        let rest = data.get(*offset..).ok_or(out_of_bounds_error!())?;
        let window = &rest[..rest.len().min(MAX_NAME_LEN)];
        let Some(len) = window.iter().position(|&b| b == 0) else {
            return Err(malformed_error!(
                "Stream name at offset {} is not terminated",
                offset
            ));
        };

        let name = &window[..len];
        if !name.is_ascii() {
            return Err(malformed_error!("Stream name at offset {} is not ASCII", offset));
        }

        // name, terminator, then padding to 4
        let padded = (len + 4) & !3;
        if padded > rest.len() {
            return Err(out_of_bounds_error!());
        }
        *offset += padded;

        Ok(StreamHeader {
            offset: stream_offset,
            size,
            name: String::from_utf8_lossy(name).into_owned(),
        })
    }

    /// The kind of stream this header names
    #[must_use]
    pub fn kind(&self) -> Option<StreamKind> {
        StreamKind::from_name(&self.name)
    }

    /// Resolve the stream content within the metadata block `data`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the stream does not lie within `data`
    pub fn data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let start = self.offset as usize;
        start
            .checked_add(self.size as usize)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                malformed_error!(
                    "Stream {} ({:#x}+{:#x}) exceeds the metadata block of {:#x} bytes",
                    self.name,
                    self.offset,
                    self.size,
                    data.len()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
        ];

        let mut offset = 0;
        let parsed_header = StreamHeader::read(&header_bytes, &mut offset).unwrap();

        assert_eq!(parsed_header.offset, 0x6C);
        assert_eq!(parsed_header.size, 0x45A4);
        assert_eq!(parsed_header.name, "#~");
        assert_eq!(parsed_header.kind(), Some(StreamKind::Tables));
        assert_eq!(offset, 12);
    }

    #[test]
    fn padding() {
        let cases = vec![
            ("#~", 4),
            ("#US", 4),
            ("#GUID", 8),
            ("#Blob", 8),
            ("#Strings", 12),
        ];

        for (name, padded) in cases {
            let mut data = vec![0u8; 8];
            data.extend_from_slice(name.as_bytes());
            data.resize(8 + padded, 0);

            let mut offset = 0;
            let header = StreamHeader::read(&data, &mut offset).unwrap();
            assert_eq!(header.name, name);
            assert_eq!(offset, 8 + padded, "{name}");
        }
    }

    #[test]
    fn unknown_name_is_accepted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            0x24, 0x7E, 0x00, 0x00,
        ];

        let mut offset = 0;
        let header = StreamHeader::read(&header_bytes, &mut offset).unwrap();
        assert_eq!(header.name, "$~");
        assert_eq!(header.kind(), None);
    }

    #[test]
    fn unterminated() {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&[b'A'; 40]);

        let mut offset = 0;
        assert!(StreamHeader::read(&data, &mut offset).is_err());

        let mut offset = 0;
        assert!(StreamHeader::read(&[0x00, 0x00, 0x00], &mut offset).is_err());
    }

    #[test]
    fn content_bounds() {
        let header = StreamHeader {
            offset: 4,
            size: 4,
            name: "#GUID".to_string(),
        };
        let block = [0u8; 8];
        assert_eq!(header.data(&block).unwrap().len(), 4);
        assert!(header.data(&block[..7]).is_err());
    }
}
