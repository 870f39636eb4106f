//! Metadata root header and stream directory.
//!
//! This module defines the [`Root`] struct, which represents the root metadata header and stream
//! directory as specified by ECMA-335. It is the first structure read from a metadata block and
//! locates every stream (`#~`, `#Strings`, `#Blob`, ...) within it.
//!
//! # Example
//!
//! ```rust
//! use cilmeta::metadata::{root::Root, streams::StreamKind};
//! let root = Root::read(&[
//!            0x42, 0x53, 0x4A, 0x42,
//!            0x01, 0x00,
//!            0x01, 0x00,
//!            0x00, 0x00, 0x00, 0x00,
//!            0x04, 0x00, 0x00, 0x00,
//!            b'v', b'4', 0x00, 0x00,
//!            0x00, 0x00,
//!            0x01, 0x00,
//!            0x24, 0x00, 0x00, 0x00, // StreamHeader
//!            0x04, 0x00, 0x00, 0x00,
//!            0x23, 0x7E, 0x00, 0x00,
//!            0x00, 0x00, 0x00, 0x00, // stream content
//!        ])?;
//! assert_eq!(root.version, "v4");
//! assert_eq!(root.stream(StreamKind::Tables).map(|s| s.size), Some(4));
//! # Ok::<(), cilmeta::Error>(())
//! ```
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use log::debug;

use crate::{
    codec::io::{read_le, read_le_at},
    metadata::streams::{StreamHeader, StreamKind},
    Result,
};

/// The MAGIC value indicating the CIL header
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Size of the fields preceding the version string
const VERSION_OFFSET: usize = 16;

/// The header of the present Metadata, providing the version and the stream directory.
///
/// Only streams with a recognized name are kept in [`Root::stream_headers`]; the others are
/// skipped while reading. A recognized name may appear only once.
///
/// ## Reference
/// - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Root {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Number of bytes allocated to hold version string
    pub length: u32,
    /// 'VersionString', without its NUL padding
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// Number of entries in the stream directory, including ignored ones
    pub stream_number: u16,
    /// The recognized streams, in directory order
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Reads a [`Root`] metadata header from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The metadata block, every stream offset is relative to its start
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature does not match, the version string
    /// claims more bytes than remain, a stream lies outside `data`, or a stream name is
    /// repeated. A truncated directory yields [`crate::Error::OutOfBounds`].
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < VERSION_OFFSET {
            return Err(out_of_bounds_error!());
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {:#x}",
                signature
            ));
        }

        let major_version = read_le::<u16>(&data[4..])?;
        let minor_version = read_le::<u16>(&data[6..])?;
        let length = read_le::<u32>(&data[12..])?;

        let remaining = data.len() - VERSION_OFFSET;
        if length as usize > remaining {
            return Err(malformed_error!(
                "Version string length {} exceeds the {} remaining bytes",
                length,
                remaining
            ));
        }

        let raw_version = &data[VERSION_OFFSET..VERSION_OFFSET + length as usize];
        let version_end = raw_version
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(raw_version.len());
        let version = String::from_utf8_lossy(&raw_version[..version_end]).into_owned();

        let mut offset = VERSION_OFFSET + length as usize;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_number = read_le_at::<u16>(data, &mut offset)?;

        let mut stream_headers: Vec<StreamHeader> = Vec::with_capacity(usize::from(stream_number));
        for _ in 0..stream_number {
            let header = StreamHeader::read(data, &mut offset)?;
            let Some(kind) = header.kind() else {
                debug!("Ignoring unknown stream {:?}", header.name);
                continue;
            };
            header.data(data)?;

            if stream_headers.iter().any(|known| known.kind() == Some(kind)) {
                return Err(malformed_error!("Duplicate stream {}", header.name));
            }

            debug!(
                "Stream {} at {:#x}, {:#x} bytes",
                header.name, header.offset, header.size
            );
            stream_headers.push(header);
        }

        let has_tables = stream_headers
            .iter()
            .filter(|header| {
                matches!(
                    header.kind(),
                    Some(StreamKind::Tables | StreamKind::UncompressedTables)
                )
            })
            .count();
        if has_tables > 1 {
            return Err(malformed_error!("Both #~ and #- streams are present"));
        }

        Ok(Root {
            signature,
            major_version,
            minor_version,
            length,
            version,
            flags,
            stream_number,
            stream_headers,
        })
    }

    /// The header of the stream of `kind`, if present
    #[must_use]
    pub fn stream(&self, kind: StreamKind) -> Option<&StreamHeader> {
        self.stream_headers
            .iter()
            .find(|header| header.kind() == Some(kind))
    }

    /// The table stream header, `#~` or `#-`
    #[must_use]
    pub fn tables_stream(&self) -> Option<&StreamHeader> {
        self.stream(StreamKind::Tables)
            .or_else(|| self.stream(StreamKind::UncompressedTables))
    }
}
