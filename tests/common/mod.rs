//! Metadata blocks laid out with the public [`BlobBuilder`], shared by the integration tests.

#![allow(dead_code)]

use cilmeta::{
    blob::{BlobBuilder, BlobWrite},
    metadata::{root::CIL_HEADER_MAGIC, tables::TableId},
    Result,
};

/// Lay out the root header, the stream directory and `streams` in directory order
///
/// Every stream is padded to a multiple of 4 bytes.
pub fn metadata_block(version: &str, streams: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let version_length = (version.len() + 4) & !3;

    let mut root = BlobBuilder::new();
    root.write_u32(CIL_HEADER_MAGIC)?;
    root.write_u16(1)?;
    root.write_u16(1)?;
    root.write_u32(0)?;
    root.write_u32(version_length as u32)?;
    root.write_utf8(version)?;
    root.write_bytes_repeated(0, version_length - version.len())?;
    root.write_u16(0)?;
    root.write_u16(streams.len() as u16)?;

    let directory: usize = streams
        .iter()
        .map(|(name, _)| 8 + ((name.len() + 4) & !3))
        .sum();

    let mut offset = root.count() + directory;
    let mut content = BlobBuilder::new();
    for (name, data) in streams {
        let size = (data.len() + 3) & !3;
        root.write_u32(offset as u32)?;
        root.write_u32(size as u32)?;
        root.write_utf8(name)?;
        root.write_u8(0)?;
        root.align(4)?;

        content.write_bytes(data)?;
        content.align(4)?;
        offset += size;
    }

    root.link_suffix(content);
    Ok(root.to_vec())
}

/// A `#~` stream holding `tables` in ascending table order, none of them declared sorted
///
/// Each entry is the table, its row count and the encoded rows.
pub fn tables_stream(heap_sizes: u8, tables: &[(TableId, u32, &[u8])]) -> Result<Vec<u8>> {
    let valid = tables
        .iter()
        .fold(0u64, |mask, (table, _, _)| mask | table.mask());

    let mut stream = BlobBuilder::new();
    stream.write_u32(0)?;
    stream.write_u8(2)?;
    stream.write_u8(0)?;
    stream.write_u8(heap_sizes)?;
    stream.write_u8(1)?;
    stream.write_u64(valid)?;
    stream.write_u64(0)?;
    for (_, rows, _) in tables {
        stream.write_u32(*rows)?;
    }
    for (_, _, data) in tables {
        stream.write_bytes(data)?;
    }
    Ok(stream.to_vec())
}

/// A `#Strings` heap holding `values` after the empty entry
pub fn strings_heap(values: &[&str]) -> Result<Vec<u8>> {
    let mut heap = BlobBuilder::new();
    heap.write_u8(0)?;
    for value in values {
        heap.write_utf8(value)?;
        heap.write_u8(0)?;
    }
    Ok(heap.to_vec())
}

/// The header of the first stream named `name`, as `(offset, size)`
pub fn stream_location(block: &[u8], name: &str) -> Option<(usize, usize)> {
    let reader = cilmeta::MetadataReader::new(block).ok()?;
    reader
        .root()
        .stream_headers
        .iter()
        .find(|header| header.name == name)
        .map(|header| (header.offset as usize, header.size as usize))
}
