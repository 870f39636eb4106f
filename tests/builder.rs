//! Integration tests of the chunked builder and the bounded writer.

use std::sync::Arc;

use widestring::U16String;

use cilmeta::{
    blob::{BlobBuilder, BlobWrite, BlobWriter, ChunkPool},
    codec::ConstantValue,
    Error, Result,
};

#[test]
fn writer_overflow() -> Result<()> {
    let mut builder = BlobBuilder::new();
    builder.write_u8(0xAA)?;
    let size = builder.reserve_bytes(4)?;
    builder.write_u8(0xBB)?;

    let mut writer = builder.blob_writer(&size)?;
    writer.write_u32(0x1234_5678)?;
    let error = writer.write_u8(0).unwrap_err();
    assert!(matches!(
        error,
        Error::WriterOutOfBounds {
            requested: 1,
            available: 0
        }
    ));
    assert!(error.is_usage_error());

    assert_eq!(builder.to_vec(), [0xAA, 0x78, 0x56, 0x34, 0x12, 0xBB]);
    Ok(())
}

#[test]
fn linking_preserves_content() -> Result<()> {
    let mut header = BlobBuilder::with_capacity(16);
    header.write_utf8("HEAD")?;

    let mut body = BlobBuilder::with_capacity(16);
    for value in 0u32..32 {
        body.write_compressed_integer(value * 100)?;
    }

    let mut trailer = BlobBuilder::with_capacity(16);
    trailer.write_user_string("tail")?;

    let mut expected = BlobBuilder::with_capacity(4096);
    expected.write_utf8("HEAD")?;
    for value in 0u32..32 {
        expected.write_compressed_integer(value * 100)?;
    }
    expected.write_user_string("tail")?;

    body.link_prefix(header);
    body.link_suffix(trailer);

    assert_eq!(body.count(), expected.count());
    assert!(body.chunks().count() > expected.chunks().count());
    assert!(body.content_equals(&expected));
    assert_eq!(body.to_vec(), expected.to_vec());
    Ok(())
}

#[test]
fn materialization_paths_agree() -> Result<()> {
    let mut builder = BlobBuilder::with_capacity(16);
    builder.write_constant(&ConstantValue::String(U16String::from_str("constant")))?;
    builder.write_serialized_string(Some("serialized"))?;
    builder.write_serialized_string(None)?;
    builder.align(8)?;

    let mut streamed = Vec::new();
    builder.write_content_to(&mut streamed)?;
    assert_eq!(streamed, builder.to_vec());

    let mut copy = BlobBuilder::new();
    builder.write_content_to_builder(&mut copy)?;
    assert!(copy.content_equals(&builder));

    let mut buffer = vec![0u8; builder.count()];
    let mut writer = BlobWriter::new(&mut buffer);
    builder.write_content_to_writer(&mut writer)?;
    assert_eq!(writer.remaining(), 0);
    assert_eq!(buffer, streamed);

    let mut small = [0u8; 4];
    let mut writer = BlobWriter::new(&mut small);
    assert!(builder.write_content_to_writer(&mut writer).is_err());
    assert_eq!(writer.offset(), 0);

    assert_eq!(builder.to_vec_range(2, 4)?, streamed[2..6]);
    assert!(builder.to_vec_range(builder.count(), 1).is_err());
    Ok(())
}

#[test]
fn pooled_builders_return_their_chunks() -> Result<()> {
    let pool = Arc::new(ChunkPool::new(32));
    {
        let mut first = BlobBuilder::with_pool(pool.clone());
        first.write_bytes_repeated(0x11, 100)?;
        let mut second = BlobBuilder::with_pool(pool.clone());
        second.write_bytes_repeated(0x22, 10)?;
        first.link_suffix(second);
        assert_eq!(first.count(), 110);
    }
    assert!(pool.available()? >= 5);

    let mut reused = BlobBuilder::with_pool(pool.clone());
    reused.write_u64(u64::MAX)?;
    assert_eq!(reused.to_vec(), [0xFF; 8]);
    reused.free()?;
    Ok(())
}
