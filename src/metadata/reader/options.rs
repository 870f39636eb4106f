//! Construction options of the [`super::MetadataReader`] and its pluggable collaborators.

use std::borrow::Cow;

use bitflags::bitflags;

use crate::{codec::utf8::decode_utf8_lossy, metadata::tables::AssemblyRefRaw};

bitflags! {
    /// Options controlling how a [`super::MetadataReader`] interprets the metadata
    ///
    /// ```rust
    /// use cilmeta::MetadataReaderOptions;
    ///
    /// let options = MetadataReaderOptions::default();
    /// assert_eq!(options, MetadataReaderOptions::NONE);
    /// assert!(!options.contains(MetadataReaderOptions::APPLY_WINDOWS_RUNTIME_PROJECTIONS));
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MetadataReaderOptions: u32 {
        /// Strict ECMA-335, virtual handles are rejected
        const NONE = 0x0;
        /// Resolve virtual handles through the installed [`ProjectionProvider`]
        const APPLY_WINDOWS_RUNTIME_PROJECTIONS = 0x1;
    }
}

/// Decodes `#Strings` entries for [`super::MetadataReader::decode_string`]
///
/// Implementations must not fail; bytes that are not valid for the decoder are replaced.
pub trait MetadataStringDecoder: Send + Sync {
    /// Decode one heap entry, without its terminator
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str>;
}

/// The default decoder: UTF-8, invalid sequences become U+FFFD
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Decoder;

impl MetadataStringDecoder for Utf8Decoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        decode_utf8_lossy(bytes)
    }
}

/// Supplies the entries that virtual handles address
///
/// The projection layer that remaps well-known types lives outside of this crate. It hands out
/// virtual [`crate::metadata::handles::StringHandle`], [`crate::metadata::handles::BlobHandle`]
/// and [`crate::metadata::handles::AssemblyRefHandle`] values, and the reader resolves them
/// through this trait when [`MetadataReaderOptions::APPLY_WINDOWS_RUNTIME_PROJECTIONS`] is set.
pub trait ProjectionProvider: Send + Sync {
    /// The well-known string with virtual index `index`
    fn string(&self, index: u32) -> Option<&'static str>;

    /// The well-known blob with virtual index `index`
    fn blob(&self, index: u32) -> Option<&'static [u8]>;

    /// The projected assembly reference with virtual index `index`
    fn assembly_ref(&self, index: u32) -> Option<AssemblyRefRaw>;
}
