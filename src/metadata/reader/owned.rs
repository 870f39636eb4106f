use ouroboros::self_referencing;

use crate::{
    metadata::reader::{MetadataReader, MetadataReaderOptions},
    Result,
};

#[self_referencing]
/// A [`MetadataReader`] together with the buffer it borrows
///
/// For callers that read the metadata block into memory and cannot keep the buffer alive
/// next to the reader themselves.
///
/// ```rust,no_run
/// use cilmeta::OwnedMetadata;
///
/// # fn example(block: Vec<u8>) -> cilmeta::Result<()> {
/// let metadata = OwnedMetadata::from_vec(block)?;
/// let reader = metadata.reader();
/// println!("{} type definitions", reader.type_definitions().len());
/// # Ok(())
/// # }
/// ```
pub struct OwnedMetadata {
    /// The metadata block
    data: Vec<u8>,

    #[borrows(data)]
    #[covariant]
    /// The reader over `data`
    reader: MetadataReader<'this>,
}

impl OwnedMetadata {
    /// Take ownership of `data` and read it with [`MetadataReaderOptions::NONE`]
    ///
    /// # Errors
    /// See [`MetadataReader::with_options`]
    pub fn from_vec(data: Vec<u8>) -> Result<Self> {
        Self::from_vec_with_options(data, MetadataReaderOptions::NONE)
    }

    /// Take ownership of `data` and read it with `options`
    ///
    /// # Errors
    /// See [`MetadataReader::with_options`]
    pub fn from_vec_with_options(data: Vec<u8>, options: MetadataReaderOptions) -> Result<Self> {
        OwnedMetadata::try_new(data, |data| MetadataReader::with_options(data, options))
    }

    /// The reader over the owned buffer
    #[must_use]
    pub fn reader(&self) -> &MetadataReader<'_> {
        self.borrow_reader()
    }

    /// The owned buffer
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.borrow_data()
    }

    /// Give the buffer back, dropping the reader
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.into_heads().data
    }
}
