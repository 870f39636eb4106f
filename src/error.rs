use thiserror::Error;

use crate::metadata::handles::HandleKind;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two classes that callers usually want to treat differently:
///
/// ## Format errors
/// The input buffer is structurally invalid. Retrying with the same buffer always reproduces the
/// failure, and a [`crate::MetadataReader`] is never partially constructed.
/// - [`Error::Malformed`] - Corrupted or inconsistent metadata structure
/// - [`Error::OutOfBounds`] - A read would have crossed the end of the buffer
/// - [`Error::InvalidCompressedInteger`] - A compressed integer could not be decoded or encoded
/// - [`Error::Empty`] - Empty input provided
///
/// ## Invalid-usage errors
/// The caller passed something that can never work, independent of the data.
/// - [`Error::InvalidCast`] - A handle of the wrong kind was converted or passed to a typed accessor
/// - [`Error::InvalidHandle`] - A handle addresses a row or offset that does not exist
/// - [`Error::WriterOutOfBounds`] - A [`crate::blob::BlobWriter`] write crossed its fixed extent
/// - [`Error::InvalidArgument`] - An argument outside of the accepted domain
///
/// # Examples
///
/// ```rust,no_run
/// use cilmeta::{Error, MetadataReader};
///
/// # fn example(data: &[u8]) {
/// match MetadataReader::new(data) {
///     Ok(reader) => println!("{} tables", reader.tables().table_count()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed metadata: {} ({}:{})", message, file, line);
///     }
///     Err(e) if e.is_format_error() => eprintln!("Invalid metadata: {}", e),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata is damaged and could not be parsed.
    ///
    /// Carries the source location which detected the inconsistency to make triaging of
    /// damaged inputs easier.
    ///
    /// # Fields
    ///
    /// * `message` - Description of what is malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing.
    ///
    /// Every read is bounds checked against the input slice, this is the error that such a
    /// check produces.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A compressed integer could not be decoded, or a value is too large to be encoded.
    ///
    /// Unsigned values must not exceed `0x1FFF_FFFF`, signed values must fit into 29 bits
    /// (`-0x1000_0000..=0x0FFF_FFFF`).
    #[error("Invalid compressed integer: {0:#x}")]
    InvalidCompressedInteger(i64),

    /// Provided input was empty
    #[error("Provided input was empty")]
    Empty,

    /// A handle was converted into, or used as, a handle of an incompatible kind.
    ///
    /// Also reported when a virtual handle is promoted to a handle type that only addresses
    /// physical rows.
    #[error("Invalid cast from {from:?} to {to}")]
    InvalidCast {
        /// The kind of the handle that was supplied
        from: HandleKind,
        /// The name of the kind that was expected
        to: &'static str,
    },

    /// A handle addresses a row or heap offset outside of the metadata it was used with.
    #[error("Invalid handle - {0}")]
    InvalidHandle(String),

    /// A write would have crossed the fixed extent of a [`crate::blob::BlobWriter`].
    #[error("Write of {requested} bytes exceeds the {available} bytes left in the writer")]
    WriterOutOfBounds {
        /// The amount of bytes the write needed
        requested: usize,
        /// The amount of bytes that were left in the writer
        available: usize,
    },

    /// An argument was outside of the accepted domain.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// Writing to an output sink failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Failed to lock target
    ///
    /// Reported when the mutex of a shared [`crate::blob::ChunkPool`] was poisoned.
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Returns `true` if this error describes structurally invalid input data.
    ///
    /// ```rust
    /// use cilmeta::Error;
    ///
    /// assert!(Error::OutOfBounds.is_format_error());
    /// assert!(!Error::WriterOutOfBounds { requested: 4, available: 2 }.is_format_error());
    /// ```
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. }
                | Error::OutOfBounds
                | Error::InvalidCompressedInteger(_)
                | Error::Empty
        )
    }

    /// Returns `true` if this error was caused by the caller rather than by the input data.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidCast { .. }
                | Error::InvalidHandle(_)
                | Error::WriterOutOfBounds { .. }
                | Error::InvalidArgument(_)
        )
    }
}
