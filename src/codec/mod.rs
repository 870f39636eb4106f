//! # Primitive Codec
//!
//! Low level encoding and decoding shared by the reading and the writing side.
//!
//! - [`io`] - fixed-width little and big endian integers and floats at explicit offsets
//! - [`compressed`] - the 1/2/4 byte compressed unsigned and signed integers
//! - [`utf8`] - UTF-16 to UTF-8 transcoding that tolerates unpaired surrogates
//! - [`Parser`] - a bounds checked cursor used for blobs and signatures
//! - [`ConstantValue`] - values of the `Constant` table

pub mod compressed;
mod constant;
pub mod io;
mod parser;
pub mod utf8;

pub use constant::{ConstantTypeCode, ConstantValue};
pub use parser::Parser;
