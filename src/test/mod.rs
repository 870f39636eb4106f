//! Shared helpers for the unit tests.
//!
//! [`MetadataImageBuilder`] assembles complete metadata blocks in memory, so tests can exercise
//! the reader without binary fixtures. [`sample_assembly`] is a ready made image covering most
//! of the query surface.

mod image;

pub use fixtures::{coded, sample_assembly};
pub use image::MetadataImageBuilder;
