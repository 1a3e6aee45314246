#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for raster processing.
pub mod image;

/// Error types for the image module.
pub mod error;

/// numeric policy for pixel channels.
pub mod pixel;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
pub use crate::pixel::PixelValue;
