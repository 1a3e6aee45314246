#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use ortho_image as image;

#[doc(inline)]
pub use ortho_geometry as geometry;

#[doc(inline)]
pub use ortho_imgproc as imgproc;

#[doc(inline)]
pub use ortho_io as io;

/// Estimation of the transform from control points followed by resampling.
pub mod rectify;

pub use crate::rectify::{rectify, rectify_any, RectifyConfig, RectifyError};
