//! Pixel interpolation methods for image transformations.
//!
//! All methods sample at continuous index coordinates, where `(0.0, 0.0)` is
//! the centre of the top-left pixel. Taps that fall outside the raster are
//! replicated from the nearest edge pixel.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//! - **Lanczos**: Windowed sinc over a `2a x 2a` neighbourhood

mod bilinear;
pub(crate) mod interpolate;
mod lanczos;
mod nearest;

pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use lanczos::{lanczos_kernel, DEFAULT_KERNEL_RADIUS, MAX_KERNEL_RADIUS};
