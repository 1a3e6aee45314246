use super::bilinear::bilinear_interpolation;
use super::lanczos::lanczos_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use ortho_image::{Image, PixelValue};
use serde::{Deserialize, Serialize};

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Bilinear interpolation
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
    /// Lanczos interpolation with a configurable kernel radius
    #[default]
    Lanczos,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C). Must not be empty.
/// * `u` - The x index coordinate of the pixel to interpolate.
/// * `v` - The y index coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `radius` - The Lanczos kernel radius, in `1..=MAX_KERNEL_RADIUS`. Ignored by the other modes.
///
/// # Returns
///
/// The interpolated pixel values, before rounding to the pixel type.
pub fn interpolate_pixel<T: PixelValue, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
    interpolation: InterpolationMode,
    radius: usize,
) -> [f64; C] {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
        InterpolationMode::Lanczos => lanczos_interpolation(image, u, v, radius),
    }
}

/// Clamp a possibly negative tap index into `0..len`.
#[inline(always)]
pub(super) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Read the channels of pixel `(x, y)` as `f64`.
#[inline(always)]
pub(super) fn fetch<T: PixelValue, const C: usize>(
    data: &[T],
    cols: usize,
    x: usize,
    y: usize,
) -> [f64; C] {
    let base = (y * cols + x) * C;
    let mut pixel = [0.0; C];
    pixel
        .iter_mut()
        .zip(data[base..base + C].iter())
        .for_each(|(p, v)| *p = v.to_f64());
    pixel
}
