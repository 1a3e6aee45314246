use super::interpolate::{clamp_index, fetch};
use ortho_image::{Image, PixelValue};

/// Kernel for nearest neighbor interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn nearest_neighbor_interpolation<T: PixelValue, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu = clamp_index(u.round() as isize, cols);
    let iv = clamp_index(v.round() as isize, rows);

    fetch(image.as_slice(), cols, iu, iv)
}
