use super::interpolate::{clamp_index, fetch};
use ortho_image::{Image, PixelValue};

/// Kernel for bilinear interpolation
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
pub(crate) fn bilinear_interpolation<T: PixelValue, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let u0 = u.floor();
    let v0 = v.floor();

    let frac_u = u - u0;
    let frac_v = v - v0;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu0 = clamp_index(u0 as isize, cols);
    let iv0 = clamp_index(v0 as isize, rows);
    let iu1 = clamp_index(u0 as isize + 1, cols);
    let iv1 = clamp_index(v0 as isize + 1, rows);

    let data = image.as_slice();

    let p00: [f64; C] = fetch(data, cols, iu0, iv0);
    let p01: [f64; C] = fetch(data, cols, iu1, iv0);
    let p10: [f64; C] = fetch(data, cols, iu0, iv1);
    let p11: [f64; C] = fetch(data, cols, iu1, iv1);

    let mut pixel = [0.0; C];
    for k in 0..C {
        pixel[k] = p00[k] * w00 + p01[k] * w01 + p10[k] * w10 + p11[k] * w11;
    }

    pixel
}
