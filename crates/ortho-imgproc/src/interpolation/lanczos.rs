use super::interpolate::{clamp_index, fetch};
use ortho_image::{Image, PixelValue};
use std::f64::consts::PI;

/// The Lanczos kernel radius used when none is configured.
pub const DEFAULT_KERNEL_RADIUS: usize = 3;

/// The largest supported Lanczos kernel radius.
pub const MAX_KERNEL_RADIUS: usize = 8;

const MAX_TAPS: usize = 2 * MAX_KERNEL_RADIUS;

// sample positions closer than this to a pixel centre are snapped onto it
const SNAP_EPSILON: f64 = 1e-9;

/// Evaluate the Lanczos kernel `L(x) = sinc(x) * sinc(x / a)` with support `|x| < a`.
///
/// # Arguments
///
/// * `x` - The distance to the kernel centre.
/// * `a` - The kernel radius.
///
/// # Returns
///
/// One at the origin, zero at the other integers and outside the support.
#[inline]
pub fn lanczos_kernel(x: f64, a: f64) -> f64 {
    let x = x.abs();
    if x < f64::EPSILON {
        return 1.0;
    }
    if x >= a || x.fract() == 0.0 {
        return 0.0;
    }
    let px = PI * x;
    a * px.sin() * (px / a).sin() / (px * px)
}

/// Fill the `2 * radius` normalized weights of the taps around a sample.
///
/// Tap `k` sits at integer offset `k + 1 - radius` from the floor of the sample.
fn lanczos_weights(frac: f64, radius: usize, weights: &mut [f64; MAX_TAPS]) {
    let a = radius as f64;
    let taps = 2 * radius;

    let mut sum = 0.0;
    for (k, w) in weights.iter_mut().take(taps).enumerate() {
        *w = lanczos_kernel(frac + a - 1.0 - k as f64, a);
        sum += *w;
    }

    if sum.abs() > f64::EPSILON {
        weights.iter_mut().take(taps).for_each(|w| *w /= sum);
    }
}

/// Split a coordinate into its integer tap origin and the fractional offset.
#[inline]
fn split_coordinate(x: f64) -> (isize, f64) {
    let base = x.floor();
    let frac = x - base;
    if frac < SNAP_EPSILON {
        (base as isize, 0.0)
    } else if frac > 1.0 - SNAP_EPSILON {
        (base as isize + 1, 0.0)
    } else {
        (base as isize, frac)
    }
}

/// Kernel for Lanczos interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `radius` - The kernel radius `a`, clamped to `1..=MAX_KERNEL_RADIUS`.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn lanczos_interpolation<T: PixelValue, const C: usize>(
    image: &Image<T, C>,
    u: f64,
    v: f64,
    radius: usize,
) -> [f64; C] {
    let (rows, cols) = (image.rows(), image.cols());
    let radius = radius.clamp(1, MAX_KERNEL_RADIUS);
    let taps = 2 * radius;
    let first = 1 - radius as isize;

    let (iu, frac_u) = split_coordinate(u);
    let (iv, frac_v) = split_coordinate(v);

    let mut wx = [0.0; MAX_TAPS];
    let mut wy = [0.0; MAX_TAPS];
    lanczos_weights(frac_u, radius, &mut wx);
    lanczos_weights(frac_v, radius, &mut wy);

    let mut xs = [0usize; MAX_TAPS];
    for (k, x) in xs.iter_mut().take(taps).enumerate() {
        *x = clamp_index(iu + first + k as isize, cols);
    }

    let data = image.as_slice();
    let mut pixel = [0.0; C];

    for (ky, &wyk) in wy.iter().take(taps).enumerate() {
        if wyk == 0.0 {
            continue;
        }
        let y = clamp_index(iv + first + ky as isize, rows);

        let mut row = [0.0; C];
        for (&x, &wxk) in xs.iter().zip(wx.iter()).take(taps) {
            if wxk == 0.0 {
                continue;
            }
            let p: [f64; C] = fetch(data, cols, x, y);
            for c in 0..C {
                row[c] += wxk * p[c];
            }
        }

        for c in 0..C {
            pixel[c] += wyk * row[c];
        }
    }

    pixel
}
