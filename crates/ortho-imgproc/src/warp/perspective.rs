use crate::{
    error::ImgprocError,
    interpolation::{interpolate_pixel, InterpolationMode, DEFAULT_KERNEL_RADIUS, MAX_KERNEL_RADIUS},
    parallel::{self, ExecutionStrategy},
};

use ortho_geometry::Homography;
use ortho_image::{Image, ImageSize, PixelValue};
use serde::{Deserialize, Serialize};

// homogeneous weights below this magnitude send the pixel to infinity
const W_EPSILON: f64 = 1e-12;

/// Parameters of the perspective resampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// The interpolation mode.
    pub interpolation: InterpolationMode,
    /// Radius `a` of the Lanczos kernel, in `1..=MAX_KERNEL_RADIUS`.
    pub kernel_radius: usize,
    /// Value written to output pixels whose preimage falls outside the source.
    pub border_value: f64,
    /// Transforms whose determinant ratio falls below this value are rejected as singular.
    pub singular_epsilon: f64,
    /// How output rows are scheduled.
    pub strategy: ExecutionStrategy,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMode::Lanczos,
            kernel_radius: DEFAULT_KERNEL_RADIUS,
            border_value: 0.0,
            singular_epsilon: 1e-12,
            strategy: ExecutionStrategy::ParallelRows,
        }
    }
}

#[inline]
fn transform_point(x: f64, y: f64, m: &[[f64; 3]; 3]) -> Option<(f64, f64)> {
    let w = m[2][0] * x + m[2][1] * y + m[2][2];
    if !(w.abs() >= W_EPSILON) {
        return None;
    }
    let xs = (m[0][0] * x + m[0][1] * y + m[0][2]) / w;
    let ys = (m[1][0] * x + m[1][1] * y + m[1][2]) / w;
    (xs.is_finite() && ys.is_finite()).then_some((xs, ys))
}

/// Applies a perspective transformation to an image.
///
/// Every output pixel centre is mapped through the inverse of `m` into the
/// source. Pixels whose preimage falls outside `[0, width) x [0, height)` of
/// the source, or at infinity, are set to `config.border_value`; the others are
/// interpolated with `config.interpolation`. Edge pixels are replicated both for
/// samples between the outer pixel centres and the raster border and for taps
/// beyond the raster.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 3x3 perspective transformation matrix src -> dst.
/// * `config` - The resampling parameters.
///
/// # Errors
///
/// * [`ImgprocError::InvalidSize`] if `dst` has no pixels.
/// * [`ImgprocError::InvalidKernelRadius`] if the kernel radius is unsupported.
/// * [`ImgprocError::SingularTransform`] if `m` cannot be inverted.
///
/// # Example
///
/// ```
/// use ortho_geometry::Homography;
/// use ortho_image::{Image, ImageSize};
/// use ortho_imgproc::warp::{warp_perspective, WarpConfig};
///
/// let src = Image::<u8, 1>::new(
///   ImageSize {
///     width: 4,
///     height: 5,
///   },
///   vec![0u8; 4 * 5]
/// ).unwrap();
///
/// let m = Homography::from_array([[1.0, 0.0, -1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]]);
///
/// let mut dst = Image::<u8, 1>::from_size_val(
///   ImageSize {
///     width: 2,
///     height: 3,
///   },
///   0
/// ).unwrap();
///
/// warp_perspective(&src, &mut dst, &m, &WarpConfig::default()).unwrap();
///
/// assert_eq!(dst.size().width, 2);
/// assert_eq!(dst.size().height, 3);
/// ```
pub fn warp_perspective<T: PixelValue, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &Homography,
    config: &WarpConfig,
) -> Result<(), ImgprocError> {
    let dst_size = dst.size();
    if dst_size.is_empty() {
        return Err(ImgprocError::InvalidSize(dst_size.width, dst_size.height));
    }
    if !(1..=MAX_KERNEL_RADIUS).contains(&config.kernel_radius) {
        return Err(ImgprocError::InvalidKernelRadius(
            config.kernel_radius,
            MAX_KERNEL_RADIUS,
        ));
    }

    // inverse perspective matrix, dst -> src
    let inv_m = m
        .inverse(config.singular_epsilon)
        .ok_or(ImgprocError::SingularTransform(config.singular_epsilon))?
        .to_array();

    log::debug!(
        "warp_perspective: {} -> {}, {:?} interpolation",
        src.size(),
        dst_size,
        config.interpolation
    );

    let (src_cols, src_rows) = (src.cols() as f64, src.rows() as f64);
    let fill = [T::from_f64_saturating(config.border_value); C];
    let row_stride = dst_size.width * C;

    parallel::par_iter_rows_indexed(
        dst.as_slice_mut(),
        row_stride,
        config.strategy,
        |row, dst_row| {
            let yc = row as f64 + 0.5;
            for (col, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
                let xc = col as f64 + 0.5;
                match transform_point(xc, yc, &inv_m) {
                    Some((x, y)) if x >= 0.0 && x < src_cols && y >= 0.0 && y < src_rows => {
                        // the half pixel band along the border reads as the edge pixel
                        let value = interpolate_pixel(
                            src,
                            (x - 0.5).clamp(0.0, src_cols - 1.0),
                            (y - 0.5).clamp(0.0, src_rows - 1.0),
                            config.interpolation,
                            config.kernel_radius,
                        );
                        dst_pixel
                            .iter_mut()
                            .zip(value.iter())
                            .for_each(|(d, v)| *d = T::from_f64_saturating(*v));
                    }
                    _ => dst_pixel.copy_from_slice(&fill),
                }
            }
        },
    )?;

    Ok(())
}

/// Resample `src` into a new image of the given size.
///
/// Allocates the output and fills it with [`warp_perspective`].
///
/// # Errors
///
/// * [`ImgprocError::InvalidSize`] if `size` has no pixels.
/// * Any error of [`warp_perspective`].
pub fn resample_perspective<T: PixelValue, const C: usize>(
    src: &Image<T, C>,
    m: &Homography,
    size: ImageSize,
    config: &WarpConfig,
) -> Result<Image<T, C>, ImgprocError> {
    if size.is_empty() {
        return Err(ImgprocError::InvalidSize(size.width, size.height));
    }
    let mut dst = Image::from_size_val(size, T::default())?;
    warp_perspective(src, &mut dst, m, config)?;
    Ok(dst)
}
