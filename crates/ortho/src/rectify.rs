use std::path::Path;

use ortho_geometry::{
    estimate_homography, rms_error, Degeneracy, EstimatorConfig, HomographyError, Point2d,
};
use ortho_image::{Image, ImageError, ImageSize, PixelValue};
use ortho_imgproc::{
    warp::{resample_perspective, WarpConfig},
    ImgprocError,
};
use ortho_io::GenericImage;
use serde::{Deserialize, Serialize};

/// An error type for the rectification pipeline.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RectifyError {
    /// The correspondence lists differ in length or hold fewer than four points.
    #[error("invalid control points: got {src_len} original and {dst_len} mapped, need >= 4 of each")]
    InputSize {
        /// Number of original points.
        src_len: usize,
        /// Number of mapped points.
        dst_len: usize,
    },

    /// The control points do not determine a stable transform.
    #[error("degenerate control points: {0}")]
    DegenerateInput(Degeneracy),

    /// The estimated transform cannot be inverted.
    #[error("the transform is singular (determinant ratio below {0:e})")]
    SingularTransform(f64),

    /// The requested output size has no pixels.
    #[error("invalid output size {0}x{1}")]
    InvalidSize(usize, usize),

    /// Error from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The configuration is unreadable or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<HomographyError> for RectifyError {
    fn from(e: HomographyError) -> Self {
        match e {
            HomographyError::InputSize { src_len, dst_len } => {
                RectifyError::InputSize { src_len, dst_len }
            }
            HomographyError::DegenerateInput(d) => RectifyError::DegenerateInput(d),
        }
    }
}

impl From<ImgprocError> for RectifyError {
    fn from(e: ImgprocError) -> Self {
        match e {
            ImgprocError::InvalidSize(w, h) => RectifyError::InvalidSize(w, h),
            ImgprocError::SingularTransform(eps) => RectifyError::SingularTransform(eps),
            ImgprocError::Image(e) => RectifyError::Image(e),
            e @ (ImgprocError::Parallel(_) | ImgprocError::InvalidKernelRadius(..)) => {
                RectifyError::Config(e.to_string())
            }
        }
    }
}

/// Parameters of the whole pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Tolerances of the homography estimator.
    pub estimator: EstimatorConfig,
    /// Parameters of the resampler.
    pub warp: WarpConfig,
}

impl RectifyConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, RectifyError> {
        serde_json::from_str(json).map_err(|e| RectifyError::Config(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RectifyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RectifyError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}

/// Rectify a raster from its control points.
///
/// Estimates the homography taking `original` onto `mapped` and resamples
/// `src` through it into a new `width x height` raster.
///
/// # Arguments
///
/// * `src` - The source raster.
/// * `original` - The control points in the source frame.
/// * `mapped` - The same control points in the target frame.
/// * `width` - The output width in pixels.
/// * `height` - The output height in pixels.
/// * `config` - The estimator and resampler parameters.
///
/// # Errors
///
/// [`RectifyError::InvalidSize`] for an empty output, otherwise the error of
/// the failing stage.
///
/// # Example
///
/// ```
/// use ortho::{rectify, RectifyConfig};
/// use ortho::geometry::Point2d;
/// use ortho::image::{Image, ImageSize};
///
/// let src = Image::<u8, 1>::from_size_val([8, 8].into(), 90).unwrap();
/// let original = [[0.0, 0.0], [8.0, 0.0], [8.0, 8.0], [0.0, 8.0]].map(Point2d::from);
/// let mapped = [[0.0, 0.0], [16.0, 0.0], [16.0, 16.0], [0.0, 16.0]].map(Point2d::from);
///
/// let out = rectify(&src, &original, &mapped, 16, 16, &RectifyConfig::default()).unwrap();
/// assert_eq!(out.size(), ImageSize { width: 16, height: 16 });
/// ```
pub fn rectify<T: PixelValue, const C: usize>(
    src: &Image<T, C>,
    original: &[Point2d],
    mapped: &[Point2d],
    width: usize,
    height: usize,
    config: &RectifyConfig,
) -> Result<Image<T, C>, RectifyError> {
    if width == 0 || height == 0 {
        return Err(RectifyError::InvalidSize(width, height));
    }

    let h = estimate_homography(original, mapped, &config.estimator)?;
    log::info!(
        "calc perspective: {} control points, rms reprojection error {:.3e}",
        original.len(),
        rms_error(&h, original, mapped)
    );
    log::debug!("homography: {:?}", h.to_array());

    let dst = resample_perspective(src, &h, ImageSize { width, height }, &config.warp)?;
    log::info!(
        "map perspective: {} -> {} ({:?})",
        src.size(),
        dst.size(),
        config.warp.interpolation
    );

    Ok(dst)
}

/// Rectify a raster whose pixel format is only known at runtime.
///
/// The output keeps the pixel format of `src`. See [`rectify`].
pub fn rectify_any(
    src: &GenericImage,
    original: &[Point2d],
    mapped: &[Point2d],
    width: usize,
    height: usize,
    config: &RectifyConfig,
) -> Result<GenericImage, RectifyError> {
    macro_rules! dispatch {
        ($($variant:ident),*) => {
            match src {
                $(GenericImage::$variant(img) => GenericImage::$variant(rectify(
                    img, original, mapped, width, height, config,
                )?),)*
            }
        };
    }

    Ok(dispatch!(L8, La8, Rgb8, Rgba8, L16, La16, Rgb16, Rgba16, Rgb32F, Rgba32F))
}
