use ortho_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the image processing operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImgprocError {
    /// Error from the underlying image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error while scheduling the work.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// The requested output has no pixels.
    #[error("Invalid output size {0}x{1}: width and height must be positive")]
    InvalidSize(usize, usize),

    /// The transform cannot be inverted.
    #[error("The transform is singular (determinant ratio below {0:e})")]
    SingularTransform(f64),

    /// The interpolation kernel radius is not supported.
    #[error("Kernel radius {0} is outside the supported range 1..={1}")]
    InvalidKernelRadius(usize, usize),
}
