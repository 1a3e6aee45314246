#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for homography estimation.
pub mod error;

/// Homography type and its estimation from point correspondences.
pub mod homography;

/// Small dense linear algebra helpers.
pub mod linalg;

/// 2d points and bounding boxes.
pub mod point;

pub use crate::error::{Degeneracy, HomographyError};
pub use crate::homography::{
    estimate_homography, reprojection_errors, rms_error, sum_squared_error, EstimatorConfig,
    Homography, MIN_CORRESPONDENCES,
};
pub use crate::point::{BoundingBox, Point2d};
