use crate::homography::MIN_CORRESPONDENCES;

/// Reason why a correspondence set does not admit a stable homography.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum Degeneracy {
    /// A coordinate is NaN or infinite.
    #[error("point {0} has a non-finite coordinate")]
    NonFinite(usize),

    /// All points of one set coincide.
    #[error("all points coincide")]
    Coincident,

    /// No four points are in general position, e.g. all but one lie on a line.
    #[error("points are collinear")]
    Collinear,

    /// The linear system is rank deficient.
    #[error("linear system is singular (pivot {pivot:e})")]
    SingularSystem {
        /// Magnitude of the rejected pivot, relative to the matrix scale.
        pivot: f64,
    },
}

/// An error type for homography estimation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HomographyError {
    /// The correspondence lists differ in length or are too short.
    #[error(
        "expected two point lists of equal length >= {min}, got {src_len} and {dst_len}",
        min = MIN_CORRESPONDENCES
    )]
    InputSize {
        /// Number of source points.
        src_len: usize,
        /// Number of target points.
        dst_len: usize,
    },

    /// The correspondences are numerically degenerate.
    #[error("degenerate correspondences: {0}")]
    DegenerateInput(#[from] Degeneracy),
}
