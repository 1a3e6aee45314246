mod dlt;
mod normalize;
mod refine;

use serde::{Deserialize, Serialize};

use crate::error::{Degeneracy, HomographyError};
use crate::linalg;
use crate::point::Point2d;

/// Minimum number of correspondences that determine a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Homogeneous weights below this magnitude map a point to infinity.
const W_EPSILON: f64 = 1e-12;

/// A planar projective transform, stored row-major.
///
/// The matrix maps homogeneous source coordinates `[x, y, 1]` to target
/// coordinates up to scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography(pub [[f64; 3]; 3]);

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    /// The identity transform.
    pub const fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Create a homography from its rows.
    pub const fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self(rows)
    }

    /// The rows of the matrix.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        self.0
    }

    /// Determinant of the matrix.
    pub fn determinant(&self) -> f64 {
        linalg::det_mat33(&self.0)
    }

    /// Canonical representative of the projective class.
    ///
    /// Divides by `h33` when it is not vanishing, otherwise scales to unit
    /// Frobenius norm.
    pub fn normalized(&self) -> Self {
        let h33 = self.0[2][2];
        if h33.abs() > W_EPSILON {
            return Self(linalg::scale_mat33(&self.0, 1.0 / h33));
        }
        let norm = self.0.iter().flatten().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return *self;
        }
        Self(linalg::scale_mat33(&self.0, 1.0 / norm))
    }

    /// Map a point through the transform.
    ///
    /// Returns `None` when the point is sent to infinity.
    pub fn apply(&self, p: Point2d) -> Option<Point2d> {
        let [x, y, w] = linalg::mat33_mul_vec3(&self.0, &[p.x, p.y, 1.0]);
        if w.abs() < W_EPSILON {
            return None;
        }
        Some(Point2d::new(x / w, y / w))
    }

    /// Inverse transform.
    ///
    /// Returns `None` when the matrix is singular, i.e. its
    /// [`linalg::hadamard_ratio_mat33`] is below `eps`.
    pub fn inverse(&self, eps: f64) -> Option<Self> {
        linalg::inverse_mat33(&self.0, eps).map(|m| Self(m).normalized())
    }

    /// Compose two transforms: the result applies `other` first, then `self`.
    pub fn compose(&self, other: &Homography) -> Self {
        Self(linalg::mat33_mul(&self.0, &other.0)).normalized()
    }
}

/// Tolerances of the homography estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Smallest accepted pivot, relative to the largest coefficient of the eliminated matrix.
    pub pivot_epsilon: f64,
    /// Smallest accepted doubled triangle area of the normalized points. Each
    /// set must hold four points no three of which span less.
    pub collinearity_epsilon: f64,
    /// Upper bound of Levenberg-Marquardt iterations for more than four correspondences.
    pub max_refine_iterations: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            pivot_epsilon: 1e-12,
            collinearity_epsilon: 1e-9,
            max_refine_iterations: 20,
        }
    }
}

/// Estimate the homography `H` such that `dst[i] ~ H * src[i]`.
///
/// Four correspondences are solved exactly; more are solved in the least
/// squares sense and then refined on the geometric reprojection error.
///
/// # Arguments
///
/// * `src` - The source points.
/// * `dst` - The target points, related 1:1 by index to `src`.
/// * `config` - Numerical tolerances.
///
/// # Errors
///
/// * [`HomographyError::InputSize`] if the lists differ in length or hold fewer than four points.
/// * [`HomographyError::DegenerateInput`] if the points do not determine a unique transform.
///
/// # Example
///
/// ```
/// use ortho_geometry::{estimate_homography, EstimatorConfig, Point2d};
///
/// let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].map(Point2d::from);
/// let dst = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]].map(Point2d::from);
///
/// let h = estimate_homography(&src, &dst, &EstimatorConfig::default()).unwrap();
/// let p = h.apply(Point2d::new(0.5, 0.5)).unwrap();
///
/// assert!((p.x - 1.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
/// ```
pub fn estimate_homography(
    src: &[Point2d],
    dst: &[Point2d],
    config: &EstimatorConfig,
) -> Result<Homography, HomographyError> {
    if src.len() != dst.len() || src.len() < MIN_CORRESPONDENCES {
        return Err(HomographyError::InputSize {
            src_len: src.len(),
            dst_len: dst.len(),
        });
    }

    if let Some(i) = src
        .iter()
        .zip(dst.iter())
        .position(|(s, d)| !s.is_finite() || !d.is_finite())
    {
        return Err(Degeneracy::NonFinite(i).into());
    }

    let (src_n, t_src) = normalize::normalize_points(src)?;
    let (dst_n, t_dst) = normalize::normalize_points(dst)?;

    let exact = src.len() == MIN_CORRESPONDENCES;
    for pts in [&src_n, &dst_n] {
        if normalize::general_position_quad(pts, config.collinearity_epsilon).is_none() {
            return Err(Degeneracy::Collinear.into());
        }
    }

    let mut hn = if exact {
        dlt::solve_exact(&src_n, &dst_n, config.pivot_epsilon)?
    } else {
        dlt::solve_least_squares(&src_n, &dst_n, config.pivot_epsilon)?
    };

    if !exact && config.max_refine_iterations > 0 {
        hn = refine::refine_levenberg_marquardt(
            &hn,
            &src_n,
            &dst_n,
            config.max_refine_iterations,
            config.pivot_epsilon,
        );
    }

    // H = T_dst^-1 * Hn * T_src
    let h = Homography(t_dst.inverse())
        .compose(&Homography(hn))
        .compose(&Homography(t_src.matrix()));

    if h.0.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Degeneracy::SingularSystem { pivot: 0.0 }.into());
    }

    log::debug!("estimated homography from {} points: {:?}", src.len(), h.0);

    Ok(h)
}

/// Euclidean distance between `h * src[i]` and `dst[i]` for every correspondence.
///
/// Points mapped to infinity yield `f64::INFINITY`.
pub fn reprojection_errors(h: &Homography, src: &[Point2d], dst: &[Point2d]) -> Vec<f64> {
    src.iter()
        .zip(dst.iter())
        .map(|(s, d)| h.apply(*s).map_or(f64::INFINITY, |p| p.distance(d)))
        .collect()
}

/// Sum of squared reprojection errors.
pub fn sum_squared_error(h: &Homography, src: &[Point2d], dst: &[Point2d]) -> f64 {
    reprojection_errors(h, src, dst).iter().map(|e| e * e).sum()
}

/// Root mean square reprojection error.
pub fn rms_error(h: &Homography, src: &[Point2d], dst: &[Point2d]) -> f64 {
    let n = src.len().min(dst.len());
    if n == 0 {
        return 0.0;
    }
    (sum_squared_error(h, src, dst) / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn points(raw: &[[f64; 2]]) -> Vec<Point2d> {
        raw.iter().copied().map(Point2d::from).collect()
    }

    fn project(h: &Homography, pts: &[Point2d]) -> Vec<Point2d> {
        pts.iter().map(|p| h.apply(*p).unwrap()).collect()
    }

    fn assert_homography_eq(a: &Homography, b: &Homography, eps: f64) {
        let (a, b) = (a.normalized(), b.normalized());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(a.0[i][j], b.0[i][j], epsilon = eps);
            }
        }
    }

    #[test]
    fn identity_from_identical_points() -> Result<(), HomographyError> {
        let pts = points(&[[0.0, 0.0], [99.0, 0.0], [99.0, 99.0], [0.0, 99.0]]);
        let h = estimate_homography(&pts, &pts, &EstimatorConfig::default())?;
        assert_homography_eq(&h, &Homography::identity(), 1e-9);
        Ok(())
    }

    #[test]
    fn translation_four_points() -> Result<(), HomographyError> {
        let src = points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let expected = Homography::from_array([[1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]]);
        let dst = project(&expected, &src);
        let h = estimate_homography(&src, &dst, &EstimatorConfig::default())?;
        assert_homography_eq(&h, &expected, 1e-9);
        Ok(())
    }

    #[test]
    fn four_points_hit_control_points() -> Result<(), HomographyError> {
        let src = points(&[[12.0, 30.0], [850.0, 22.0], [880.0, 610.0], [5.0, 640.0]]);
        let dst = points(&[[0.0, 0.0], [1000.0, 0.0], [1000.0, 800.0], [0.0, 800.0]]);
        let h = estimate_homography(&src, &dst, &EstimatorConfig::default())?;

        for (s, d) in src.iter().zip(dst.iter()) {
            let p = h.apply(*s).unwrap();
            assert_relative_eq!(p.x, d.x, epsilon = 1e-6, max_relative = 1e-6);
            assert_relative_eq!(p.y, d.y, epsilon = 1e-6, max_relative = 1e-6);
        }
        assert_relative_eq!(h.0[2][2], 1.0);
        Ok(())
    }

    #[test]
    fn recovers_projective_ground_truth() -> Result<(), HomographyError> {
        let ground_truth = Homography::from_array([
            [0.8, 0.05, 120.0],
            [-0.02, 1.1, 80.0],
            [0.0009, -0.0004, 1.0],
        ]);
        let src = points(&[[0.0, 0.0], [180.0, 0.0], [180.0, 130.0], [0.0, 130.0]]);
        let dst = project(&ground_truth, &src);
        let h = estimate_homography(&src, &dst, &EstimatorConfig::default())?;
        assert_homography_eq(&h, &ground_truth, 1e-8);
        Ok(())
    }

    #[test]
    fn overdetermined_exact_data() -> Result<(), HomographyError> {
        let ground_truth = Homography::from_array([
            [1.0, 0.2, 12.0],
            [-0.1, 0.9, 6.0],
            [0.0006, 0.0004, 1.0],
        ]);
        let src: Vec<Point2d> = (0..3)
            .flat_map(|y| (0..3).map(move |x| Point2d::new(x as f64 * 40.0, y as f64 * 50.0)))
            .collect();
        let dst = project(&ground_truth, &src);

        let h = estimate_homography(&src, &dst, &EstimatorConfig::default())?;
        assert_homography_eq(&h, &ground_truth, 1e-8);
        assert!(rms_error(&h, &src, &dst) < 1e-8);
        Ok(())
    }

    #[test]
    fn least_squares_beats_every_four_point_subset() -> Result<(), HomographyError> {
        let ground_truth = Homography::from_array([
            [0.9, -0.15, 40.0],
            [0.1, 1.05, -25.0],
            [0.0003, -0.0002, 1.0],
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let src: Vec<Point2d> = (0..8)
            .map(|_| {
                Point2d::new(
                    rng.random_range(0.0..500.0),
                    rng.random_range(0.0..400.0),
                )
            })
            .collect();
        let dst: Vec<Point2d> = project(&ground_truth, &src)
            .into_iter()
            .map(|p| {
                Point2d::new(
                    p.x + rng.random_range(-1.5..1.5),
                    p.y + rng.random_range(-1.5..1.5),
                )
            })
            .collect();

        let config = EstimatorConfig::default();
        let h = estimate_homography(&src, &dst, &config)?;
        let sse = sum_squared_error(&h, &src, &dst);

        let n = src.len();
        let mut subsets = 0;
        for a in 0..n {
            for b in a + 1..n {
                for c in b + 1..n {
                    for d in c + 1..n {
                        let idx = [a, b, c, d];
                        let s: Vec<_> = idx.iter().map(|&i| src[i]).collect();
                        let t: Vec<_> = idx.iter().map(|&i| dst[i]).collect();
                        let Ok(h4) = estimate_homography(&s, &t, &config) else {
                            continue;
                        };
                        subsets += 1;
                        assert!(
                            sse <= sum_squared_error(&h4, &src, &dst) + 1e-9,
                            "subset {idx:?} fits better than the least squares solution"
                        );
                    }
                }
            }
        }
        assert!(subsets > 0);
        Ok(())
    }

    #[test]
    fn refinement_never_increases_error() -> Result<(), HomographyError> {
        let src = points(&[
            [0.0, 0.0],
            [100.0, 0.0],
            [100.0, 100.0],
            [0.0, 100.0],
            [50.0, 50.0],
            [20.0, 80.0],
        ]);
        let dst = points(&[
            [1.0, 2.0],
            [205.0, -1.0],
            [198.0, 203.0],
            [-3.0, 199.0],
            [101.0, 97.0],
            [38.0, 162.0],
        ]);
        let linear = EstimatorConfig {
            max_refine_iterations: 0,
            ..Default::default()
        };
        let h_linear = estimate_homography(&src, &dst, &linear)?;
        let h_refined = estimate_homography(&src, &dst, &EstimatorConfig::default())?;
        assert!(
            sum_squared_error(&h_refined, &src, &dst)
                <= sum_squared_error(&h_linear, &src, &dst) + 1e-12
        );
        Ok(())
    }

    #[test]
    fn mismatched_lengths_fail() {
        let src = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let dst = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert_eq!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::InputSize {
                src_len: 4,
                dst_len: 3
            })
        );
    }

    #[test]
    fn too_few_points_fail() {
        let pts = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            estimate_homography(&pts, &pts, &EstimatorConfig::default()),
            Err(HomographyError::InputSize { .. })
        ));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let src = points(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        let dst = points(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        assert_eq!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::Collinear))
        );
        // also when the collinear set is the target
        assert!(matches!(
            estimate_homography(&dst, &src, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(_))
        ));
    }

    #[test]
    fn three_collinear_of_four_are_degenerate() {
        let src = points(&[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        let dst = points(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        assert!(matches!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::Collinear))
        ));
    }

    #[test]
    fn many_collinear_points_are_degenerate() {
        let src: Vec<Point2d> = (0..6).map(|i| Point2d::new(i as f64, 2.0 * i as f64)).collect();
        let dst: Vec<Point2d> = (0..6).map(|i| Point2d::new(i as f64, (i * i) as f64)).collect();
        assert!(matches!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::Collinear))
        ));
    }

    #[test]
    fn one_point_off_a_line_is_degenerate() {
        let src = points(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [1.0, 5.0]]);
        let dst = points(&[[0.0, 0.0], [2.0, 0.1], [4.0, 0.3], [6.0, 0.2], [2.0, 9.0]]);
        assert_eq!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::Collinear))
        );
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let src = points(&[[3.0, 3.0]; 4]);
        let dst = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::Coincident))
        );
    }

    #[test]
    fn non_finite_points_are_degenerate() {
        let src = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, f64::NAN], [0.0, 1.0]]);
        let dst = points(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(
            estimate_homography(&src, &dst, &EstimatorConfig::default()),
            Err(HomographyError::DegenerateInput(Degeneracy::NonFinite(2)))
        );
    }

    #[test]
    fn singular_pivot_is_reported() {
        // pass the collinearity screen but fail the elimination
        let src = points(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
        let dst = points(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let config = EstimatorConfig {
            collinearity_epsilon: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            estimate_homography(&src, &dst, &config),
            Err(HomographyError::DegenerateInput(
                Degeneracy::SingularSystem { .. }
            ))
        ));
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::from_array([[1.2, 0.1, 5.0], [-0.05, 0.9, 3.0], [0.001, 0.0005, 1.0]]);
        let inv = h.inverse(1e-12).unwrap();

        for p in points(&[[0.0, 0.0], [50.0, -20.0], [320.0, 200.0]]) {
            let back = inv.apply(h.apply(p).unwrap()).unwrap();
            assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
            assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
        }
        assert_homography_eq(&h.compose(&inv), &Homography::identity(), 1e-12);
    }

    #[test]
    fn apply_at_infinity() {
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(h.apply(Point2d::new(0.0, 5.0)).is_none());
        assert!(h.inverse(1e-12).is_none());
    }

    #[test]
    fn config_from_partial_json() -> Result<(), serde_json::Error> {
        let config: EstimatorConfig = serde_json::from_str(r#"{ "max_refine_iterations": 3 }"#)?;
        assert_eq!(config.max_refine_iterations, 3);
        assert_eq!(config.pivot_epsilon, EstimatorConfig::default().pivot_epsilon);
        Ok(())
    }
}
