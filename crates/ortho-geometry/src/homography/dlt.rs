use crate::error::Degeneracy;
use crate::linalg::solve_linear_system;
use crate::point::Point2d;

/// The two rows contributed by the correspondence `(x, y) -> (u, v)`.
///
/// Unknowns are `[h11 h12 h13 h21 h22 h23 h31 h32]` with `h33 = 1`:
///
/// ```text
/// h11 x + h12 y + h13 - u h31 x - u h32 y = u
/// h21 x + h22 y + h23 - v h31 x - v h32 y = v
/// ```
#[rustfmt::skip]
fn correspondence_rows(s: &Point2d, d: &Point2d) -> [([f64; 8], f64); 2] {
    let (x, y, u, v) = (s.x, s.y, d.x, d.y);
    [
        ([x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y], u),
        ([0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y], v),
    ]
}

fn to_matrix(h: &[f64; 8]) -> [[f64; 3]; 3] {
    [
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], 1.0],
    ]
}

/// Solve the 8x8 system of four correspondences exactly.
pub(super) fn solve_exact(
    src: &[Point2d],
    dst: &[Point2d],
    eps: f64,
) -> Result<[[f64; 3]; 3], Degeneracy> {
    let mut a = [[0.0; 8]; 8];
    let mut b = [0.0; 8];

    for (k, (s, d)) in src.iter().zip(dst.iter()).take(4).enumerate() {
        for (r, (row, rhs)) in correspondence_rows(s, d).into_iter().enumerate() {
            a[2 * k + r] = row;
            b[2 * k + r] = rhs;
        }
    }

    let h = solve_linear_system(a, b, eps).map_err(|pivot| Degeneracy::SingularSystem { pivot })?;
    Ok(to_matrix(&h))
}

/// Solve the over-determined system of `N > 4` correspondences through its normal equations.
pub(super) fn solve_least_squares(
    src: &[Point2d],
    dst: &[Point2d],
    eps: f64,
) -> Result<[[f64; 3]; 3], Degeneracy> {
    // accumulate A^T A and A^T b without materializing A
    let mut ata = [[0.0; 8]; 8];
    let mut atb = [0.0; 8];

    for (s, d) in src.iter().zip(dst.iter()) {
        for (row, rhs) in correspondence_rows(s, d) {
            for i in 0..8 {
                if row[i] == 0.0 {
                    continue;
                }
                for j in 0..8 {
                    ata[i][j] += row[i] * row[j];
                }
                atb[i] += row[i] * rhs;
            }
        }
    }

    let h = solve_linear_system(ata, atb, eps)
        .map_err(|pivot| Degeneracy::SingularSystem { pivot })?;
    Ok(to_matrix(&h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2d> {
        [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
            .into_iter()
            .map(Point2d::from)
            .collect()
    }

    #[test]
    fn exact_identity() -> Result<(), Degeneracy> {
        let pts = square();
        let h = solve_exact(&pts, &pts, 1e-12)?;
        for (i, row) in h.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                assert_relative_eq!(*v, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn least_squares_matches_exact_on_consistent_data() -> Result<(), Degeneracy> {
        let mut src = square();
        src.push(Point2d::new(0.2, -0.3));
        let dst: Vec<Point2d> = src.iter().map(|p| Point2d::new(2.0 * p.x + 0.5, p.y)).collect();

        let h_exact = solve_exact(&src[..4], &dst[..4], 1e-12)?;
        let h_lsq = solve_least_squares(&src, &dst, 1e-12)?;
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(h_exact[i][j], h_lsq[i][j], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn duplicated_points_are_singular() {
        let src = vec![Point2d::new(-1.0, 0.0); 2]
            .into_iter()
            .chain(vec![Point2d::new(1.0, 0.0); 2])
            .collect::<Vec<_>>();
        let dst = square();
        assert!(matches!(
            solve_exact(&src, &dst, 1e-12),
            Err(Degeneracy::SingularSystem { .. })
        ));
    }
}
