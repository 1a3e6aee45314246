use crate::linalg::solve_linear_system;
use crate::point::Point2d;

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;
const STEP_TOLERANCE: f64 = 1e-14;

fn to_params(h: &[[f64; 3]; 3]) -> [f64; 8] {
    // h33 is fixed to one by the linear solution
    let s = 1.0 / h[2][2];
    [
        h[0][0] * s,
        h[0][1] * s,
        h[0][2] * s,
        h[1][0] * s,
        h[1][1] * s,
        h[1][2] * s,
        h[2][0] * s,
        h[2][1] * s,
    ]
}

fn to_matrix(p: &[f64; 8]) -> [[f64; 3]; 3] {
    [[p[0], p[1], p[2]], [p[3], p[4], p[5]], [p[6], p[7], 1.0]]
}

/// Sum of squared reprojection errors of `p` over all correspondences.
fn cost(p: &[f64; 8], src: &[Point2d], dst: &[Point2d]) -> f64 {
    src.iter()
        .zip(dst.iter())
        .map(|(s, d)| {
            let w = p[6] * s.x + p[7] * s.y + 1.0;
            let u = (p[0] * s.x + p[1] * s.y + p[2]) / w;
            let v = (p[3] * s.x + p[4] * s.y + p[5]) / w;
            (u - d.x).powi(2) + (v - d.y).powi(2)
        })
        .sum()
}

/// Normal equations `J^T J` and gradient `J^T r` of the reprojection residuals.
fn normal_equations(
    p: &[f64; 8],
    src: &[Point2d],
    dst: &[Point2d],
) -> ([[f64; 8]; 8], [f64; 8]) {
    let mut jtj = [[0.0; 8]; 8];
    let mut jtr = [0.0; 8];

    for (s, d) in src.iter().zip(dst.iter()) {
        let (x, y) = (s.x, s.y);
        let w = p[6] * x + p[7] * y + 1.0;
        let u = (p[0] * x + p[1] * y + p[2]) / w;
        let v = (p[3] * x + p[4] * y + p[5]) / w;

        let ju = [x / w, y / w, 1.0 / w, 0.0, 0.0, 0.0, -u * x / w, -u * y / w];
        let jv = [0.0, 0.0, 0.0, x / w, y / w, 1.0 / w, -v * x / w, -v * y / w];

        for (j, r) in [(ju, u - d.x), (jv, v - d.y)] {
            for a in 0..8 {
                for b in 0..8 {
                    jtj[a][b] += j[a] * j[b];
                }
                jtr[a] += j[a] * r;
            }
        }
    }

    (jtj, jtr)
}

/// Refine a homography on the geometric reprojection error in the target frame.
///
/// Steps that do not lower the cost are rejected, so the result is never worse than `h`.
pub(super) fn refine_levenberg_marquardt(
    h: &[[f64; 3]; 3],
    src: &[Point2d],
    dst: &[Point2d],
    max_iterations: usize,
    eps: f64,
) -> [[f64; 3]; 3] {
    if h[2][2].abs() < f64::EPSILON {
        return *h;
    }

    let mut params = to_params(h);
    let mut current = cost(&params, src, dst);
    let initial = current;
    let mut lambda = LAMBDA_INIT;

    for iteration in 0..max_iterations {
        if current <= f64::MIN_POSITIVE {
            break;
        }

        let (jtj, jtr) = normal_equations(&params, src, dst);

        let mut improved = false;
        while lambda < LAMBDA_MAX {
            let mut damped = jtj;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(f64::EPSILON);
            }
            let rhs = jtr.map(|g| -g);

            let Ok(delta) = solve_linear_system(damped, rhs, eps) else {
                lambda *= 10.0;
                continue;
            };

            let mut candidate = params;
            candidate
                .iter_mut()
                .zip(delta.iter())
                .for_each(|(c, d)| *c += d);
            let candidate_cost = cost(&candidate, src, dst);

            if candidate_cost.is_finite() && candidate_cost < current {
                let step = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
                params = candidate;
                current = candidate_cost;
                lambda = (lambda / 10.0).max(1e-12);
                improved = true;
                log::debug!("lm iteration {iteration}: cost {current:.6e}, step {step:.3e}");
                if step < STEP_TOLERANCE {
                    return to_matrix(&params);
                }
                break;
            }
            lambda *= 10.0;
        }

        if !improved {
            break;
        }
    }

    if current >= initial && initial > f64::MIN_POSITIVE {
        log::warn!("homography refinement did not improve the linear solution");
    }

    to_matrix(&params)
}
