/// Compute the determinant of a 3x3 matrix.
#[rustfmt::skip]
pub fn det_mat33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Compute the adjugate (transposed cofactor matrix) of a 3x3 matrix.
#[rustfmt::skip]
pub fn adjugate_mat33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],
            m[0][2] * m[2][1] - m[0][1] * m[2][2],
            m[0][1] * m[1][2] - m[0][2] * m[1][1],
        ],
        [
            m[1][2] * m[2][0] - m[1][0] * m[2][2],
            m[0][0] * m[2][2] - m[0][2] * m[2][0],
            m[0][2] * m[1][0] - m[0][0] * m[1][2],
        ],
        [
            m[1][0] * m[2][1] - m[1][1] * m[2][0],
            m[0][1] * m[2][0] - m[0][0] * m[2][1],
            m[0][0] * m[1][1] - m[0][1] * m[1][0],
        ],
    ]
}

/// Ratio between `|det(m)|` and the product of the column norms of `m`.
///
/// The ratio lies in `[0, 1]`, is invariant to scaling any column and equals
/// one for orthogonal matrices, which makes it a scale free singularity measure.
pub fn hadamard_ratio_mat33(m: &[[f64; 3]; 3]) -> f64 {
    let norms: f64 = (0..3)
        .map(|j| (m[0][j] * m[0][j] + m[1][j] * m[1][j] + m[2][j] * m[2][j]).sqrt())
        .product();
    if !norms.is_finite() || norms == 0.0 {
        return 0.0;
    }
    det_mat33(m).abs() / norms
}

/// Invert a 3x3 matrix.
///
/// Returns `None` when the [`hadamard_ratio_mat33`] of the matrix is below `eps`.
pub fn inverse_mat33(m: &[[f64; 3]; 3], eps: f64) -> Option<[[f64; 3]; 3]> {
    // NaN ratios fail the comparison as well
    if !(hadamard_ratio_mat33(m) >= eps) {
        return None;
    }
    let det = det_mat33(m);
    Some(scale_mat33(&adjugate_mat33(m), 1.0 / det))
}

/// Multiply every entry of a 3x3 matrix by `s`.
pub fn scale_mat33(m: &[[f64; 3]; 3], s: f64) -> [[f64; 3]; 3] {
    let mut out = *m;
    out.iter_mut().flatten().for_each(|v| *v *= s);
    out
}

/// Multiply two 3x3 matrices.
pub fn mat33_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Multiply a 3x3 matrix by a 3d vector.
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Solve the square system `a * x = b` by Gaussian elimination with partial pivoting.
///
/// A pivot whose magnitude falls below `eps` times the largest absolute
/// coefficient of `a` makes the system singular; its relative magnitude is
/// returned as the error.
pub fn solve_linear_system<const N: usize>(
    mut a: [[f64; N]; N],
    mut b: [f64; N],
    eps: f64,
) -> Result<[f64; N], f64> {
    let scale = a.iter().flatten().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() || scale == 0.0 {
        return Err(0.0);
    }
    let tol = eps * scale;

    for col in 0..N {
        // pick the row with the largest magnitude in this column
        let mut pivot_row = col;
        for row in col + 1..N {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }

        let pivot = a[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < tol {
            return Err(pivot.abs() / scale);
        }

        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..N {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // back substitution
    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let mut acc = b[row];
        for k in row + 1..N {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }

    Ok(x)
}
