use crate::error::Degeneracy;
use crate::point::Point2d;

/// Similarity transform moving a point set to its centroid and scaling it to
/// a mean distance of `sqrt(2)` (Hartley normalization).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Normalization {
    cx: f64,
    cy: f64,
    scale: f64,
}

impl Normalization {
    /// The transform as a homogeneous matrix.
    pub(super) fn matrix(&self) -> [[f64; 3]; 3] {
        let s = self.scale;
        [
            [s, 0.0, -s * self.cx],
            [0.0, s, -s * self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// The inverse transform, computed in closed form.
    pub(super) fn inverse(&self) -> [[f64; 3]; 3] {
        let inv_s = 1.0 / self.scale;
        [
            [inv_s, 0.0, self.cx],
            [0.0, inv_s, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    fn apply(&self, p: &Point2d) -> Point2d {
        Point2d::new(
            self.scale * (p.x - self.cx),
            self.scale * (p.y - self.cy),
        )
    }
}

pub(super) fn normalize_points(
    pts: &[Point2d],
) -> Result<(Vec<Point2d>, Normalization), Degeneracy> {
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = pts
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / n;

    if mean_dist <= f64::EPSILON * (1.0 + cx.abs() + cy.abs()) {
        return Err(Degeneracy::Coincident);
    }

    let t = Normalization {
        cx,
        cy,
        scale: std::f64::consts::SQRT_2 / mean_dist,
    };
    log::debug!(
        "hartley normalization: centroid ({cx:.3}, {cy:.3}), scale {:.6e}",
        t.scale
    );

    Ok((pts.iter().map(|p| t.apply(p)).collect(), t))
}

/// Twice the signed area of the triangle `a b c`.
fn doubled_area(a: &Point2d, b: &Point2d, c: &Point2d) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether any three of the points are collinear within `eps`.
pub(super) fn any_three_collinear(pts: &[Point2d], eps: f64) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if doubled_area(&pts[i], &pts[j], &pts[k]).abs() < eps {
                    return true;
                }
            }
        }
    }
    false
}

/// Indices of four points no three of which are collinear within `eps`.
///
/// Spans a triangle from the farthest pair and the point farthest off their
/// line, then takes the point farthest off all three sides. When every other
/// point lies on a side, two of them replace a vertex pair.
pub(super) fn general_position_quad(pts: &[Point2d], eps: f64) -> Option<[usize; 4]> {
    let n = pts.len();

    let mut farthest = None;
    let mut max_dist = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            let d = pts[i].distance(&pts[j]);
            if d > max_dist {
                max_dist = d;
                farthest = Some((i, j));
            }
        }
    }
    let (i, j) = farthest?;

    let area = |a: usize, b: usize, c: usize| doubled_area(&pts[a], &pts[b], &pts[c]).abs();
    let k = (0..n).max_by(|&a, &b| area(i, j, a).total_cmp(&area(i, j, b)))?;
    if area(i, j, k) < eps {
        return None;
    }

    let sides = [(i, j), (j, k), (i, k)];
    let rest: Vec<usize> = (0..n).filter(|l| ![i, j, k].contains(l)).collect();
    let off_sides = |l: usize| {
        sides
            .iter()
            .map(|&(a, b)| area(a, b, l))
            .fold(f64::INFINITY, f64::min)
    };
    let (l, spread) = rest
        .iter()
        .map(|&l| (l, off_sides(l)))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    if spread >= eps {
        return Some([i, j, k, l]);
    }

    // every remaining point sits on a side of the triangle
    for (a, &p) in rest.iter().enumerate() {
        for &q in &rest[a + 1..] {
            for &(u, v) in &sides {
                let quad = [p, q, u, v];
                if !any_three_collinear(&quad.map(|m| pts[m]), eps) {
                    return Some(quad);
                }
            }
        }
    }
    None
}
