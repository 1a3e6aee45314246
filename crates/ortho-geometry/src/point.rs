use serde::{Deserialize, Serialize};

/// A point in image space.
///
/// Serialized as a two element array `[x, y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2d {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2d {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2d) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point2d {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Point2d> for [f64; 2] {
    fn from(p: Point2d) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point2d {
    fn from(p: (f64, f64)) -> Self {
        Self { x: p.0, y: p.1 }
    }
}

/// Real-world extent of a raster.
///
/// Carried as metadata next to the rectified image; the transform math never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x coordinate.
    pub xmin: f64,
    /// Maximum x coordinate.
    pub xmax: f64,
    /// Minimum y coordinate.
    pub ymin: f64,
    /// Maximum y coordinate.
    pub ymax: f64,
}

impl BoundingBox {
    /// Create a bounding box from its minimum and maximum corners.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Whether the extent is finite and has a positive area.
    pub fn is_valid(&self) -> bool {
        [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite())
            && self.xmax > self.xmin
            && self.ymax > self.ymin
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Ground units covered by one pixel along x and y for a raster of `width`x`height` pixels.
    pub fn ground_resolution(&self, width: usize, height: usize) -> Option<(f64, f64)> {
        if width == 0 || height == 0 || !self.is_valid() {
            return None;
        }
        Some((self.width() / width as f64, self.height() / height as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_serde_as_array() -> Result<(), serde_json::Error> {
        let p = Point2d::new(1.5, -2.0);
        let json = serde_json::to_string(&p)?;
        assert_eq!(json, "[1.5,-2.0]");
        let back: Point2d = serde_json::from_str("[3, 4]")?;
        assert_eq!(back, Point2d::new(3.0, 4.0));
        assert_relative_eq!(back.distance(&Point2d::default()), 5.0);
        Ok(())
    }

    #[test]
    fn bbox_resolution() {
        let bbox = BoundingBox::new(1000.0, 2000.0, 1100.0, 2050.0);
        assert!(bbox.is_valid());
        let (rx, ry) = bbox.ground_resolution(200, 100).unwrap();
        assert_relative_eq!(rx, 0.5);
        assert_relative_eq!(ry, 0.5);

        let flipped = BoundingBox::new(10.0, 0.0, 5.0, 1.0);
        assert!(!flipped.is_valid());
        assert!(flipped.ground_resolution(10, 10).is_none());
        assert!(bbox.ground_resolution(0, 10).is_none());
    }
}
