use serde::{Deserialize, Serialize};

/// A 2D point in world (canvas) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Raw corner bounds as supplied by the shape layer: `{x1, y1, x2, y2}`.
///
/// Corners may arrive in any order; [`Bounds::to_bbox`] normalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Bounds {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Normalize into a [`BoundingBox`], or `None` if any coordinate is NaN or infinite.
    pub fn to_bbox(&self) -> Option<BoundingBox> {
        // min/max swallow a NaN operand, so check the raw corners first.
        if ![self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite()) {
            return None;
        }
        let bbox = BoundingBox::from_corners(self.x1, self.y1, self.x2, self.y2);
        bbox.is_finite().then_some(bbox)
    }
}

/// An axis-aligned bounding box. Width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(x, y, x + width, y + height)
    }

    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let min_x = x1.min(x2);
        let min_y = y1.min(y2);
        Self {
            x: min_x,
            y: min_y,
            width: x1.max(x2) - min_x,
            height: y1.max(y2) - min_y,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Whether `other` lies entirely inside this box (edges inclusive).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    /// Closed-interval overlap test: boxes that touch on an edge intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x() <= other.max_x()
            && self.max_x() >= other.min_x()
            && self.min_y() <= other.max_y()
            && self.max_y() >= other.min_y()
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::from_corners(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Self {
        Self::from_corners(
            self.min_x() - amount,
            self.min_y() - amount,
            self.max_x() + amount,
            self.max_y() + amount,
        )
    }

    /// Split at the midpoint into NW, NE, SW, SE quadrants.
    pub fn quadrants(&self) -> [BoundingBox; 4] {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let mid_x = self.x + half_w;
        let mid_y = self.y + half_h;
        [
            BoundingBox::new(self.x, self.y, half_w, half_h),
            BoundingBox::new(mid_x, self.y, half_w, half_h),
            BoundingBox::new(self.x, mid_y, half_w, half_h),
            BoundingBox::new(mid_x, mid_y, half_w, half_h),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_corners_normalized() {
        let bb = BoundingBox::from_corners(10.0, 20.0, 0.0, 5.0);
        assert_eq!(bb.x, 0.0);
        assert_eq!(bb.y, 5.0);
        assert_eq!(bb.width, 10.0);
        assert_eq!(bb.height, 15.0);
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        let c = BoundingBox::new(20.0, 20.0, 10.0, 10.0);
        let touching = BoundingBox::new(10.0, 0.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
    }

    #[test]
    fn test_non_finite_bounds_rejected() {
        assert!(Bounds::new(0.0, 0.0, f64::NAN, 1.0).to_bbox().is_none());
        assert!(Bounds::new(f64::NAN, 0.0, 1.0, 1.0).to_bbox().is_none());
        assert!(Bounds::new(0.0, 0.0, 1.0, f64::NAN).to_bbox().is_none());
        assert!(Bounds::new(0.0, f64::INFINITY, 1.0, 1.0).to_bbox().is_none());
        assert!(Bounds::new(0.0, 0.0, 1.0, 1.0).to_bbox().is_some());
    }

    #[test]
    fn test_quadrants_cover_parent() {
        let bb = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        let quads = bb.quadrants();
        assert_eq!(quads[3], BoundingBox::new(50.0, 25.0, 50.0, 25.0));
        let merged = quads.iter().skip(1).fold(quads[0], |acc, q| acc.union(q));
        assert_eq!(merged, bb);
    }

    #[test]
    fn test_expand() {
        let bb = BoundingBox::new(0.0, 0.0, 10.0, 10.0).expand(5.0);
        assert_eq!(bb, BoundingBox::new(-5.0, -5.0, 20.0, 20.0));
    }
}
