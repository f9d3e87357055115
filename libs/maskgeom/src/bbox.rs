//! Rectangular bounding boxes and associated trait implementations.

use serde::{Deserialize, Serialize};

use super::{Path, Point, Polygon, Rect, Shape};

/// An axis-aligned rectangular bounding box.
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
/// This differs from [`Rect`] in that it could be empty, meaning that `p0`
/// is to the upper right of `p1`.
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq)]
pub struct Bbox {
    pub p0: Point,
    pub p1: Point,
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    /// Create a new [`Bbox`] from two [`Point`]s.
    #[inline]
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
    /// Finds the width of the bounding box in the x-direction.
    #[inline]
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }
    /// Finds the height of the bounding box in the y-direction.
    #[inline]
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }
    /// Creates a new [`Bbox`] from a single [`Point`].
    ///
    /// The resultant [`Bbox`] comprises solely of the point, having zero area.
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Creates an empty, otherwise invalid bounding box.
    pub fn empty() -> Self {
        Self {
            p0: Point::new(f64::INFINITY, f64::INFINITY),
            p1: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
    /// Returns `true` if the bounding box is empty.
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Returns true if [`Point`] `pt` lies inside the bounding box.
    pub fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// Returns true if [`Point`] `pt` lies strictly inside the bounding box.
    pub fn contains_strictly(&self, pt: Point) -> bool {
        self.p0.x < pt.x && self.p1.x > pt.x && self.p0.y < pt.y && self.p1.y > pt.y
    }
    /// Expands an existing [`Bbox`] in all directions by `delta`.
    pub fn expand(&mut self, delta: f64) {
        if self.is_empty() {
            return;
        }
        self.p0.x -= delta;
        self.p0.y -= delta;
        self.p1.x += delta;
        self.p1.y += delta;
    }
    /// Returns the bounding box's center.
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }

    /// Converts a bounding box into a [`Rect`].
    #[inline]
    pub fn into_rect(self) -> Rect {
        Rect::from(self)
    }
}

impl From<Rect> for Bbox {
    fn from(r: Rect) -> Self {
        Self { p0: r.p0, p1: r.p1 }
    }
}

/// A trait representing functions available for objects with a bounding box.
pub trait BoundBox {
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> Bbox;
    /// The bounding box of `self` and `bbox` together.
    fn union(&self, bbox: Bbox) -> Bbox {
        self.bbox().union(bbox)
    }
}

impl BoundBox for Bbox {
    fn bbox(&self) -> Bbox {
        *self
    }
    fn union(&self, bbox: Bbox) -> Bbox {
        if bbox.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return bbox;
        }
        Bbox::new(
            Point::new(self.p0.x.min(bbox.p0.x), self.p0.y.min(bbox.p0.y)),
            Point::new(self.p1.x.max(bbox.p1.x), self.p1.y.max(bbox.p1.y)),
        )
    }
}

impl BoundBox for Point {
    fn bbox(&self) -> Bbox {
        Bbox::from_point(*self)
    }
}

impl BoundBox for Shape {
    fn bbox(&self) -> Bbox {
        match self {
            Shape::Rect(r) => r.bbox(),
            Shape::Polygon(p) => p.bbox(),
            Shape::Path(p) => p.bbox(),
        }
    }
}

impl BoundBox for Rect {
    fn bbox(&self) -> Bbox {
        Bbox::new(self.p0, self.p1)
    }
}

impl BoundBox for Polygon {
    fn bbox(&self) -> Bbox {
        // Holes lie within the exterior ring.
        self.points.bbox()
    }
}

impl BoundBox for Path {
    fn bbox(&self) -> Bbox {
        let mut bbox = self.points.bbox();
        bbox.expand(self.width / 2.);
        bbox
    }
}

impl BoundBox for [Point] {
    fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::empty();
        for pt in self {
            bbox = bbox.union(pt.bbox());
        }
        bbox
    }
}

impl BoundBox for Vec<Point> {
    fn bbox(&self) -> Bbox {
        self.as_slice().bbox()
    }
}

impl BoundBox for [Polygon] {
    fn bbox(&self) -> Bbox {
        self.iter().fold(Bbox::empty(), |acc, poly| acc.union(poly.bbox()))
    }
}

impl BoundBox for Vec<Polygon> {
    fn bbox(&self) -> Bbox {
        self.as_slice().bbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bbox_is_identity_for_union() {
        let b = Bbox::new(Point::new(1., 2.), Point::new(-1., 0.));
        assert_eq!(Bbox::empty().union(b), b);
        assert_eq!(b.union(Bbox::empty()), b);
        assert!(Bbox::empty().is_empty());
    }

    #[test]
    fn polygons_bbox() {
        let polys = vec![
            Rect::new(Point::new(0., 0.), Point::new(1., 1.)).to_poly(),
            Rect::new(Point::new(3., -2.), Point::new(4., 0.)).to_poly(),
        ];
        let bbox = polys.bbox();
        assert_eq!(bbox.p0, Point::new(0., -2.));
        assert_eq!(bbox.p1, Point::new(4., 1.));
        assert_eq!(bbox.center(), Point::new(2., -0.5));
    }
}
