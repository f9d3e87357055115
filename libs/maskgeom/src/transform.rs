//! Translation traits.
//!
//! Cell placement is translation-only, so these are the only transforms layout
//! objects need.

use super::{Path, Point, Polygon, Rect};

/// A trait for specifying how an object is translated by a [`Point`].
pub trait Translate {
    /// Translates the shape by a [`Point`] through mutation.
    fn translate(&mut self, p: Point);
}

impl Translate for Point {
    fn translate(&mut self, p: Point) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl Translate for Rect {
    fn translate(&mut self, p: Point) {
        self.p0.translate(p);
        self.p1.translate(p);
    }
}

impl Translate for Polygon {
    fn translate(&mut self, p: Point) {
        for pt in self.points.iter_mut() {
            pt.translate(p);
        }
        for pt in self.holes.iter_mut().flatten() {
            pt.translate(p);
        }
    }
}

impl Translate for Path {
    fn translate(&mut self, p: Point) {
        for pt in self.points.iter_mut() {
            pt.translate(p);
        }
    }
}

impl<T: Translate> Translate for Vec<T> {
    fn translate(&mut self, p: Point) {
        for item in self.iter_mut() {
            item.translate(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_polygon_moves_holes() {
        let mut poly = Polygon::with_holes(
            Rect::new(Point::zero(), Point::new(4., 4.)).to_poly().points,
            vec![Rect::new(Point::new(1., 1.), Point::new(2., 2.)).to_poly().points],
        );
        poly.translate(Point::new(10., -1.));
        assert_eq!(poly.points[0], Point::new(10., -1.));
        assert_eq!(poly.holes[0][0], Point::new(11., 0.));
    }
}
