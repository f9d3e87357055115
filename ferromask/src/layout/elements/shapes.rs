//! Rectangles and octagons.

use maskgeom::{Dims, Point, Polygon, Rect};

/// The default fraction of each side cut back to form an octagon's corners.
pub const DEFAULT_OCTAGON_RATIO: f64 = 1. / 6.;

/// Returns a rectangle of size `dims` centered on `origin`.
pub fn rectangle(dims: impl Into<Dims>, origin: Point) -> Polygon {
    Rect::from_center(origin, dims.into()).to_poly()
}

/// Returns an octagon of size `dims` centered on `origin`.
///
/// The flat top and bottom edges span `±2·w·ratio_x`; the flat side edges span
/// `±2·h·ratio_y`. Ratios are not validated: values above 1/4 produce a
/// self-intersecting outline.
pub fn octagon(dims: impl Into<Dims>, origin: Point, ratio_x: f64, ratio_y: f64) -> Polygon {
    let dims = dims.into();
    let (w, h) = (dims.w(), dims.h());
    let (cx, cy) = (2. * w * ratio_x, 2. * h * ratio_y);
    let pts = [
        (cx, h / 2.),
        (w / 2., cy),
        (w / 2., -cy),
        (cx, -h / 2.),
        (-cx, -h / 2.),
        (-w / 2., -cy),
        (-w / 2., cy),
        (-cx, h / 2.),
    ];
    Polygon::new(
        pts.iter()
            .map(|&(x, y)| origin + Point::new(x, y))
            .collect::<Vec<_>>(),
    )
}

/// Returns a square octagon of side `size` with the default corner ratio.
#[inline]
pub fn regular_octagon(size: f64, origin: Point) -> Polygon {
    octagon(Dims::square(size), origin, DEFAULT_OCTAGON_RATIO, DEFAULT_OCTAGON_RATIO)
}
