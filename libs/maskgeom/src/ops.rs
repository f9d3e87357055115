//! Polygon boolean operations, offsetting and fracturing.
//!
//! Thin adapters over the [`geo`] boolean-ops engine. Inputs may overlap
//! arbitrarily; every result is a set of non-overlapping polygons, possibly with holes.

use geo::{BooleanOps, ConvexHull, Coord, LineString, MultiPoint, MultiPolygon};
use itertools::Itertools;

use crate::bbox::BoundBox;
use crate::{Path, Point, Polygon, Rect, EPSILON};

type GeoPolygon = geo::Polygon<f64>;

fn to_coords(ring: &[Point]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|pt| Coord { x: pt.x, y: pt.y })
            .collect::<Vec<_>>(),
    )
}

fn from_coords(ring: &LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = ring.coords().map(|c| Point::new(c.x, c.y)).collect();
    // geo rings repeat their first point at the end.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

pub(crate) fn to_geo(poly: &Polygon) -> GeoPolygon {
    GeoPolygon::new(
        to_coords(&poly.points),
        poly.holes.iter().map(|hole| to_coords(hole)).collect(),
    )
}

pub(crate) fn from_geo(poly: &GeoPolygon) -> Polygon {
    Polygon::with_holes(
        from_coords(poly.exterior()),
        poly.interiors().iter().map(from_coords).collect(),
    )
}

fn from_multi(multi: MultiPolygon<f64>) -> Vec<Polygon> {
    multi
        .0
        .iter()
        .map(from_geo)
        .filter(|poly| !poly.is_empty())
        .collect()
}

/// Unions a list of (possibly overlapping) multipolygons pairwise, as a balanced tree.
fn union_multi(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len() / 2 + 1);
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

fn merged(polys: &[Polygon]) -> MultiPolygon<f64> {
    union_multi(
        polys
            .iter()
            .filter(|poly| !poly.is_empty())
            .map(|poly| MultiPolygon::new(vec![to_geo(poly)]))
            .collect(),
    )
}

/// Boolean union of every polygon in `polys`.
///
/// Touching or overlapping inputs are fused; the output polygons are pairwise disjoint.
pub fn union(polys: &[Polygon]) -> Vec<Polygon> {
    from_multi(merged(polys))
}

/// The region covered by `a` but not by `b`.
pub fn difference(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    let a = merged(a);
    if b.is_empty() {
        return from_multi(a);
    }
    from_multi(a.difference(&merged(b)))
}

/// The region covered by both `a` and `b`.
pub fn intersection(a: &[Polygon], b: &[Polygon]) -> Vec<Polygon> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    from_multi(merged(a).intersection(&merged(b)))
}

/// Total enclosed area of a set of polygons. Overlaps are counted once.
pub fn area(polys: &[Polygon]) -> f64 {
    union(polys).iter().map(Polygon::area).sum()
}

/// Vertices of a regular octagon centered at the origin whose flat sides lie at distance `apothem`.
fn octagon_kernel(apothem: f64) -> Vec<Point> {
    let step = std::f64::consts::FRAC_PI_4;
    let radius = apothem / (step / 2.).cos();
    (0..8)
        .map(|k| {
            let angle = step / 2. + step * k as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Convex region swept by `kernel` as it slides along the segment from `a` to `b`.
fn edge_sweep(a: Point, b: Point, kernel: &[Point]) -> MultiPolygon<f64> {
    let coords: Vec<Coord<f64>> = kernel
        .iter()
        .flat_map(|k| [*k + a, *k + b])
        .map(|pt| Coord { x: pt.x, y: pt.y })
        .collect();
    MultiPolygon::new(vec![MultiPoint::from(coords).convex_hull()])
}

/// Offsets the boundary of `polys` by `distance`.
///
/// Positive distances grow the region, negative distances shrink it. The growth is the
/// Minkowski sum with a regular octagon, so straight edges move by exactly `distance`
/// and convex corners are chamfered.
pub fn offset(polys: &[Polygon], distance: f64) -> Vec<Polygon> {
    if distance.abs() <= EPSILON {
        return union(polys);
    }
    let kernel = octagon_kernel(distance.abs());
    let mut sweeps = Vec::new();
    for poly in polys.iter().filter(|poly| !poly.is_empty()) {
        for ring in std::iter::once(&poly.points).chain(poly.holes.iter()) {
            for (a, b) in ring.iter().circular_tuple_windows() {
                sweeps.push(edge_sweep(*a, *b, &kernel));
            }
        }
    }
    let band = union_multi(sweeps);
    if distance > 0. {
        from_multi(merged(polys).union(&band))
    } else {
        from_multi(merged(polys).difference(&band))
    }
}

/// Splits a polygon with holes into hole-free pieces covering the same region.
///
/// Each step cuts the polygon with a vertical line through the middle of its first hole,
/// which opens that hole into both halves.
pub fn fracture(poly: &Polygon) -> Vec<Polygon> {
    let Some(hole) = poly.holes.first() else {
        return vec![poly.clone()];
    };
    let xm = hole.bbox().center().x;
    let mut outer = poly.bbox();
    outer.expand(1.);
    let halves = [
        Rect::new(outer.p0, Point::new(xm, outer.p1.y)),
        Rect::new(Point::new(xm, outer.p0.y), outer.p1),
    ];
    let source = MultiPolygon::new(vec![to_geo(poly)]);
    halves
        .iter()
        .flat_map(|half| {
            let half = MultiPolygon::new(vec![to_geo(&half.to_poly())]);
            from_multi(source.intersection(&half))
        })
        .flat_map(|piece| fracture(&piece))
        .collect()
}

/// Converts a stroked [`Path`] to polygons.
///
/// Every segment becomes a rectangle of the path's width, flush with its end points.
/// Interior corners are filled with a miter, or a bevel for turns sharper than ~160 degrees.
pub fn path_to_polygons(path: &Path) -> Vec<Polygon> {
    let points: Vec<Point> = path
        .points
        .iter()
        .copied()
        .dedup_by(|a, b| a.approx_eq(*b))
        .collect();
    if points.len() < 2 || path.width <= EPSILON {
        return Vec::new();
    }
    let half = path.width / 2.;

    let unit = |a: Point, b: Point| {
        let d = b - a;
        d * (1. / (d.x * d.x + d.y * d.y).sqrt())
    };
    let normal = |d: Point| Point::new(-d.y, d.x);

    let mut pieces = Vec::with_capacity(2 * points.len());
    for (a, b) in points.iter().tuple_windows() {
        let n = normal(unit(*a, *b)) * half;
        pieces.push(Polygon::new(vec![*a - n, *b - n, *b + n, *a + n]));
    }
    for (a, p, b) in points.iter().tuple_windows() {
        let (d1, d2) = (unit(*a, *p), unit(*p, *b));
        let cross = d1.x * d2.y - d1.y * d2.x;
        if cross.abs() <= EPSILON {
            continue;
        }
        // The outer side of a left turn is the right-hand side.
        let side = if cross > 0. { -1. } else { 1. };
        let (n1, n2) = (normal(d1), normal(d2));
        let dot = n1.x * n2.x + n1.y * n2.y;
        let join = if 1. + dot > 0.03 {
            let miter = (n1 + n2) * (half / (1. + dot));
            vec![*p, *p + n1 * (side * half), *p + miter * side, *p + n2 * (side * half)]
        } else {
            vec![*p, *p + n1 * (side * half), *p + n2 * (side * half)]
        };
        pieces.push(Polygon::new(join));
    }
    union(&pieces)
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::{Dims, ShapeTrait};

    fn square(center: Point, side: f64) -> Polygon {
        Rect::from_center(center, Dims::square(side)).to_poly()
    }

    #[test]
    fn union_of_overlapping_squares() {
        let polys = vec![square(Point::zero(), 2.), square(Point::new(1., 0.), 2.)];
        let merged = union(&polys);
        assert_eq!(merged.len(), 1);
        assert_float_eq!(merged[0].area(), 6., abs <= 1e-9);
    }

    #[test]
    fn union_keeps_disjoint_regions() {
        let polys = vec![square(Point::zero(), 1.), square(Point::new(5., 0.), 1.)];
        assert_eq!(union(&polys).len(), 2);
    }

    #[test]
    fn union_is_idempotent() {
        let polys = vec![
            square(Point::zero(), 2.),
            square(Point::new(1.5, 1.5), 2.),
            square(Point::new(10., 0.), 1.),
        ];
        let once = union(&polys);
        let twice = union(&once);
        assert_eq!(once.len(), twice.len());
        assert_float_eq!(area(&once), area(&twice), abs <= 1e-9);
    }

    #[test]
    fn difference_punches_hole() {
        let outer = vec![square(Point::zero(), 10.)];
        let inner = vec![square(Point::zero(), 2.)];
        let diff = difference(&outer, &inner);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].holes.len(), 1);
        assert_float_eq!(diff[0].area(), 96., abs <= 1e-9);
        assert!(!diff[0].contains(Point::zero()));
    }

    #[test]
    fn intersection_of_offset_squares() {
        let a = vec![square(Point::zero(), 2.)];
        let b = vec![square(Point::new(1., 1.), 2.)];
        assert_float_eq!(area(&intersection(&a, &b)), 1., abs <= 1e-9);
        assert!(intersection(&a, &[]).is_empty());
    }

    #[test]
    fn offset_moves_straight_edges() {
        let polys = vec![square(Point::zero(), 10.)];
        let grown = offset(&polys, 1.);
        assert_eq!(grown.len(), 1);
        let bbox = grown.bbox();
        assert_float_eq!(bbox.width(), 12., abs <= 1e-6);
        assert_float_eq!(bbox.height(), 12., abs <= 1e-6);
        assert!(grown[0].contains(Point::new(5.9, 0.)));
        assert!(!grown[0].contains(Point::new(6.1, 0.)));

        let shrunk = offset(&polys, -1.);
        assert_float_eq!(shrunk.bbox().width(), 8., abs <= 1e-6);
    }

    #[test]
    fn fracture_removes_holes() {
        let donut = difference(&[square(Point::zero(), 10.)], &[square(Point::zero(), 2.)]);
        let pieces = fracture(&donut[0]);
        assert!(pieces.len() >= 2);
        assert!(pieces.iter().all(|p| p.holes.is_empty()));
        assert_float_eq!(pieces.iter().map(Polygon::area).sum::<f64>(), 96., abs <= 1e-6);
    }

    #[test]
    fn manhattan_path_has_square_corner() {
        let path = Path::new(
            vec![Point::zero(), Point::new(10., 0.), Point::new(10., 10.)],
            2.,
        );
        let polys = path_to_polygons(&path);
        assert_eq!(polys.len(), 1);
        // Two 10x2 legs overlap in a 1x1 square, and the miter adds the 1x1 outer corner.
        assert_float_eq!(polys[0].area(), 40., abs <= 1e-6);
        assert!(polys[0].contains(Point::new(10.9, -0.9)));
        assert!(polys[0].contains(Point::new(0., 0.)));
        assert!(!polys[0].contains(Point::new(-0.1, 0.)));
    }

    #[test]
    fn degenerate_path_segments_are_skipped() {
        let path = Path::new(
            vec![Point::zero(), Point::zero(), Point::new(0., 5.), Point::new(0., 5.)],
            1.,
        );
        let polys = path_to_polygons(&path);
        assert_eq!(polys.len(), 1);
        assert_float_eq!(polys[0].area(), 5., abs <= 1e-9);
        assert!(path_to_polygons(&Path::new(vec![Point::zero()], 1.)).is_empty());
    }
}
