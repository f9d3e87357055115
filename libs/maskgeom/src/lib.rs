//! Core geometric types and their operations/attributes.
//!
//! All coordinates are real-valued microns. Boolean operations, offsetting and
//! fracturing live in [`ops`]; the built-in polygon font lives in [`text`].

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use transform::Translate;

use self::bbox::{Bbox, BoundBox};

pub mod bbox;
pub mod ops;
pub mod ring;
pub mod text;
pub mod transform;

/// Tolerance used for on-boundary and degeneracy checks.
pub const EPSILON: f64 = 1e-9;

/// A point in two-dimensional layout-space.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, (0, 0).
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0., y: 0. }
    }

    /// Returns `true` if both coordinates are within [`EPSILON`] of `other`.
    pub fn approx_eq(&self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign<Point> for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub<Point> for Point {
    type Output = Self;
    fn sub(self, rhs: Point) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::SubAssign<Point> for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::Neg for Point {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self {
            x: value[0],
            y: value[1],
        }
    }
}

/// An enumeration of axis-aligned directions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum Dir {
    /// The horizontal, or x-aligned, direction.
    Horiz,
    /// The vertical, or y-aligned, direction.
    Vert,
}

/// A horizontal and vertical rectangular dimension with no specified location.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize, Deserialize)]
pub struct Dims {
    /// The width dimension.
    w: f64,
    /// The height dimension.
    h: f64,
}

impl Dims {
    /// Creates a new [`Dims`] from a width and height.
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
    /// Creates a square [`Dims`] with side length `side`.
    pub fn square(side: f64) -> Self {
        Self { w: side, h: side }
    }
    #[inline]
    pub fn w(&self) -> f64 {
        self.w
    }
    #[inline]
    pub fn h(&self) -> f64 {
        self.h
    }
    /// Returns the smaller of the two dimensions.
    pub fn min(&self) -> f64 {
        self.w.min(self.h)
    }
}

impl From<(f64, f64)> for Dims {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// An open-ended geometric path with non-zero width.
///
/// Primarily consists of a series of ordered [`Point`]s. Ends are flush with the
/// first and last points; interior corners are mitered.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub points: Vec<Point>,
    pub width: f64,
}

impl Path {
    pub fn new(points: impl Into<Vec<Point>>, width: f64) -> Self {
        Self {
            points: points.into(),
            width,
        }
    }
}

/// A closed n-sided polygon with arbitrary number of vertices and optional holes.
///
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end. The same holds for each hole.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
    #[serde(default)]
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    /// Creates a hole-free polygon.
    pub fn new(points: impl Into<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(points: impl Into<Vec<Point>>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            points: points.into(),
            holes,
        }
    }

    /// The enclosed area: the exterior's area less that of every hole.
    pub fn area(&self) -> f64 {
        ring_area(&self.points).abs() - self.holes.iter().map(|h| ring_area(h).abs()).sum::<f64>()
    }

    /// Returns `true` if the polygon has fewer than three vertices or no area.
    pub fn is_empty(&self) -> bool {
        self.points.len() < 3 || self.area() <= EPSILON
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }
}

/// Signed shoelace area of a closed ring; positive for counter-clockwise rings.
pub(crate) fn ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.;
    }
    let mut acc = 0.;
    for idx in 0..ring.len() {
        let (a, b) = (ring[idx], ring[(idx + 1) % ring.len()]);
        acc += a.x * b.y - b.x * a.y;
    }
    acc / 2.
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingHit {
    Outside,
    Boundary,
    Inside,
}

fn on_segment(a: Point, b: Point, pt: Point) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let cross = dx * (pt.y - a.y) - dy * (pt.x - a.x);
    if len2 <= EPSILON * EPSILON {
        return a.approx_eq(pt);
    }
    if cross.abs() > EPSILON * len2.sqrt() {
        return false;
    }
    let dot = dx * (pt.x - a.x) + dy * (pt.y - a.y);
    dot >= -EPSILON && dot <= len2 + EPSILON
}

/// Winding-number containment test for a single closed ring.
fn ring_hit(ring: &[Point], pt: Point) -> RingHit {
    if ring.len() < 3 || !ring.bbox().contains(pt) {
        return RingHit::Outside;
    }
    let mut winding_num: isize = 0;
    for idx in 0..ring.len() {
        // Note these accesses go one past `ring.len`, closing the ring back at its first point.
        let (past, next) = (ring[idx], ring[(idx + 1) % ring.len()]);
        if on_segment(past, next, pt) {
            return RingHit::Boundary;
        }
        // Half-open in y, so vertices shared by two edges are counted once.
        if (past.y <= pt.y) != (next.y <= pt.y) {
            let xsolve = (next.x - past.x) * (pt.y - past.y) / (next.y - past.y) + past.x;
            if xsolve > pt.x {
                if next.y > past.y {
                    winding_num += 1;
                } else {
                    winding_num -= 1;
                }
            }
        }
    }
    if winding_num != 0 {
        RingHit::Inside
    } else {
        RingHit::Outside
    }
}

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Rect {
    /// The lower-left corner.
    pub p0: Point,
    /// The upper-right corner.
    pub p1: Point,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates a rectangle of the given dimensions centered on `center`.
    pub fn from_center(center: Point, dims: Dims) -> Self {
        let half = Point::new(dims.w() / 2., dims.h() / 2.);
        Self::new(center - half, center + half)
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }

    /// Returns the bottom y-coordinate of the rectangle.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.p0.y
    }

    /// Returns the top y-coordinate of the rectangle.
    #[inline]
    pub fn top(&self) -> f64 {
        self.p1.y
    }

    /// Returns the left x-coordinate of the rectangle.
    #[inline]
    pub fn left(&self) -> f64 {
        self.p0.x
    }

    /// Returns the right x-coordinate of the rectangle.
    #[inline]
    pub fn right(&self) -> f64 {
        self.p1.x
    }

    /// Returns a copy of the rectangle grown by `delta` on every side.
    pub fn expand(&self, delta: f64) -> Self {
        Self::new(
            Point::new(self.p0.x - delta, self.p0.y - delta),
            Point::new(self.p1.x + delta, self.p1.y + delta),
        )
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.width(), self.height())
    }

    /// Converts the rectangle to a counter-clockwise four-sided [`Polygon`].
    pub fn to_poly(&self) -> Polygon {
        Polygon::new(vec![
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ])
    }
}

impl From<Bbox> for Rect {
    fn from(b: Bbox) -> Self {
        Self::new(b.p0, b.p1)
    }
}

/// An enumeration of geometric shapes and their properties.
///
/// Variants include [`Rect`], [`Polygon`], and [`Path`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
}

impl Translate for Shape {
    fn translate(&mut self, p: Point) {
        match self {
            Self::Rect(s) => s.translate(p),
            Self::Polygon(s) => s.translate(p),
            Self::Path(s) => s.translate(p),
        }
    }
}

impl Shape {
    pub fn as_rect(&self) -> Option<Rect> {
        if let Shape::Rect(rect) = self {
            Some(*rect)
        } else {
            None
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        if let Shape::Polygon(poly) = self {
            Some(poly)
        } else {
            None
        }
    }
}

/// Common shape operations, dispatched from the [`Shape`] enum to its variants by [mod@enum_dispatch].
#[enum_dispatch]
pub trait ShapeTrait {
    /// Returns `true` if the [`Shape`] contains [`Point`] `pt`.
    ///
    /// Containment is *inclusive* for all [`Shape`] types.
    /// [`Point`]s on their boundary, which generally include all points specifying the shape itself, are regarded throughout as "inside" the shape.
    fn contains(&self, pt: Point) -> bool;
    /// Converts the shape to [`Polygon`]s, the most general of shapes.
    fn to_polys(&self) -> Vec<Polygon>;
}

impl ShapeTrait for Rect {
    fn contains(&self, pt: Point) -> bool {
        self.bbox().contains(pt)
    }
    fn to_polys(&self) -> Vec<Polygon> {
        vec![self.to_poly()]
    }
}

impl ShapeTrait for Polygon {
    fn contains(&self, pt: Point) -> bool {
        match ring_hit(&self.points, pt) {
            RingHit::Outside => false,
            RingHit::Boundary => true,
            // Hole edges belong to the polygon; only a hole's interior is excluded.
            RingHit::Inside => self
                .holes
                .iter()
                .all(|hole| ring_hit(hole, pt) != RingHit::Inside),
        }
    }
    fn to_polys(&self) -> Vec<Polygon> {
        vec![self.clone()]
    }
}

impl ShapeTrait for Path {
    fn contains(&self, pt: Point) -> bool {
        self.to_polys().iter().any(|poly| poly.contains(pt))
    }
    fn to_polys(&self) -> Vec<Polygon> {
        ops::path_to_polygons(self)
    }
}
