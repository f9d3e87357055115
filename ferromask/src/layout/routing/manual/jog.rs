//! Routing jogs.

use std::fmt::Display;
use std::str::FromStr;

use derive_builder::Builder;
use maskgeom::{Dir, Path, Point};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorSource, MaskError, Result};
use crate::layout::cell::Element;
use crate::layout::layers::GdsLayerSpec;

/// The leg order of a two-segment Manhattan route.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteMode {
    /// Horizontal first, then vertical (`-|`).
    #[default]
    #[serde(rename = "-|")]
    HorizVert,
    /// Vertical first, then horizontal (`|-`).
    #[serde(rename = "|-")]
    VertHoriz,
}

impl RouteMode {
    /// The direction of the first leg.
    pub fn first(&self) -> Dir {
        match self {
            Self::HorizVert => Dir::Horiz,
            Self::VertHoriz => Dir::Vert,
        }
    }
}

impl FromStr for RouteMode {
    type Err = MaskError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "-|" | "horizontal-then-vertical" => Ok(Self::HorizVert),
            "|-" | "vertical-then-horizontal" => Ok(Self::VertHoriz),
            _ => Err(ErrorSource::InvalidRoutingMode(s.to_string()).into()),
        }
    }
}

impl Display for RouteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HorizVert => write!(f, "-|"),
            Self::VertHoriz => write!(f, "|-"),
        }
    }
}

/// Connects `p0` to `p1` with one right-angle corner.
///
/// Always returns exactly three points; either leg may have zero length.
pub fn route_90deg(p0: Point, p1: Point, mode: RouteMode) -> [Point; 3] {
    let corner = match mode.first() {
        Dir::Horiz => Point::new(p1.x, p0.y),
        Dir::Vert => Point::new(p0.x, p1.y),
    };
    [p0, corner, p1]
}

/// A stroked wire along a sequence of points.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Wire {
    #[builder(setter(into))]
    points: Vec<Point>,
    width: f64,
    layer: GdsLayerSpec,
}

impl Wire {
    #[inline]
    pub fn builder() -> WireBuilder {
        WireBuilder::default()
    }

    /// Creates a wire of width `width` on `layer`.
    pub fn new(points: impl Into<Vec<Point>>, width: f64, layer: GdsLayerSpec) -> Self {
        Self {
            points: points.into(),
            width,
            layer,
        }
    }

    /// Creates the wire's [`Element`].
    pub fn generate(&self) -> Element {
        Element::new(self.layer, Path::new(self.points.clone(), self.width))
    }
}

impl From<Wire> for Element {
    fn from(value: Wire) -> Self {
        value.generate()
    }
}

#[cfg(test)]
mod tests {
    use maskgeom::bbox::BoundBox;

    use super::*;

    #[test]
    fn test_route_corners() {
        let p0 = Point::new(0., 0.);
        let p1 = Point::new(10., 5.);
        let hv = route_90deg(p0, p1, "-|".parse().unwrap());
        assert_eq!(hv, [p0, Point::new(10., 0.), p1]);
        let vh = route_90deg(p0, p1, "|-".parse().unwrap());
        assert_eq!(vh, [p0, Point::new(0., 5.), p1]);
    }

    #[test]
    fn test_route_degenerate_legs() {
        let p0 = Point::new(-16., 0.);
        let p1 = Point::new(-51., 0.);
        let pts = route_90deg(p0, p1, RouteMode::HorizVert);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1], p1);
    }

    #[test]
    fn test_long_form_modes() {
        assert_eq!(
            "vertical-then-horizontal".parse::<RouteMode>().unwrap(),
            RouteMode::VertHoriz
        );
        assert_eq!(RouteMode::HorizVert.to_string(), "-|");
    }

    #[test]
    fn test_unknown_mode() {
        let err = "||".parse::<RouteMode>().unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidRoutingMode(m) if m == "||"));
    }

    #[test]
    fn test_wire_element() {
        let wire = Wire::builder()
            .points(route_90deg(
                Point::zero(),
                Point::new(10., 10.),
                RouteMode::VertHoriz,
            ))
            .width(2.)
            .layer(GdsLayerSpec(10, 0))
            .build()
            .unwrap();
        let elem = wire.generate();
        assert_eq!(elem.layer, GdsLayerSpec(10, 0));
        let bbox = elem.bbox();
        assert_eq!(bbox.p0, Point::new(-1., -1.));
        assert_eq!(bbox.p1, Point::new(11., 11.));
    }
}
