//! The ferroelectric device stack.

use derive_builder::Builder;
use maskgeom::bbox::BoundBox;
use maskgeom::{ops, Dims, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::component::{um_to_nm, Component};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};
use crate::layout::cell::Instance;
use crate::layout::context::LayoutCtx;
use crate::layout::elements::shapes::octagon;
use crate::layout::routing::manual::jog::Wire;
use crate::log::debug;

/// The smallest device extent.
pub const MIN_EXTENT: (f64, f64) = (40., 20.);

/// Device stack parameters, in microns.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
pub struct FerroDeviceParams {
    /// Side of the mesa octagon.
    pub mesa: f64,
    /// Side of the terminal vias. Defaults to the coarse clearance.
    #[builder(default, setter(strip_option))]
    pub via: Option<f64>,
    /// Outline the terminals are placed in.
    ///
    /// When unset, the smallest feasible extent no smaller than [`MIN_EXTENT`] is used.
    #[builder(default, setter(strip_option, into))]
    pub extent: Option<Dims>,
    /// Shorts the ferroelectric layer with a copy on the lower metal.
    #[builder(default)]
    pub short: bool,
}

impl FerroDeviceParams {
    #[inline]
    pub fn builder() -> FerroDeviceParamsBuilder {
        FerroDeviceParamsBuilder::default()
    }

    /// A device with the given mesa and every other parameter defaulted.
    pub fn with_mesa(mesa: f64) -> Self {
        Self {
            mesa,
            via: None,
            extent: None,
            short: false,
        }
    }
}

/// A ferroelectric device: a mesa bridged to a top terminal, beside a bottom terminal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FerroDevice {
    mesa: f64,
    via: f64,
    extent: Dims,
    short: bool,
}

/// A placed device and its terminals, relative to the instance origin.
#[derive(Debug, Clone)]
pub struct DeviceConnections {
    pub inst: Instance,
    pub bottom: Point,
    pub top: Point,
}

impl FerroDevice {
    /// The narrowest extent that fits a via of side `via` beside a mesa of side `mesa`.
    pub fn min_width(mesa: f64, via: f64, clearance: f64) -> f64 {
        2. * via + 14. * clearance + mesa
    }

    #[inline]
    pub fn extent(&self) -> Dims {
        self.extent
    }

    /// The top electrode terminal.
    pub fn top(&self, clearance: f64) -> Point {
        Point::new(-self.extent.w() / 2. + self.via + 4. * clearance, 0.)
    }

    /// The bottom electrode terminal.
    pub fn bottom(&self, clearance: f64) -> Point {
        Point::new(self.extent.w() / 2. - self.via - 4. * clearance, 0.)
    }
}

impl Component for FerroDevice {
    type Params = FerroDeviceParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        let rules = ctx.rules();
        let c = rules.coarse_clearance;
        let mesa = params.mesa;
        let via = params.via.unwrap_or(c);
        let feasible = via.is_finite() && mesa.is_finite();
        if !(feasible && via > 0. && mesa > 2. * rules.fine_clearance) {
            return Err(ErrorSource::Dimension(format!(
                "mesa {mesa} um and via {via} um must both be positive and the mesa must exceed twice the fine clearance"
            ))
            .into());
        }

        let min_width = Self::min_width(mesa, via, c);
        let extent = match params.extent {
            Some(extent) => {
                let (w, h) = (extent.w(), extent.h());
                if !(w.is_finite() && h.is_finite() && w >= min_width && h > 0.) {
                    return Err(ErrorSource::Dimension(format!(
                        "mesa {mesa} um with via {via} um needs a finite extent at least {min_width} um wide, got {w} x {h}"
                    ))
                    .into());
                }
                extent
            }
            None if min_width > MIN_EXTENT.0 => {
                debug!("widening device extent to {min_width} um for mesa {mesa} um");
                Dims::new(min_width, min_width / 2.)
            }
            None => MIN_EXTENT.into(),
        };

        Ok(Self {
            mesa,
            via,
            extent,
            short: params.short,
        })
    }

    fn name(&self) -> ArcStr {
        let suffix = if self.short { "_short" } else { "" };
        arcstr::format!(
            "FerroelectricDevice_M{}_V{}{suffix}",
            um_to_nm(self.mesa),
            um_to_nm(self.via)
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let rules = ctx.rules();
        let (c, f) = (rules.coarse_clearance, rules.fine_clearance);
        let ratio = rules.octagon_ratio;
        let oct = |side: f64, at: Point| -> Polygon { octagon(Dims::square(side), at, ratio, ratio) };

        let [m0, m1, m2, v1, v2, v3, v4, w1] =
            ["M0", "M1", "M2", "V1", "V2", "V3", "V4", "W1"].map(|name| ctx.layer(name));
        let (m0, m1, m2, v1, v2, v3, v4, w1) = (m0?, m1?, m2?, v1?, v2?, v3?, v4?, w1?);

        let origin = Point::zero();
        let (m, v) = (self.mesa, self.via);
        let (top, bottom) = (self.top(c), self.bottom(c));

        let mesa = oct(m, origin);
        ctx.draw_polygon(m0, mesa.clone());
        ctx.draw_polygon(v3, oct(m - 2. * f, origin));
        ctx.draw_polygon(m2, oct(m + 2. * c, origin));

        ctx.draw(Wire::new([top, origin], rules.wire_width, m2));
        ctx.draw_polygon(m2, oct(v + 2. * c, top));
        ctx.draw_polygon(v2, oct(v, top));
        ctx.draw_polygon(w1, oct(v + 2. * c, top));
        ctx.draw_polygon(v4, oct(v + 2. * c, top));

        ctx.draw_polygon(v2, oct(v, bottom));
        let bottom_metal = oct(v + 4. * c, bottom);
        ctx.draw_polygon(m1, bottom_metal.clone());
        ctx.draw_polygon(w1, oct(v + 2. * c, bottom));

        let mut span = vec![mesa, bottom_metal].bbox();
        span.expand(c);
        let footprint = ops::difference(&[span.into_rect().to_poly()], &[oct(v + 2. * c, bottom)]);
        if self.short {
            ctx.draw_polygons(m1, footprint.iter().cloned());
        }
        ctx.draw_polygons(v1, footprint);
        Ok(())
    }
}

impl MaskCtx {
    /// Instantiates a device at the origin and reports its terminals.
    pub fn make_ferro_device(&self, params: &FerroDeviceParams) -> Result<DeviceConnections> {
        let c = self.rules().coarse_clearance;
        let device = FerroDevice::new(params, self)?;
        let inst = self.instantiate_layout::<FerroDevice>(params)?;
        Ok(DeviceConnections {
            inst,
            bottom: device.bottom(c),
            top: device.top(c),
        })
    }
}
