//! Contact pads.

use derive_builder::Builder;
use maskgeom::{Dims, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::component::{um_to_nm, Component};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};
use crate::layout::context::LayoutCtx;
use crate::layout::elements::shapes::octagon;

/// Pad drawing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
pub struct PadParams {
    /// Width of the pad.
    pub size_x: f64,
    /// Height of the pad. Defaults to `size_x`.
    #[builder(default, setter(strip_option))]
    pub size_y: Option<f64>,
    /// Overrides the minimum feature size of the design rules.
    #[builder(default, setter(strip_option))]
    pub min_feature: Option<f64>,
    /// Whether to draw the via stack. Ignored by [`UpperPad`].
    #[builder(default = "true")]
    pub with_via: bool,
}

impl PadParams {
    #[inline]
    pub fn builder() -> PadParamsBuilder {
        PadParamsBuilder::default()
    }

    /// A square pad of side `size` with a via stack.
    pub fn square(size: f64) -> Self {
        Self {
            size_x: size,
            size_y: None,
            min_feature: None,
            with_via: true,
        }
    }

    /// The width and height of the pad.
    pub fn dims(&self) -> Dims {
        Dims::new(self.size_x, self.size_y.unwrap_or(self.size_x))
    }
}

/// A pad on the lower wiring layer, optionally stacked with vias up to the upper wiring layer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LowerPad {
    size: Dims,
    with_via: bool,
}

/// A pad drawn on the upper wiring layer only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpperPad {
    size: Dims,
}

fn finite_dims(params: &PadParams) -> Result<Dims> {
    let size = params.dims();
    if !(size.w().is_finite() && size.h().is_finite()) {
        return Err(ErrorSource::Dimension(format!(
            "pad size must be finite, got {} x {}",
            size.w(),
            size.h()
        ))
        .into());
    }
    Ok(size)
}

fn pad_octagon(ctx: &LayoutCtx, dims: Dims) -> Polygon {
    let ratio = ctx.rules().octagon_ratio;
    octagon(dims, Point::zero(), ratio, ratio)
}

impl Component for LowerPad {
    type Params = PadParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        let rules = ctx.rules();
        let size = finite_dims(params)?;
        let min_feature = params.min_feature.unwrap_or(rules.min_pad_feature);
        if !(size.min() - 4. * rules.coarse_clearance >= min_feature) {
            return Err(ErrorSource::PadTooSmall {
                size: size.min(),
                min_feature,
            }
            .into());
        }
        Ok(Self {
            size,
            with_via: params.with_via,
        })
    }

    fn name(&self) -> ArcStr {
        let suffix = if self.with_via { "" } else { "_novia" };
        arcstr::format!(
            "LowerPad_{}_{}{suffix}",
            um_to_nm(self.size.w()),
            um_to_nm(self.size.h())
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let w1 = ctx.layer("W1")?;
        ctx.draw_polygon(w1, pad_octagon(ctx, self.size));
        if !self.with_via {
            return Ok(());
        }

        let c = ctx.rules().coarse_clearance;
        let via = Dims::new(self.size.w() - 2. * c, self.size.h() - 2. * c);
        for name in ["V2", "V4"] {
            let layer = ctx.layer(name)?;
            ctx.draw_polygon(layer, pad_octagon(ctx, via));
        }
        let w2 = ctx.layer("W2")?;
        ctx.draw_polygon(w2, pad_octagon(ctx, self.size));
        Ok(())
    }
}

impl Component for UpperPad {
    type Params = PadParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        let size = finite_dims(params)?;
        let min_feature = params
            .min_feature
            .unwrap_or_else(|| ctx.rules().min_pad_feature);
        if !(size.min() >= min_feature) {
            return Err(ErrorSource::PadTooSmall {
                size: size.min(),
                min_feature,
            }
            .into());
        }
        Ok(Self { size })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "UpperPad_{}_{}",
            um_to_nm(self.size.w()),
            um_to_nm(self.size.h())
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let w2 = ctx.layer("W2")?;
        ctx.draw_polygon(w2, pad_octagon(ctx, self.size));
        Ok(())
    }
}
