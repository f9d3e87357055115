//! A column of padded devices sharing one bottom-electrode rail.

use derive_builder::Builder;
use itertools::Itertools;
use maskgeom::{Dims, Point};
use serde::{Deserialize, Serialize};

use super::{draw_label, label_below, place_padded_device};
use crate::component::{um_to_nm, Component};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::devices::ferro::{FerroDevice, FerroDeviceParams};
use crate::devices::pad::{LowerPad, PadParams};
use crate::error::{ErrorSource, Result};
use crate::layout::context::LayoutCtx;
use crate::layout::elements::shapes::rectangle;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct VectorParams {
    /// Label text.
    #[builder(setter(into))]
    pub name: ArcStr,
    /// Mesa size of each device, bottom row first.
    pub mesas: Vec<f64>,
    #[builder(default, setter(strip_option))]
    pub via: Option<f64>,
}

impl VectorParams {
    #[inline]
    pub fn builder() -> VectorParamsBuilder {
        VectorParamsBuilder::default()
    }

    fn device(&self, mesa: f64) -> FerroDeviceParams {
        FerroDeviceParams {
            mesa,
            via: self.via,
            extent: None,
            short: false,
        }
    }
}

/// A 1xN vector of devices.
///
/// Device `i` sits at `(0, i * 5/4 * pad_dim)`. The bottom pads are joined by a rail
/// two thirds of a pad wide, centered on the first row's bottom pad.
#[derive(Debug, Clone, Serialize)]
pub struct Vector {
    params: VectorParams,
    via: f64,
}

impl Component for Vector {
    type Params = VectorParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        if params.mesas.is_empty() {
            return Err(
                ErrorSource::InvalidArgs("a vector needs at least one device".to_string()).into(),
            );
        }
        for &mesa in &params.mesas {
            FerroDevice::new(&params.device(mesa), ctx)?;
        }
        LowerPad::new(&PadParams::square(ctx.rules().pad_dim), ctx)?;
        let via = params.via.unwrap_or_else(|| ctx.rules().coarse_clearance);
        Ok(Self {
            params: VectorParams {
                via: Some(via),
                ..params.clone()
            },
            via,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "Vector{}_M{}_V{}",
            self.params.mesas.len(),
            self.params.mesas.iter().map(|&m| um_to_nm(m)).join("_"),
            um_to_nm(self.via)
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let pad = ctx.rules().pad_dim;
        let step = pad + pad / 4.;

        let mut rows = Vec::with_capacity(self.params.mesas.len());
        for (i, &mesa) in self.params.mesas.iter().enumerate() {
            let at = Point::new(0., i as f64 * step);
            rows.push(place_padded_device(ctx, &self.params.device(mesa), at)?);
        }

        if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            let x = first.bottom_pad.x;
            let y0 = first.bottom_pad.y - pad / 2.;
            let y1 = last.bottom_pad.y + pad / 2.;
            let rail = rectangle(
                Dims::new(2. * pad / 3., y1 - y0),
                Point::new(x, (y0 + y1) / 2.),
            );
            let w1 = ctx.layer("W1")?;
            ctx.draw_polygon(w1, rail);
        }

        let at = label_below(ctx);
        draw_label(ctx, &self.params.name, at)
    }
}
