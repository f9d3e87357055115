//! A single padded device.

use derive_builder::Builder;
use maskgeom::Point;
use serde::{Deserialize, Serialize};

use super::{draw_label, label_below, place_padded_device};
use crate::component::{um_to_nm, Component};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::devices::ferro::{FerroDevice, FerroDeviceParams};
use crate::devices::pad::{LowerPad, PadParams};
use crate::error::Result;
use crate::layout::context::LayoutCtx;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct TwoTerminalParams {
    /// Label text.
    #[builder(setter(into))]
    pub name: ArcStr,
    pub mesa: f64,
    #[builder(default, setter(strip_option))]
    pub via: Option<f64>,
    #[builder(default)]
    pub short: bool,
}

impl TwoTerminalParams {
    #[inline]
    pub fn builder() -> TwoTerminalParamsBuilder {
        TwoTerminalParamsBuilder::default()
    }

    fn device(&self) -> FerroDeviceParams {
        FerroDeviceParams {
            mesa: self.mesa,
            via: self.via,
            extent: None,
            short: self.short,
        }
    }
}

/// One device between two lower pads, labeled underneath.
#[derive(Debug, Clone, Serialize)]
pub struct TwoTerminal {
    params: TwoTerminalParams,
    via: f64,
}

impl Component for TwoTerminal {
    type Params = TwoTerminalParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        FerroDevice::new(&params.device(), ctx)?;
        LowerPad::new(&PadParams::square(ctx.rules().pad_dim), ctx)?;
        let via = params.via.unwrap_or_else(|| ctx.rules().coarse_clearance);
        Ok(Self {
            params: TwoTerminalParams {
                via: Some(via),
                ..params.clone()
            },
            via,
        })
    }

    fn name(&self) -> ArcStr {
        let suffix = if self.params.short { "_short" } else { "" };
        arcstr::format!(
            "2T_M{}_V{}{suffix}",
            um_to_nm(self.params.mesa),
            um_to_nm(self.via)
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        place_padded_device(ctx, &self.params.device(), Point::zero())?;
        let at = label_below(ctx);
        draw_label(ctx, &self.params.name, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskConfig;
    use crate::layout::layers::GdsLayerSpec;

    #[test]
    fn test_two_terminal() {
        let ctx = MaskCtx::from_config(MaskConfig::default()).unwrap();
        let params = TwoTerminalParams::builder()
            .name("FE")
            .mesa(20.)
            .build()
            .unwrap();
        let inst = ctx.instantiate_layout::<TwoTerminal>(&params).unwrap();
        let cell = inst.cell();
        assert_eq!(cell.name().as_str(), "2T_M20000_V2000");

        let locs: Vec<Point> = cell.insts().map(|inst| inst.loc()).collect();
        // Terminals at -16 and 16, pads 10 + 25 beyond them.
        assert_eq!(
            locs,
            vec![Point::zero(), Point::new(-51., 0.), Point::new(51., 0.)]
        );
        assert_eq!(
            cell.elems().filter(|e| e.layer == GdsLayerSpec(10, 0)).count(),
            2
        );
        assert!(cell.elems().any(|e| e.layer == GdsLayerSpec(50, 0)));

        let ann: Vec<_> = cell.annotations().collect();
        assert_eq!(ann.len(), 1);
        assert_eq!(ann[0].string.as_str(), "FE");
        assert!(ann[0].loc.y < -25.);
        assert_eq!(ann[0].loc.x, 0.);
    }

    #[test]
    fn test_two_terminal_propagates_pad_error() {
        let mut cfg = MaskConfig::default();
        cfg.rules.pad_dim = 20.;
        let ctx = MaskCtx::from_config(cfg).unwrap();
        let params = TwoTerminalParams::builder()
            .name("FE")
            .mesa(20.)
            .build()
            .unwrap();
        let err = ctx.instantiate_layout::<TwoTerminal>(&params).unwrap_err();
        assert!(matches!(
            err.source(),
            crate::error::ErrorSource::PadTooSmall { .. }
        ));
        assert_eq!(ctx.num_cells(), 0);
    }
}
