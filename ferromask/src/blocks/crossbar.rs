//! A 2x2 crossbar array.

use derive_builder::Builder;
use maskgeom::Point;
use serde::{Deserialize, Serialize};

use super::{block_pad, draw_label};
use crate::component::{um_to_nm, Component};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::devices::ferro::{DeviceConnections, FerroDevice, FerroDeviceParams};
use crate::devices::pad::{LowerPad, PadParams};
use crate::error::Result;
use crate::layout::context::LayoutCtx;
use crate::layout::routing::manual::jog::{route_90deg, RouteMode, Wire};

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct CrossbarParams {
    /// Label text.
    #[builder(setter(into))]
    pub name: ArcStr,
    /// Mesa sizes as `[[NW, NE], [SW, SE]]`.
    pub mesas: [[f64; 2]; 2],
    #[builder(default, setter(strip_option))]
    pub via: Option<f64>,
}

impl CrossbarParams {
    #[inline]
    pub fn builder() -> CrossbarParamsBuilder {
        CrossbarParamsBuilder::default()
    }

    fn device(&self, row: usize, col: usize) -> FerroDeviceParams {
        FerroDeviceParams {
            mesa: self.mesas[row][col],
            via: self.via,
            extent: None,
            short: false,
        }
    }
}

/// Four devices in two rows, wired so that each pad reaches two of them.
#[derive(Debug, Clone, Serialize)]
pub struct Crossbar {
    params: CrossbarParams,
    via: f64,
}

/// A device placed inside a crossbar, with absolute terminals.
struct Placed {
    at: Point,
    top: Point,
    bottom: Point,
}

impl Placed {
    fn new(ctx: &mut LayoutCtx, dev: DeviceConnections, at: Point) -> Self {
        let mut inst = dev.inst;
        inst.set_loc(at);
        ctx.add_inst(inst);
        Self {
            at,
            top: at + dev.top,
            bottom: at + dev.bottom,
        }
    }
}

fn chain(legs: &[&[Point]]) -> Vec<Point> {
    legs.iter().flat_map(|leg| leg.iter().copied()).collect()
}

impl Component for Crossbar {
    type Params = CrossbarParams;

    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self> {
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            FerroDevice::new(&params.device(row, col), ctx)?;
        }
        LowerPad::new(&PadParams::square(ctx.rules().pad_dim), ctx)?;
        let via = params.via.unwrap_or_else(|| ctx.rules().coarse_clearance);
        Ok(Self {
            params: CrossbarParams {
                via: Some(via),
                ..params.clone()
            },
            via,
        })
    }

    fn name(&self) -> ArcStr {
        let [[nw, ne], [sw, se]] = self.params.mesas.map(|row| row.map(um_to_nm));
        arcstr::format!("XBAR_M{nw}_{ne}__{sw}_{se}_V{}", um_to_nm(self.via))
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let rules = ctx.rules();
        let g = rules.crossbar_gap;
        let pad = rules.pad_dim;
        let row = g + pad;

        let place = |ctx: &mut LayoutCtx, r: usize, c: usize, at: Point| -> Result<Placed> {
            let dev = ctx.inner().make_ferro_device(&self.params.device(r, c))?;
            Ok(Placed::new(ctx, dev, at))
        };
        let nw = place(ctx, 0, 0, Point::new(0., row))?;
        let ne = place(ctx, 0, 1, Point::new(2. * g, row))?;
        let sw = place(ctx, 1, 0, Point::zero())?;
        let se = place(ctx, 1, 1, Point::new(2. * g, 0.))?;

        let up1 = Point::new(-1.5 * g - pad / 2., row);
        let up2 = Point::new(1.5 * g + pad, 0.);
        let lp1 = Point::new(-1.5 * g - pad / 2., 0.);
        let lp2 = Point::new(1.5 * g + pad, row);
        let pad_params = block_pad(ctx);
        for loc in [lp1, lp2, up1, up2] {
            let inst = ctx.instantiate_at::<LowerPad>(&pad_params, loc)?;
            ctx.add_inst(inst);
        }

        use RouteMode::*;
        let mut wires: Vec<Vec<Point>> = Vec::new();

        // UP1 collects both top-row top electrodes.
        let t1 = nw.top + Point::new(0., pad / 4.);
        wires.push(route_90deg(nw.top, up1, HorizVert).to_vec());
        wires.push(chain(&[
            &route_90deg(ne.top, t1, VertHoriz),
            &route_90deg(t1, up1, VertHoriz),
        ]));

        // UP2 collects both bottom-row top electrodes.
        let se_top = se.top - se.at;
        let t2 = Point::new(se.at.x + se_top.x, sw.top.y - pad / 4.);
        let t3 = Point::new(se.at.x - 3. * se_top.x, se.at.y);
        wires.push(route_90deg(sw.top, t2, VertHoriz).to_vec());
        wires.push(chain(&[&[se.top], &route_90deg(t2, t3, HorizVert), &[up2]]));

        // LP1 collects the left column's bottom electrodes.
        let t4 = Point::new(nw.bottom.x, row / 2.);
        let t5 = Point::new(nw.at.x - 4. * g / 5., lp1.y);
        wires.push(route_90deg(nw.bottom, t4, VertHoriz).to_vec());
        wires.push(route_90deg(sw.bottom, t4, VertHoriz).to_vec());
        wires.push(chain(&[&route_90deg(t4, t5, HorizVert), &[lp1]]));

        // LP2 collects the right column's bottom electrodes.
        wires.push(vec![lp2, ne.bottom, se.bottom]);

        let w1 = ctx.layer("W1")?;
        for points in wires {
            ctx.draw(Wire::new(points, rules.wire_width, w1));
        }

        draw_label(ctx, &self.params.name, Point::new(g, 2. * pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskConfig;
    use crate::layout::layers::GdsLayerSpec;

    #[test]
    fn test_crossbar_placement() {
        let ctx = MaskCtx::from_config(MaskConfig::reference_mask()).unwrap();
        let params = CrossbarParams::builder()
            .name("XBAR")
            .mesas([[1., 2.], [3., 4.]])
            .build()
            .unwrap();
        let inst = ctx.instantiate_layout::<Crossbar>(&params).unwrap();
        let cell = inst.cell();
        assert_eq!(cell.name().as_str(), "XBAR_M1000_2000__3000_4000_V2000");

        let locs: Vec<Point> = cell.insts().map(|inst| inst.loc()).collect();
        assert_eq!(
            locs,
            vec![
                Point::new(0., 125.),
                Point::new(50., 125.),
                Point::zero(),
                Point::new(50., 0.),
                Point::new(-87.5, 0.),
                Point::new(137.5, 125.),
                Point::new(-87.5, 125.),
                Point::new(137.5, 0.),
            ]
        );
        assert_eq!(
            cell.elems().filter(|e| e.layer == GdsLayerSpec(10, 0)).count(),
            8
        );
        let ann: Vec<_> = cell.annotations().collect();
        assert_eq!(ann[0].loc, Point::new(25., 200.));
        // Four device cells share one pad cell.
        assert_eq!(ctx.num_cells(), 6);
    }
}
