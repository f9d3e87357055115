//! Composite cells built from devices, pads and wires.

use maskgeom::Point;

use crate::devices::ferro::FerroDeviceParams;
use crate::devices::pad::{LowerPad, PadParams};
use crate::error::Result;
use crate::layout::cell::TextElement;
use crate::layout::context::LayoutCtx;
use crate::layout::elements::label::make_label;
use crate::layout::routing::manual::jog::{route_90deg, RouteMode, Wire};

pub mod crossbar;
pub mod plan;
pub mod two_terminal;
pub mod vector;

/// Absolute terminal and pad locations of a device placed by [`place_padded_device`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddedDevice {
    pub top: Point,
    pub bottom: Point,
    pub top_pad: Point,
    pub bottom_pad: Point,
}

/// Returns the parameters of the lower pad used by every block.
pub(crate) fn block_pad(ctx: &LayoutCtx) -> PadParams {
    PadParams::square(ctx.rules().pad_dim)
}

/// Places a device at `at` with a lower pad on either side, each wired to its terminal on W1.
///
/// The top pad sits left of the top terminal and the bottom pad right of the bottom terminal,
/// each with its near edge `pad_device_spacing` away.
pub(crate) fn place_padded_device(
    ctx: &mut LayoutCtx,
    device: &FerroDeviceParams,
    at: Point,
) -> Result<PaddedDevice> {
    let rules = ctx.rules();
    let dev = ctx.inner().make_ferro_device(device)?;
    let (top, bottom) = (at + dev.top, at + dev.bottom);
    let offset = rules.pad_device_spacing + rules.pad_dim / 2.;
    let top_pad = Point::new(top.x - offset, top.y);
    let bottom_pad = Point::new(bottom.x + offset, bottom.y);

    let mut inst = dev.inst;
    inst.set_loc(at);
    ctx.add_inst(inst);

    let pad = block_pad(ctx);
    for loc in [top_pad, bottom_pad] {
        let inst = ctx.instantiate_at::<LowerPad>(&pad, loc)?;
        ctx.add_inst(inst);
    }

    let w1 = ctx.layer("W1")?;
    ctx.draw(Wire::new(
        route_90deg(top, top_pad, RouteMode::HorizVert),
        rules.wire_width,
        w1,
    ));
    ctx.draw(Wire::new(
        route_90deg(bottom, bottom_pad, RouteMode::VertHoriz),
        rules.wire_width,
        w1,
    ));

    Ok(PaddedDevice {
        top,
        bottom,
        top_pad,
        bottom_pad,
    })
}

/// Returns the label origin centered under everything drawn so far.
pub(crate) fn label_below(ctx: &LayoutCtx) -> Point {
    let rules = ctx.rules();
    let bbox = ctx.bbox();
    Point::new(
        bbox.center().x,
        bbox.p0.y - rules.pad_device_spacing - rules.label_size / 2.,
    )
}

/// Draws `text` centered on `at`, with a matching text annotation.
pub(crate) fn draw_label(ctx: &mut LayoutCtx, text: &str, at: Point) -> Result<()> {
    let layer = ctx.layer("label")?;
    let size = ctx.rules().label_size;
    for elem in make_label(text, size, at, false, layer) {
        ctx.draw(elem);
    }
    ctx.add_annotation(TextElement::new(text, at, layer));
    Ok(())
}
