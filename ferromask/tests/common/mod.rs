#![allow(dead_code)]

use std::path::PathBuf;

use ferromask::config::MaskConfig;
use ferromask::data::MaskCtx;
use ferromask::layout::cell::Cell;
use ferromask::layout::layers::GdsLayerSpec;
use maskgeom::Polygon;

pub const BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

pub const W1: GdsLayerSpec = GdsLayerSpec(10, 0);
pub const LABEL: GdsLayerSpec = GdsLayerSpec(50, 0);

pub fn out_path(test_name: &str, file_name: &str) -> PathBuf {
    PathBuf::from(BUILD_DIR).join(format!("tests/{test_name}/{file_name}"))
}

/// A context for the reference mask: default rules with 100um pads.
pub fn setup_ctx() -> MaskCtx {
    MaskCtx::from_config(MaskConfig::reference_mask()).unwrap()
}

/// Returns the polygons drawn directly in `cell` on `layer`.
pub fn polygons_on(cell: &Cell, layer: GdsLayerSpec) -> Vec<Polygon> {
    cell.elems()
        .filter(|elem| elem.layer == layer)
        .filter_map(|elem| elem.inner.as_polygon().cloned())
        .collect()
}
