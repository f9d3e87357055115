//! Converts hierarchical layouts into flat, merged, manufacturing-ready geometry.
//!
//! The pipeline flattens every instance into absolute coordinates, groups shapes by
//! physical layer, merges each group with a boolean union, and finally replaces the
//! geometry of boundary-mode layers with a ring hugging its outside.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use maskgeom::ops::union;
use maskgeom::ring::boundary_ring;
use maskgeom::{Point, Polygon, ShapeTrait};
use rayon::prelude::*;

use crate::data::MaskCtx;
use crate::error::{with_err_context, ErrorContext, Result};
use crate::layout::cell::{flatten_recur, Cell, Element, TextElement};
use crate::layout::layers::{GdsLayerSpec, LayerMode, Layers};
use crate::log::{debug, info};

/// Flattens `root` and merges its geometry layer by layer.
///
/// Layers whose physical id maps to [`LayerMode::Boundary`] in `layers` are replaced by
/// a ring of width `boundary_width` around the merged shapes. Physical layers missing
/// from `layers` are merged and kept as drawn. The resulting cell carries every text
/// annotation of the hierarchy and is named after `root`.
pub fn build_mask(root: &Cell, layers: &Layers, boundary_width: f64) -> Cell {
    let mut elems: Vec<Element> = root.elems().cloned().collect();
    let mut annotations: Vec<TextElement> = root.annotations().cloned().collect();
    flatten_recur(&mut elems, &mut annotations, Point::zero(), root._insts());
    debug!("flattened {} into {} elements", root.name(), elems.len());

    let mut buckets: BTreeMap<GdsLayerSpec, Vec<Polygon>> = BTreeMap::new();
    for elem in elems {
        buckets
            .entry(elem.layer)
            .or_default()
            .extend(elem.inner.to_polys());
    }

    let modes = layers.modes();
    let buckets: Vec<(GdsLayerSpec, Vec<Polygon>)> = buckets.into_iter().collect();
    let merged: Vec<(GdsLayerSpec, Vec<Polygon>)> = buckets
        .into_par_iter()
        .map(|(layer, polys)| {
            let merged = union(&polys);
            let polys = match modes.get(&layer) {
                Some(LayerMode::Boundary) => boundary_ring(&merged, boundary_width),
                _ => merged,
            };
            (layer, polys)
        })
        .collect();

    let mut mask = Cell::default();
    mask.set_name(root.name().clone());
    for (layer, polys) in merged {
        debug!("layer {layer}: {} polygons", polys.len());
        mask.draw_polygons(layer, polys);
    }
    mask.add_annotations(annotations);
    mask
}

impl MaskCtx {
    /// Flattens and merges `root` with this context's layers and rules, registering the result.
    pub fn build_mask(&self, root: &Cell) -> Arc<Cell> {
        let layers = self.layers();
        let width = self.rules().boundary_width;
        let mask = build_mask(root, &layers, width);
        info!(
            "built mask {} with {} polygons",
            mask.name(),
            mask.elems().count()
        );
        self.add_cell(mask)
    }

    /// Builds the mask of `root` and writes it as a single flat GDS structure.
    pub fn write_mask(&self, root: &Cell, path: impl AsRef<Path>) -> Result<Arc<Cell>> {
        let path = path.as_ref();
        let mask = self.build_mask(root);
        with_err_context(self.library(&mask).save_gds(path), || {
            ErrorContext::Task(arcstr::format!("writing mask to file {:?}", path))
        })?;
        Ok(mask)
    }

    /// Writes `root` and every cell it references to a GDS file.
    pub fn write_hierarchy(&self, root: &Arc<Cell>, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        with_err_context(self.library(root).save_gds(path), || {
            ErrorContext::Task(arcstr::format!("writing hierarchy to file {:?}", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use maskgeom::ops::{area, intersection, offset};
    use maskgeom::{Dims, Rect, Shape};

    use super::*;
    use crate::layout::cell::Instance;

    const M0: GdsLayerSpec = GdsLayerSpec(0, 0);
    const M1: GdsLayerSpec = GdsLayerSpec(1, 0);
    const W1: GdsLayerSpec = GdsLayerSpec(10, 0);

    fn polys_on(cell: &Cell, layer: GdsLayerSpec) -> Vec<Polygon> {
        cell.elems()
            .filter(|e| e.layer == layer)
            .map(|e| e.inner.as_polygon().cloned().unwrap())
            .collect()
    }

    fn square(center: Point, side: f64) -> Rect {
        Rect::from_center(center, Dims::square(side))
    }

    #[test]
    fn test_flatten_and_merge() {
        let mut child = Cell::default();
        child.add(Element::new(M0, square(Point::zero(), 1.)));
        child.add_annotation(TextElement::new("child", Point::new(1., 1.), M0));

        let mut root = Cell::default();
        root.set_name("ROOT");
        root.add(Element::new(M0, Rect::new(Point::zero(), Point::new(2., 2.))));
        root.add(Element::new(M0, Rect::new(Point::new(1., 0.), Point::new(3., 2.))));
        root.add(Element::new(
            M1,
            maskgeom::Path::new([Point::new(0., 5.), Point::new(4., 5.)], 1.),
        ));
        root.add_inst(Instance::at(child, (10., 0.)));

        let mask = build_mask(&root, &Layers::reference(), 1.);
        assert_eq!(mask.name().as_str(), "ROOT");
        assert!(mask.insts().next().is_none());
        assert!(mask
            .elems()
            .all(|e| matches!(e.inner, Shape::Polygon(_))));

        let m0 = polys_on(&mask, M0);
        assert_eq!(m0.len(), 2);
        assert_float_eq!(area(&m0), 7., abs <= 1e-9);
        assert_float_eq!(area(&polys_on(&mask, M1)), 4., abs <= 1e-9);

        let ann: Vec<_> = mask.annotations().collect();
        assert_eq!(ann.len(), 1);
        assert_eq!(ann[0].loc, Point::new(11., 1.));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut root = Cell::default();
        for i in 0..4 {
            root.add(Element::new(M0, square(Point::new(i as f64 * 1.5, 0.), 2.)));
        }
        let once = build_mask(&root, &Layers::reference(), 1.);
        let twice = build_mask(&once, &Layers::reference(), 1.);
        assert_eq!(polys_on(&once, M0).len(), 1);
        assert_eq!(polys_on(&twice, M0).len(), 1);
        assert_float_eq!(
            area(&polys_on(&once, M0)),
            area(&polys_on(&twice, M0)),
            abs <= 1e-9
        );
    }

    #[test]
    fn test_boundary_layers_become_rings() {
        let source = vec![square(Point::zero(), 10.).to_poly()];
        let mut root = Cell::default();
        root.draw_polygons(W1, source.clone());

        let mask = build_mask(&root, &Layers::reference(), 1.);
        let ring = polys_on(&mask, W1);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring[0].holes.len(), 1);
        assert!(area(&intersection(&ring, &source)) < 1e-6);

        let mut covered = ring.clone();
        covered.extend(source.iter().cloned());
        assert_float_eq!(
            area(&covered),
            area(&offset(&source, 1.)),
            abs <= 1e-6
        );
    }

    #[test]
    fn test_unknown_layers_are_kept() {
        let mut root = Cell::default();
        root.add(Element::new(GdsLayerSpec(99, 3), square(Point::zero(), 2.)));
        let mask = build_mask(&root, &Layers::reference(), 1.);
        assert_float_eq!(
            area(&polys_on(&mask, GdsLayerSpec(99, 3))),
            4.,
            abs <= 1e-9
        );
    }
}
