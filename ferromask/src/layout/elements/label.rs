//! Text labels drawn as polygons.

use maskgeom::bbox::BoundBox;
use maskgeom::text::{has_glyph, render};
use maskgeom::transform::Translate;
use maskgeom::Point;

use crate::layout::cell::Element;
use crate::layout::layers::GdsLayerSpec;
use crate::log::warn;

/// Renders `text` as polygons `size` units tall, centered on `origin`.
///
/// The glyphs are centered on their combined bounding box. Characters the built-in
/// font cannot draw are skipped with a warning. Empty text yields no elements.
pub fn make_label(
    text: &str,
    size: f64,
    origin: Point,
    vertical: bool,
    layer: GdsLayerSpec,
) -> Vec<Element> {
    let missing: String = text.chars().filter(|c| !has_glyph(*c)).collect();
    if !missing.is_empty() {
        warn!("label {text:?}: no glyphs for {missing:?}");
    }
    let mut polys = render(text, size, vertical);
    if polys.is_empty() {
        return Vec::new();
    }
    let center = polys.bbox().center();
    polys.translate(origin - center);
    polys
        .into_iter()
        .map(|poly| Element::new(layer, poly))
        .collect()
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use maskgeom::bbox::Bbox;

    use super::*;

    const LABEL: GdsLayerSpec = GdsLayerSpec(50, 0);

    fn bbox(elems: &[Element]) -> Bbox {
        elems
            .iter()
            .fold(Bbox::empty(), |acc, e| acc.union(e.bbox()))
    }

    #[test]
    fn test_label_is_centered_on_origin() {
        let elems = make_label("FE", 10., Point::new(5., -20.), false, LABEL);
        assert!(!elems.is_empty());
        assert!(elems.iter().all(|e| e.layer == LABEL));
        let center = bbox(&elems).center();
        assert_float_eq!(center.x, 5., abs <= 1e-9);
        assert_float_eq!(center.y, -20., abs <= 1e-9);
    }

    #[test]
    fn test_vertical_label_is_taller() {
        let elems = make_label("XBAR", 10., Point::zero(), true, LABEL);
        let b = bbox(&elems);
        assert!(b.height() > b.width());
    }

    #[test]
    fn test_empty_label() {
        assert!(make_label("", 10., Point::zero(), false, LABEL).is_empty());
        assert!(make_label("#", 10., Point::zero(), false, LABEL).is_empty());
    }
}
