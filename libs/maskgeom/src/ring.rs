//! Boundary rings around merged polygon sets.

use crate::ops::{difference, offset};
use crate::Polygon;

/// Returns the band of width `width` hugging the outside of `polys`.
///
/// Computed as `offset(polys, width) - polys` over the whole set at once, so the
/// ring never overlaps the interior of any input polygon, even where two inputs sit
/// closer together than `2 * width`.
pub fn boundary_ring(polys: &[Polygon], width: f64) -> Vec<Polygon> {
    if polys.is_empty() {
        return Vec::new();
    }
    let grown = offset(polys, width);
    difference(&grown, polys)
}
