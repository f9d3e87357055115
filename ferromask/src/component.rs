//! APIs for creating parametric layout generators.

use std::any::Any;

use arcstr::ArcStr;
use serde::Serialize;

use crate::data::MaskCtx;
use crate::error::Result;
use crate::layout::context::LayoutCtx;

/// The trait that all layout generators implement.
///
/// Generated cells are cached on the component type and the serialized component, after
/// [`Component::new`] has resolved every defaulted parameter. Parameter sets that resolve
/// to the same component yield the same cell.
pub trait Component: Any + Serialize {
    /// The parameter type.
    type Params;

    /// Creates a new instance of this component with the given parameters.
    ///
    /// Parameter validation belongs here: it runs before any geometry is drawn.
    fn new(params: &Self::Params, ctx: &MaskCtx) -> Result<Self>
    where
        Self: Sized;

    /// Returns the desired name of this component.
    ///
    /// Distinct cells may share a name; names are made unique on export.
    fn name(&self) -> ArcStr {
        arcstr::literal!("unnamed")
    }

    /// Draws the layout of this component.
    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()>;
}

/// Formats a length in microns as an integer number of nanometers, for cell names.
pub(crate) fn um_to_nm(um: f64) -> i64 {
    (um * 1e3).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_um_to_nm() {
        assert_eq!(um_to_nm(20.), 20000);
        assert_eq!(um_to_nm(0.05), 50);
        assert_eq!(um_to_nm(2.0004), 2000);
    }
}
