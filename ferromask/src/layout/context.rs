//! Context methods for instantiating component layouts.

use std::sync::Arc;

use maskgeom::bbox::Bbox;
use maskgeom::{Point, Polygon};

use super::cell::{Cell, CellKey, Element, Instance, TextElement};
use super::layers::GdsLayerSpec;
use crate::component::Component;
use crate::config::DesignRules;
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::Result;
use crate::generation::{GeneratedCheck, GenerationMap, ParamKey};

/// Context for creating the layout view of a [`Component`].
pub struct LayoutCtx {
    /// The global [`MaskCtx`].
    pub(crate) inner: MaskCtx,
    /// The layout view of the cell being created.
    pub(crate) cell: Cell,
}

/// Cell data for a mask.
#[derive(Debug)]
pub(crate) struct LayoutData {
    /// A map of generated and imported cells.
    cells: GenerationMap<ParamKey, CellKey, Cell>,
}

impl LayoutData {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            cells: GenerationMap::new(),
        }
    }

    /// Returns the generated cell if it already exists or generates a new ID.
    pub(crate) fn get_generated_cell<T>(
        &mut self,
        component: &T,
    ) -> Result<GeneratedCheck<Arc<Cell>, CellKey>>
    where
        T: Component,
    {
        let key = ParamKey::from_params(std::any::type_name::<T>(), component)?;
        Ok(self.cells.get(key))
    }

    /// Adds a cell to the map based on its [`CellKey`], freezing it.
    pub(crate) fn set_cell(&mut self, mut cell: Cell) -> Arc<Cell> {
        cell.freeze();
        self.cells.set(cell.id(), cell)
    }

    /// Generates a new [`CellKey`] to allow for a new cell to be created.
    pub(crate) fn gen_id(&mut self) -> CellKey {
        self.cells.gen_id()
    }

    /// Returns an iterator over the cells in the map.
    pub(crate) fn cells(&self) -> impl Iterator<Item = &Arc<Cell>> {
        self.cells.values()
    }
}

impl LayoutCtx {
    /// Returns the global mask context.
    #[inline]
    pub fn inner(&self) -> &MaskCtx {
        &self.inner
    }

    /// Returns the design rules of the mask.
    #[inline]
    pub fn rules(&self) -> DesignRules {
        self.inner.rules()
    }

    /// Resolves a logical layer name to its physical layer.
    #[inline]
    pub fn layer(&self, name: &str) -> Result<GdsLayerSpec> {
        self.inner.layer(name)
    }

    /// Sets the name of the cell being created.
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.cell.set_name(name);
    }

    /// Draws an element in the cell.
    #[inline]
    pub fn draw(&mut self, elem: impl Into<Element>) {
        self.cell.add(elem);
    }

    /// Draws `poly` on `layer`.
    #[inline]
    pub fn draw_polygon(&mut self, layer: GdsLayerSpec, poly: Polygon) {
        self.cell.add(Element::new(layer, poly));
    }

    /// Draws each polygon on `layer`.
    #[inline]
    pub fn draw_polygons(&mut self, layer: GdsLayerSpec, polys: impl IntoIterator<Item = Polygon>) {
        self.cell.draw_polygons(layer, polys);
    }

    /// Adds an instance to the cell.
    #[inline]
    pub fn add_inst(&mut self, inst: impl Into<Instance>) {
        self.cell.add_inst(inst);
    }

    /// Adds a text annotation to the cell.
    #[inline]
    pub fn add_annotation(&mut self, annotation: TextElement) {
        self.cell.add_annotation(annotation);
    }

    /// Creates an instance of component `T` at the origin.
    #[inline]
    pub fn instantiate<T>(&mut self, params: &T::Params) -> Result<Instance>
    where
        T: Component,
    {
        self.inner.instantiate_layout::<T>(params)
    }

    /// Creates an instance of component `T` at `loc`.
    pub fn instantiate_at<T>(&mut self, params: &T::Params, loc: impl Into<Point>) -> Result<Instance>
    where
        T: Component,
    {
        let mut inst = self.instantiate::<T>(params)?;
        inst.set_loc(loc);
        Ok(inst)
    }

    /// Returns the bounding box of everything drawn so far.
    #[inline]
    pub fn bbox(&self) -> Bbox {
        self.cell.bbox()
    }
}
