//! Types related to the creation and instantiation of [`Cell`]s.

use std::sync::Arc;

use maskgeom::bbox::{Bbox, BoundBox};
use maskgeom::transform::Translate;
use maskgeom::{Point, Polygon, Shape};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use super::layers::GdsLayerSpec;
use crate::deps::arcstr::ArcStr;

/// The layout view of a cell.
#[derive(Debug, Default, Clone)]
pub struct Cell {
    /// The cell's identifier.
    id: CellKey,
    /// The cell's name.
    name: ArcStr,
    /// A list of instances contained in the cell.
    insts: Vec<Instance>,
    /// A list of primitive/geometric elements.
    elems: Vec<Element>,
    /// A list of text annotations.
    annotations: Vec<TextElement>,

    /// Cache of values that are frequently used
    /// after a cell is done being generated.
    ///
    /// Cached values are computed after the cell is [frozen](Cell::freeze).
    cache: Option<Cache>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Cache {
    bbox: Bbox,
}

new_key_type! {
    /// A unique identifier for cells.
    pub struct CellKey;
}

/// An instance of a cell in a layout.
///
/// Placement is translation only.
#[derive(Debug, Clone)]
pub struct Instance {
    /// The instance name.
    pub(crate) name: ArcStr,
    /// A pointer to the reference cell.
    pub(crate) cell: Arc<Cell>,
    /// The location of the cell's origin.
    pub(crate) loc: Point,
}

/// A primitive geometric element.
///
/// Combines a geometric [`Shape`] with the physical layer it is drawn on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    /// The layer where the element is located.
    pub layer: GdsLayerSpec,
    /// The element's shape.
    pub inner: Shape,
}

impl Element {
    /// Creates a new [`Element`].
    pub fn new(layer: GdsLayerSpec, shape: impl Into<Shape>) -> Self {
        Self {
            layer,
            inner: shape.into(),
        }
    }
}

impl BoundBox for Element {
    #[inline]
    fn bbox(&self) -> Bbox {
        self.inner.bbox()
    }
}

impl Translate for Element {
    fn translate(&mut self, p: Point) {
        self.inner.translate(p);
    }
}

/// A text annotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextElement {
    /// The string value of the annotation.
    pub string: ArcStr,
    /// The location of the annotation
    pub loc: Point,
    /// The layer on which the annotation resides.
    pub layer: GdsLayerSpec,
}

impl TextElement {
    pub fn new(string: impl Into<ArcStr>, loc: Point, layer: GdsLayerSpec) -> Self {
        Self {
            string: string.into(),
            loc,
            layer,
        }
    }
}

impl Translate for TextElement {
    fn translate(&mut self, p: Point) {
        self.loc.translate(p);
    }
}

impl Cell {
    /// Create a new and empty Cell with ID `id`.
    pub fn new(id: CellKey) -> Self {
        Self {
            id,
            name: arcstr::literal!("unnamed"),
            ..Default::default()
        }
    }

    /// Returns the ID of the cell.
    #[inline]
    pub fn id(&self) -> CellKey {
        self.id
    }

    #[inline]
    pub(crate) fn set_id(&mut self, id: CellKey) {
        self.id = id;
    }

    /// Returns the name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Sets the name of the cell.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.name = name.into();
    }

    /// Returns an iterator over the instances in the cell.
    #[inline]
    pub fn insts(&self) -> impl Iterator<Item = &Instance> {
        self.insts.iter()
    }

    /// Adds an instance to the cell.
    pub fn add_inst(&mut self, inst: impl Into<Instance>) {
        debug_assert!(!self.is_frozen());
        self.insts.push(inst.into());
    }

    /// Returns an iterator over the elements in the cell.
    #[inline]
    pub fn elems(&self) -> impl Iterator<Item = &Element> {
        self.elems.iter()
    }

    /// Adds an element to the cell.
    pub fn add<T>(&mut self, elem: T)
    where
        T: Into<Element>,
    {
        debug_assert!(!self.is_frozen());
        self.elems.push(elem.into());
    }

    /// Draws each polygon on layer `layer`.
    pub fn draw_polygons(&mut self, layer: GdsLayerSpec, polys: impl IntoIterator<Item = Polygon>) {
        debug_assert!(!self.is_frozen());
        self.elems
            .extend(polys.into_iter().map(|poly| Element::new(layer, poly)));
    }

    /// Returns the annotations in the cell.
    #[inline]
    pub fn annotations(&self) -> impl Iterator<Item = &TextElement> {
        self.annotations.iter()
    }

    /// Adds an annotation to the cell.
    #[inline]
    pub fn add_annotation(&mut self, text_elem: impl Into<TextElement>) {
        debug_assert!(!self.is_frozen());
        self.annotations.push(text_elem.into());
    }

    /// Adds all annotations from the given iterator to this cell.
    pub fn add_annotations(&mut self, annotations: impl IntoIterator<Item = TextElement>) {
        debug_assert!(!self.is_frozen());
        self.annotations.extend(annotations);
    }

    /// Creates a rectangular [`Bbox`] surrounding all elements in the layout.
    pub fn bbox(&self) -> Bbox {
        if let Some(ref cache) = self.cache {
            return cache.bbox;
        }
        let mut bbox = Bbox::empty();
        for elem in &self.elems {
            bbox = elem.inner.union(bbox);
        }
        for inst in &self.insts {
            bbox = inst.bbox().union(bbox);
        }
        bbox
    }

    /// Freezes the cell, caching useful values and preventing further modification.
    #[inline]
    pub(crate) fn freeze(&mut self) {
        self.compute_cache();
    }

    /// Returns true if the cell is frozen.
    ///
    /// See [`Cell::freeze`] for more information.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.cache.is_some()
    }

    /// (Re)computes cached values and updates the cache.
    fn compute_cache(&mut self) {
        let cache = Cache { bbox: self.bbox() };
        self.cache = Some(cache);
    }

    /// The instances of the cell, as a slice.
    ///
    /// Prefer to use the [`Cell::insts`] function where possible.
    pub(crate) fn _insts(&self) -> &[Instance] {
        &self.insts
    }
}

impl BoundBox for Cell {
    fn bbox(&self) -> Bbox {
        Cell::bbox(self)
    }
}

impl Instance {
    /// Creates a new [`Instance`] at the origin.
    pub fn new(cell: impl Into<Arc<Cell>>) -> Self {
        let cell = cell.into();
        Self {
            name: cell.name.clone(),
            cell,
            loc: Point::zero(),
        }
    }

    /// Creates a new [`Instance`] at `loc`.
    pub fn at(cell: impl Into<Arc<Cell>>, loc: impl Into<Point>) -> Self {
        let mut inst = Self::new(cell);
        inst.loc = loc.into();
        inst
    }

    /// Returns the name of the instance.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Returns a pointer to the instance's reference cell.
    #[inline]
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Returns the location of the instance.
    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }

    /// Sets the location of the instance.
    #[inline]
    pub fn set_loc(&mut self, p: impl Into<Point>) {
        self.loc = p.into();
    }
}

impl BoundBox for Instance {
    fn bbox(&self) -> Bbox {
        let mut bbox = self.cell.bbox();
        if !bbox.is_empty() {
            bbox.p0.translate(self.loc);
            bbox.p1.translate(self.loc);
        }
        bbox
    }
}

/// A helper function for flattening.
///
/// For each instance in the given list, offsets the instance's location by `offset`
/// and copies each of the instance's elements and annotations, moved to that location,
/// into `elts` and `annotations`.
///
/// Finally, this recurses on any [`Instance`]s contained within each [`Instance`].
pub(crate) fn flatten_recur(
    elts: &mut Vec<Element>,
    annotations: &mut Vec<TextElement>,
    offset: Point,
    insts: &[Instance],
) {
    for inst in insts {
        let loc = offset + inst.loc;
        for elem in inst.cell.elems() {
            let mut elem = elem.clone();
            elem.translate(loc);
            elts.push(elem);
        }
        for ann in inst.cell.annotations() {
            let mut ann = ann.clone();
            ann.translate(loc);
            annotations.push(ann);
        }
        flatten_recur(elts, annotations, loc, inst.cell._insts());
    }
}

#[cfg(test)]
mod tests {
    use maskgeom::{Dims, Rect};
    use slotmap::SlotMap;

    use super::*;

    const LAYER: GdsLayerSpec = GdsLayerSpec(10, 0);

    fn square_cell(map: &mut SlotMap<CellKey, ()>, side: f64) -> Cell {
        let mut cell = Cell::new(map.insert(()));
        cell.add(Element::new(
            LAYER,
            Rect::from_center(Point::zero(), Dims::square(side)),
        ));
        cell
    }

    #[test]
    fn test_freeze_creates_cache() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let key = map.insert(());

        let mut cell = Cell::new(key);

        assert!(!cell.is_frozen());
        assert_eq!(cell.cache, None);

        cell.freeze();

        assert!(cell.is_frozen());
        assert_eq!(
            cell.cache,
            Some(Cache {
                bbox: Bbox::empty(),
            })
        );
    }

    #[test]
    fn test_bbox_includes_instances() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let leaf = Arc::new(square_cell(&mut map, 2.));
        let mut parent = square_cell(&mut map, 2.);
        parent.add_inst(Instance::at(leaf, (10., 5.)));
        let bbox = parent.bbox();
        assert_eq!(bbox.p0, Point::new(-1., -1.));
        assert_eq!(bbox.p1, Point::new(11., 6.));
    }

    #[test]
    fn test_flatten_nested_offsets() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let mut leaf = square_cell(&mut map, 2.);
        leaf.add_annotation(TextElement::new("leaf", Point::zero(), LAYER));
        let leaf = Arc::new(leaf);

        let mut mid = Cell::new(map.insert(()));
        mid.add_inst(Instance::at(leaf.clone(), (1., 0.)));
        mid.add_inst(Instance::at(leaf, (0., 3.)));
        let mid = Arc::new(mid);

        let (mut elems, mut annotations) = (Vec::new(), Vec::new());
        flatten_recur(
            &mut elems,
            &mut annotations,
            Point::new(-1., 0.),
            &[Instance::at(mid, (101., 100.))],
        );

        let centers: Vec<Point> = elems
            .iter()
            .map(|e| e.inner.as_rect().unwrap().center())
            .collect();
        assert_eq!(centers, vec![Point::new(101., 100.), Point::new(100., 103.)]);
        let locs: Vec<Point> = annotations.iter().map(|a| a.loc).collect();
        assert_eq!(locs, vec![Point::new(101., 100.), Point::new(100., 103.)]);
    }
}
