//! Utilities for GDS conversion.
//!
//! Converts between the mask layout data-model and [`gds21`] structures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use derivative::Derivative;
use maskgeom::ops::{fracture, path_to_polygons};
use maskgeom::{Path, Point, Polygon, Rect, Shape};
use slotmap::SecondaryMap;

use super::error::{ErrorContext, ErrorHelper};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::{with_err_context, ErrorContext as MaskErrorContext, ErrorSource, Result};
use crate::layout::cell::{Cell, CellKey, Element, Instance, TextElement};
use crate::layout::context::LayoutData;
use crate::layout::error::{LayoutError, LayoutResult};
use crate::layout::layers::GdsLayerSpec;
use crate::layout::library::Library;
use crate::log::{debug, warn};

/// Database units per micron.
///
/// Layout coordinates are in microns; GDS coordinates are integer nanometers.
const DB_PER_UM: f64 = 1000.;

/// A GDSII exporter.
///
/// Converts a collected [`Library`] to a GDSII library ([`gds21::GdsLibrary`]).
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GdsExporter<'a> {
    #[derivative(Debug = "ignore")]
    lib: &'a Library,
    backtrace: Vec<ErrorContext>,
    names: SecondaryMap<CellKey, ArcStr>,
}

/// A GDSII importer.
///
/// Imports cells from a [`gds21::GdsLibrary`] into a mask context.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GdsImporter<'a> {
    #[derivative(Debug = "ignore")]
    layouts: &'a mut LayoutData,
    backtrace: Vec<ErrorContext>,
    unsupported: Vec<gds21::GdsElement>,
    cell_map: HashMap<ArcStr, Arc<Cell>>,
}

/// Additional [`Library`] methods for GDSII conversion.
impl Library {
    /// Converts the library to a GDSII library.
    ///
    /// Fails if the library's [`CollisionPolicy`](crate::layout::library::CollisionPolicy)
    /// rejects its cell names.
    pub fn to_gds_lib(&self) -> Result<gds21::GdsLibrary> {
        let inner = || -> Result<gds21::GdsLibrary> {
            let names = self.cell_names(self.policy())?;
            let gdslib = GdsExporter {
                lib: self,
                backtrace: Vec::new(),
                names,
            }
            .export_lib()
            .map_err(ErrorSource::Layout)?;
            Ok(gdslib)
        };
        with_err_context(inner(), || {
            MaskErrorContext::Task(arcstr::format!(
                "converting library of {} to GDS",
                self.top().name()
            ))
        })
    }

    /// Saves the library to a GDS file, creating parent directories as needed.
    pub fn save_gds(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let gdslib = self.to_gds_lib()?;
        crate::io::create_parent_dir(path)?;
        with_err_context(
            gdslib
                .save(path)
                .map_err(LayoutError::from)
                .map_err(ErrorSource::Layout),
            || MaskErrorContext::CreateFile(path.to_path_buf()),
        )?;
        debug!("wrote {} cells to {:?}", self.len(), path);
        Ok(())
    }
}

/// Additional [`MaskCtx`] methods for GDSII conversion.
impl MaskCtx {
    /// Adds cells from a GDSII library to the context.
    ///
    /// Returns the registered cells by struct name.
    pub fn from_gds_lib(&self, gdslib: &gds21::GdsLibrary) -> Result<HashMap<ArcStr, Arc<Cell>>> {
        let mut data = self.write();
        let mut importer = GdsImporter::new(data.layouts_mut());
        importer.import_all(gdslib).map_err(ErrorSource::Layout)?;
        let GdsImporter {
            unsupported,
            cell_map,
            ..
        } = importer;
        if !unsupported.is_empty() {
            warn!(
                "skipped {} unsupported GDS elements: {:?}",
                unsupported.len(),
                unsupported
            );
        }
        Ok(cell_map)
    }

    /// Adds cells from a GDS file to the context.
    pub fn from_gds(&self, path: impl AsRef<std::path::Path>) -> Result<HashMap<ArcStr, Arc<Cell>>> {
        let path = path.as_ref();
        let library = with_err_context(
            gds21::GdsLibrary::load(path)
                .map_err(LayoutError::from)
                .map_err(ErrorSource::Layout),
            || MaskErrorContext::ReadFile(path.to_path_buf()),
        )?;
        self.from_gds_lib(&library)
    }
}

impl<'a> GdsExporter<'a> {
    /// Exports to a [`gds21::GdsLibrary`].
    fn export_lib(&mut self) -> LayoutResult<gds21::GdsLibrary> {
        self.backtrace.push(ErrorContext::Library);
        let mut gdslib = gds21::GdsLibrary::new(self.lib.top().name().to_string());
        // User unit 1um, database unit 1nm.
        gdslib.units = gds21::GdsUnits::new(1e-3, 1e-9);
        for cell in self.lib.cells() {
            let strukt = self.export_cell(cell)?;
            gdslib.structs.push(strukt);
        }
        self.backtrace.pop();
        Ok(gdslib)
    }

    /// Converts a [`Cell`] to a [`gds21::GdsStruct`] cell definition.
    fn export_cell(&mut self, cell: &Arc<Cell>) -> LayoutResult<gds21::GdsStruct> {
        self.backtrace.push(ErrorContext::Cell(cell.name().clone()));
        let mut elems = Vec::new();

        for inst in cell.insts() {
            elems.push(self.export_instance(inst)?.into());
        }

        // Each element can produce more than one GDS boundary.
        self.backtrace.push(ErrorContext::Geometry);
        for elem in cell.elems() {
            elems.extend(self.export_element(elem)?);
        }
        self.backtrace.pop();

        self.backtrace.push(ErrorContext::Annotations);
        for annotation in cell.annotations() {
            elems.push(self.export_annotation(annotation)?);
        }
        self.backtrace.pop();

        let name = self
            .unwrap(
                self.names.get(cell.id()),
                format!("no name assigned to cell {}", cell.name()),
            )?
            .to_string();
        let mut strukt = gds21::GdsStruct::new(name);
        strukt.elems = elems;

        self.backtrace.pop();
        Ok(strukt)
    }

    /// Converts an [`Instance`] to a GDS instance ([`gds21::GdsStructRef`]).
    fn export_instance(&mut self, inst: &Instance) -> LayoutResult<gds21::GdsStructRef> {
        self.backtrace
            .push(ErrorContext::Instance(inst.name().clone()));
        let cell = inst.cell();
        let name = self
            .unwrap(
                self.names.get(cell.id()),
                format!("instance of uncollected cell {}", cell.name()),
            )?
            .to_string();
        let gdsinst = gds21::GdsStructRef {
            name,
            xy: self.export_point(&inst.loc())?,
            ..Default::default()
        };
        self.backtrace.pop();
        Ok(gdsinst)
    }

    /// Converts an [`Element`] into zero or more [`gds21::GdsElement`]s.
    ///
    /// Polygons with holes are fractured and paths are converted to polygons,
    /// so every element is written as one or more boundaries.
    pub fn export_element(&mut self, elem: &Element) -> LayoutResult<Vec<gds21::GdsElement>> {
        let polys = match &elem.inner {
            Shape::Rect(r) => return Ok(vec![self.export_rect(r, elem.layer)?]),
            Shape::Polygon(poly) if poly.has_holes() => fracture(poly),
            Shape::Polygon(poly) => vec![poly.clone()],
            Shape::Path(path) => self.export_path(path),
        };
        polys
            .iter()
            .filter(|poly| poly.points.len() >= 3)
            .map(|poly| self.export_polygon(poly, elem.layer))
            .collect()
    }

    fn export_path(&self, path: &Path) -> Vec<Polygon> {
        path_to_polygons(path)
            .iter()
            .flat_map(|poly| {
                if poly.has_holes() {
                    fracture(poly)
                } else {
                    vec![poly.clone()]
                }
            })
            .collect()
    }

    /// Converts a [`Rect`] to a closed five-point [`gds21::GdsBoundary`].
    fn export_rect(&mut self, r: &Rect, layer: GdsLayerSpec) -> LayoutResult<gds21::GdsElement> {
        let p0 = self.export_point(&r.p0)?;
        let p1 = self.export_point(&r.p1)?;
        let (x0, y0, x1, y1) = (p0.x, p0.y, p1.x, p1.y);
        let xy = gds21::GdsPoint::vec(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        Ok(gds21::GdsBoundary {
            layer: layer.0,
            datatype: layer.1,
            xy,
            ..Default::default()
        }
        .into())
    }

    /// Converts a hole-free [`Polygon`] to a [`gds21::GdsBoundary`].
    ///
    /// GDS boundaries repeat their first point for closure,
    /// so an N-sided polygon is described by N+1 points.
    fn export_polygon(
        &mut self,
        poly: &Polygon,
        layer: GdsLayerSpec,
    ) -> LayoutResult<gds21::GdsElement> {
        self.assert(
            !poly.has_holes(),
            "polygons with holes must be fractured before export",
        )?;
        let mut xy = poly
            .points
            .iter()
            .map(|p| self.export_point(p))
            .collect::<LayoutResult<Vec<_>>>()?;
        if let Some(first) = xy.first().cloned() {
            xy.push(first);
        }
        Ok(gds21::GdsBoundary {
            layer: layer.0,
            datatype: layer.1,
            xy,
            ..Default::default()
        }
        .into())
    }

    /// Converts a [`TextElement`] to a [`gds21::GdsElement`].
    pub fn export_annotation(
        &mut self,
        text_elem: &TextElement,
    ) -> LayoutResult<gds21::GdsElement> {
        Ok(gds21::GdsTextElem {
            string: text_elem.string.to_string(),
            layer: text_elem.layer.0,
            texttype: text_elem.layer.1,
            xy: self.export_point(&text_elem.loc)?,
            ..Default::default()
        }
        .into())
    }

    /// Converts a [`Point`] in microns to a [`gds21::GdsPoint`] in database units.
    pub fn export_point(&mut self, pt: &Point) -> LayoutResult<gds21::GdsPoint> {
        let x = self.export_coord(pt.x)?;
        let y = self.export_coord(pt.y)?;
        Ok(gds21::GdsPoint::new(x, y))
    }

    fn export_coord(&self, v: f64) -> LayoutResult<i32> {
        let db = (v * DB_PER_UM).round();
        self.assert(
            db.is_finite() && db >= i32::MIN as f64 && db <= i32::MAX as f64,
            format!("coordinate {v} um does not fit in a GDS point"),
        )?;
        Ok(db as i32)
    }
}

impl ErrorHelper for GdsExporter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Export {
            message: msg.into(),
            stack: self.backtrace.clone(),
        }
    }
}

/// A helper for retrieving GDS dependencies in reverse topological order.
///
/// Each item in the ordered return value is guaranteed *not* to instantiate any item which
/// comes later.
#[derive(Debug)]
pub struct GdsDepOrder<'a> {
    strukts: HashMap<&'a str, &'a gds21::GdsStruct>,
    stack: Vec<&'a gds21::GdsStruct>,
    seen: HashSet<&'a str>,
}

impl<'a> GdsDepOrder<'a> {
    /// Creates a new [`GdsDepOrder`] for a [`gds21::GdsLibrary`].
    fn new(gdslib: &'a gds21::GdsLibrary) -> Self {
        let strukts = gdslib
            .structs
            .iter()
            .map(|s| (s.name.as_str(), s))
            .collect();
        Self {
            strukts,
            stack: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns a reverse topological sort of all structs in `gdslib`.
    ///
    /// Structs keep their library order where dependencies allow.
    fn total_order(mut self, gdslib: &'a gds21::GdsLibrary) -> Vec<&'a gds21::GdsStruct> {
        for s in &gdslib.structs {
            self.push(s);
        }
        self.stack
    }

    /// Adds all of `strukt`'s dependencies, and then `strukt` itself, to the stack.
    ///
    /// References to structs missing from the library are left for the importer to report.
    fn push(&mut self, strukt: &'a gds21::GdsStruct) {
        if !self.seen.insert(strukt.name.as_str()) {
            return;
        }
        for elem in &strukt.elems {
            use gds21::GdsElement::*;
            let dep = match elem {
                GdsStructRef(ref x) => self.strukts.get(x.name.as_str()).copied(),
                GdsArrayRef(ref x) => self.strukts.get(x.name.as_str()).copied(),
                _ => None,
            };
            if let Some(dep) = dep {
                self.push(dep);
            }
        }
        self.stack.push(strukt);
    }
}

impl<'a> GdsImporter<'a> {
    /// Creates a new [`GdsImporter`].
    fn new(layouts: &'a mut LayoutData) -> Self {
        GdsImporter {
            layouts,
            backtrace: Vec::new(),
            unsupported: Vec::new(),
            cell_map: HashMap::new(),
        }
    }

    /// Imports a [`gds21::GdsLibrary`].
    fn import_all(&mut self, gdslib: &gds21::GdsLibrary) -> LayoutResult<()> {
        self.backtrace.push(ErrorContext::Library);
        self.check_units(&gdslib.units)?;
        for strukt in GdsDepOrder::new(gdslib).total_order(gdslib) {
            self.import_and_add(strukt)?;
        }
        self.backtrace.pop();
        Ok(())
    }

    /// Checks that the database unit is one nanometer.
    fn check_units(&mut self, units: &gds21::GdsUnits) -> LayoutResult<()> {
        self.backtrace.push(ErrorContext::Units);
        let gdsunit = units.db_unit();
        if (gdsunit - 1e-9).abs() >= 1e-12 {
            return self.fail(format!("unsupported GDSII units {gdsunit:10.3e}"));
        }
        self.backtrace.pop();
        Ok(())
    }

    /// Imports and registers a cell.
    fn import_and_add(&mut self, strukt: &gds21::GdsStruct) -> LayoutResult<()> {
        let name = ArcStr::from(strukt.name.as_str());
        if self.cell_map.contains_key(&name) {
            return self.fail(format!("cell {name} defined multiple times in GDS file"));
        }

        let id = self.layouts.gen_id();
        let mut cell = Cell::new(id);
        cell.set_name(name.clone());
        self.import_cell(strukt, &mut cell)?;
        let cell = self.layouts.set_cell(cell);
        self.cell_map.insert(name, cell);
        Ok(())
    }

    /// Imports a GDS cell ([`gds21::GdsStruct`]) into a [`Cell`].
    fn import_cell(&mut self, strukt: &gds21::GdsStruct, cell: &mut Cell) -> LayoutResult<()> {
        self.backtrace
            .push(ErrorContext::Cell(ArcStr::from(strukt.name.as_str())));
        for elem in &strukt.elems {
            use gds21::GdsElement::*;
            match elem {
                GdsBoundary(ref x) => cell.add(self.import_boundary(x)?),
                GdsPath(ref x) => cell.add(self.import_path(x)?),
                GdsBox(ref x) => cell.add(self.import_box(x)?),
                GdsStructRef(ref x) => cell.add_inst(self.import_instance(x)?),
                GdsTextElem(ref x) => cell.add_annotation(self.import_text_elem(x)?),
                GdsArrayRef(_) | GdsNode(_) => self.unsupported.push(elem.clone()),
            }
        }
        self.backtrace.pop();
        Ok(())
    }

    /// Imports a [`gds21::GdsBoundary`] into an [`Element`].
    ///
    /// Axis-aligned four-point boundaries become rectangles.
    fn import_boundary(&mut self, x: &gds21::GdsBoundary) -> LayoutResult<Element> {
        self.backtrace.push(ErrorContext::Geometry);
        let mut pts = self.import_point_vec(&x.xy);
        if pts.len() < 4 || pts.first() != pts.last() {
            return self.fail("GDS boundary must start and end at the same point");
        }
        // Drop the closing point.
        pts.pop();
        let is_rect = pts.len() == 4
            && ((pts[0].x == pts[1].x
                && pts[1].y == pts[2].y
                && pts[2].x == pts[3].x
                && pts[3].y == pts[0].y)
                || (pts[0].y == pts[1].y
                    && pts[1].x == pts[2].x
                    && pts[2].y == pts[3].y
                    && pts[3].x == pts[0].x));
        let inner = if is_rect {
            Shape::Rect(Rect::new(pts[0], pts[2]))
        } else {
            Shape::Polygon(Polygon::new(pts))
        };
        self.backtrace.pop();
        Ok(Element::new(GdsLayerSpec(x.layer, x.datatype), inner))
    }

    /// Imports a [`gds21::GdsBox`] into a rectangular [`Element`].
    fn import_box(&mut self, x: &gds21::GdsBox) -> LayoutResult<Element> {
        // The first and third of the box's five points are opposite corners.
        let inner = Rect::new(self.import_point(&x.xy[0]), self.import_point(&x.xy[2]));
        Ok(Element::new(GdsLayerSpec(x.layer, x.boxtype), inner))
    }

    /// Imports a [`gds21::GdsPath`] into an [`Element`].
    fn import_path(&mut self, x: &gds21::GdsPath) -> LayoutResult<Element> {
        self.backtrace.push(ErrorContext::Geometry);
        let width = self.unwrap(x.width, "GDS path has no width")?;
        let path = Path::new(self.import_point_vec(&x.xy), width as f64 / DB_PER_UM);
        self.backtrace.pop();
        Ok(Element::new(GdsLayerSpec(x.layer, x.datatype), path))
    }

    /// Imports a [`gds21::GdsTextElem`] into a [`TextElement`].
    fn import_text_elem(&mut self, x: &gds21::GdsTextElem) -> LayoutResult<TextElement> {
        Ok(TextElement::new(
            x.string.as_str(),
            self.import_point(&x.xy),
            GdsLayerSpec(x.layer, x.texttype),
        ))
    }

    /// Imports a [`gds21::GdsStructRef`] into an [`Instance`].
    ///
    /// The referenced struct must already be imported.
    fn import_instance(&mut self, sref: &gds21::GdsStructRef) -> LayoutResult<Instance> {
        let cname = ArcStr::from(sref.name.as_str());
        self.backtrace.push(ErrorContext::Instance(cname.clone()));
        if sref.strans.is_some() {
            return self.fail("instance transformations are not supported");
        }
        let cell = self
            .unwrap(
                self.cell_map.get(&cname),
                format!("instance of undefined cell {cname}"),
            )?
            .clone();
        let inst = Instance::at(cell, self.import_point(&sref.xy));
        self.backtrace.pop();
        Ok(inst)
    }

    /// Imports a [`Point`], converting database units to microns.
    fn import_point(&self, pt: &gds21::GdsPoint) -> Point {
        Point::new(pt.x as f64 / DB_PER_UM, pt.y as f64 / DB_PER_UM)
    }

    fn import_point_vec(&self, pts: &[gds21::GdsPoint]) -> Vec<Point> {
        pts.iter().map(|p| self.import_point(p)).collect()
    }
}

impl<'a> ErrorHelper for GdsImporter<'a> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Import {
            message: msg.into(),
            stack: self.backtrace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use maskgeom::Dims;
    use slotmap::SlotMap;

    use super::*;

    const W1: GdsLayerSpec = GdsLayerSpec(10, 0);

    fn boundaries(strukt: &gds21::GdsStruct) -> Vec<&gds21::GdsBoundary> {
        strukt
            .elems
            .iter()
            .filter_map(|e| match e {
                gds21::GdsElement::GdsBoundary(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_export_units_and_rect() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let mut cell = Cell::new(map.insert(()));
        cell.set_name("rect");
        cell.add(Element::new(
            W1,
            Rect::from_center(Point::new(0.5, 0.), Dims::new(3., 2.)),
        ));
        let lib = Library::collect(&Arc::new(cell));
        let gdslib = lib.to_gds_lib().unwrap();
        assert_eq!(gdslib.units.db_unit(), 1e-9);
        assert_eq!(gdslib.structs.len(), 1);
        let b = boundaries(&gdslib.structs[0]);
        assert_eq!(b.len(), 1);
        assert_eq!((b[0].layer, b[0].datatype), (10, 0));
        assert_eq!(b[0].xy.len(), 5);
        assert_eq!(b[0].xy[0], gds21::GdsPoint::new(-1000, -1000));
        assert_eq!(b[0].xy[2], gds21::GdsPoint::new(2000, 1000));
    }

    #[test]
    fn test_holes_are_fractured() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let outer = Rect::from_center(Point::zero(), Dims::square(10.)).to_poly();
        let hole = Rect::from_center(Point::zero(), Dims::square(4.)).to_poly();
        let mut cell = Cell::new(map.insert(()));
        cell.add(Element::new(
            W1,
            Polygon::with_holes(outer.points, vec![hole.points]),
        ));
        let lib = Library::collect(&Arc::new(cell));
        let gdslib = lib.to_gds_lib().unwrap();
        let b = boundaries(&gdslib.structs[0]);
        assert!(b.len() >= 2);
        assert!(b.iter().all(|b| b.xy.first() == b.xy.last()));
    }

    #[test]
    fn test_out_of_range_coordinate() {
        let mut map: SlotMap<CellKey, ()> = SlotMap::with_key();
        let mut cell = Cell::new(map.insert(()));
        cell.add(Element::new(
            W1,
            Rect::new(Point::zero(), Point::new(1e9, 1.)),
        ));
        let lib = Library::collect(&Arc::new(cell));
        let err = lib.to_gds_lib().unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Layout(LayoutError::Export { .. })
        ));
    }

    #[test]
    fn test_dep_order_puts_children_first() {
        let mut gdslib = gds21::GdsLibrary::new("lib");
        let mut top = gds21::GdsStruct::new("top");
        top.elems.push(
            gds21::GdsStructRef {
                name: "leaf".to_string(),
                ..Default::default()
            }
            .into(),
        );
        gdslib.structs.push(top);
        gdslib.structs.push(gds21::GdsStruct::new("leaf"));
        let order: Vec<&str> = GdsDepOrder::new(&gdslib)
            .total_order(&gdslib)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(order, vec!["leaf", "top"]);
    }
}
