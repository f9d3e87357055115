//! The mask context: configuration, layers, and generated cells.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::component::Component;
use crate::config::{DesignRules, MaskConfig};
use crate::error::{with_err_context, ErrorContext, Result};
use crate::generation::GeneratedCheck;
use crate::layout::cell::{Cell, CellKey, Instance};
use crate::layout::context::{LayoutCtx, LayoutData};
use crate::layout::layers::{GdsLayerSpec, Layers};
use crate::layout::library::Library;
use crate::log::debug;

pub(crate) struct MaskData {
    config: MaskConfig,
    layers: Layers,
    layouts: LayoutData,
}

impl MaskData {
    #[inline]
    pub(crate) fn layouts_mut(&mut self) -> &mut LayoutData {
        &mut self.layouts
    }
}

/// A handle to the state shared by every builder of one mask.
///
/// Cloning the handle is cheap; clones share their cells.
#[derive(Clone)]
pub struct MaskCtx {
    inner: Arc<RwLock<MaskData>>,
}

impl MaskCtx {
    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<MaskData> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<MaskData> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a context for the given configuration.
    pub fn from_config(config: MaskConfig) -> Result<Self> {
        let layers = config.layer_table()?;
        Self::with_layers(config, layers)
    }

    /// Creates a context whose layer table replaces the one in `config`.
    ///
    /// Fails if the design rules of `config` are out of range.
    pub fn with_layers(config: MaskConfig, layers: Layers) -> Result<Self> {
        config.rules.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(MaskData {
                config,
                layers,
                layouts: LayoutData::new(),
            })),
        })
    }

    /// Returns a copy of the configuration.
    pub fn config(&self) -> MaskConfig {
        self.read().config.clone()
    }

    pub fn rules(&self) -> DesignRules {
        self.read().config.rules
    }

    /// Returns a copy of the layer table.
    pub fn layers(&self) -> Layers {
        self.read().layers.clone()
    }

    /// Resolves a logical layer name to its physical layer.
    pub fn layer(&self, name: &str) -> Result<GdsLayerSpec> {
        self.read().layers.spec(name)
    }

    /// Returns every registered cell.
    pub fn cells(&self) -> Vec<Arc<Cell>> {
        self.read().layouts.cells().cloned().collect()
    }

    pub fn num_cells(&self) -> usize {
        self.read().layouts.cells().count()
    }

    /// Creates an instance of component `T`, generating its cell if needed.
    ///
    /// The component is validated before the cache is consulted, so invalid parameters
    /// never register a cell.
    pub fn instantiate_layout<T>(&self, params: &T::Params) -> Result<Instance>
    where
        T: Component,
    {
        let component = T::new(params, self)?;
        let check = {
            let mut inner = self.write();
            inner.layouts.get_generated_cell(&component)?
        };

        Ok(match check {
            GeneratedCheck::Exists(cell) => Instance::new(cell),
            GeneratedCheck::MustGenerate(id) => {
                let cell = self.generate_layout(component, id)?;
                Instance::new(cell)
            }
        })
    }

    pub(crate) fn generate_layout<T>(&self, component: T, id: CellKey) -> Result<Arc<Cell>>
    where
        T: Component,
    {
        let mut ctx = LayoutCtx {
            inner: self.clone(),
            cell: Cell::new(id),
        };
        let name = component.name();
        ctx.cell.set_name(name.clone());
        with_err_context(component.layout(&mut ctx), || ErrorContext::BuildBlock {
            name: name.clone(),
            kind: std::any::type_name::<T>(),
        })?;
        debug!("generated cell {name}");

        let cell = {
            let mut inner = self.write();
            inner.layouts.set_cell(ctx.cell)
        };
        Ok(cell)
    }

    /// Registers a cell built outside of a [`Component`], giving it a fresh identity.
    pub fn add_cell(&self, mut cell: Cell) -> Arc<Cell> {
        let mut inner = self.write();
        let id = inner.layouts.gen_id();
        cell.set_id(id);
        inner.layouts.set_cell(cell)
    }

    /// Writes the hierarchical layout of component `T` to a GDS file.
    pub fn write_layout<T>(&self, params: &T::Params, path: impl AsRef<Path>) -> Result<()>
    where
        T: Component,
    {
        let path = path.as_ref();
        let inner = || -> Result<()> {
            let inst = self.instantiate_layout::<T>(params)?;
            self.library(inst.cell()).save_gds(path)
        };
        with_err_context(inner(), || {
            ErrorContext::Task(arcstr::format!("writing layout to file {:?}", path))
        })
    }

    /// Collects the hierarchy under `top`, applying the configured collision policy.
    pub fn library(&self, top: &Arc<Cell>) -> Library {
        Library::collect(top).with_policy(self.read().config.collision)
    }
}
