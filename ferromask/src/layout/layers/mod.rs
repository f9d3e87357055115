//! Utilities and types for managing mask layers.

use std::collections::HashMap;
use std::fmt::Display;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};

new_key_type! {
    /// A unique identifier for a layer in a mask configuration.
    pub struct LayerKey;
}

/// A GDS layer specification.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GdsLayerSpec(pub i16, pub i16);

impl Display for GdsLayerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// How the merged geometry on a layer is post-processed.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LayerMode {
    /// Merged polygons are kept as drawn.
    #[default]
    Fill,
    /// Merged polygons are replaced by a ring hugging their outside.
    Boundary,
}

/// One row of a layer table, as found in TOML `[[layers]]` entries and CSV files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub name: String,
    pub layer: i16,
    pub datatype: i16,
    #[serde(default)]
    pub mode: LayerMode,
}

impl LayerRecord {
    pub fn new(name: impl Into<String>, layer: i16, datatype: i16, mode: LayerMode) -> Self {
        Self {
            name: name.into(),
            layer,
            datatype,
            mode,
        }
    }
}

/// The layer table of the reference ferroelectric mask.
///
/// M2 and W2 share a physical layer on purpose.
pub fn reference_layer_records() -> Vec<LayerRecord> {
    use LayerMode::*;
    vec![
        LayerRecord::new("M0", 0, 0, Fill),
        LayerRecord::new("M1", 1, 0, Fill),
        LayerRecord::new("M2", 11, 0, Boundary),
        LayerRecord::new("W1", 10, 0, Boundary),
        LayerRecord::new("W2", 11, 0, Boundary),
        LayerRecord::new("V1", 21, 0, Fill),
        LayerRecord::new("V2", 22, 0, Fill),
        LayerRecord::new("V3", 23, 0, Fill),
        LayerRecord::new("V4", 24, 0, Fill),
        LayerRecord::new("label", 50, 0, Fill),
    ]
}

/// Information about a logical layer.
#[derive(Debug, Clone, Eq, PartialEq, Builder, Serialize, Deserialize)]
pub struct LayerInfo {
    /// The logical name of the layer.
    #[builder(setter(into))]
    pub name: ArcStr,
    /// The physical layer and datatype numbers.
    pub spec: GdsLayerSpec,
    /// The post-processing mode.
    #[builder(default)]
    pub mode: LayerMode,
}

impl LayerInfo {
    #[inline]
    pub fn builder() -> LayerInfoBuilder {
        LayerInfoBuilder::default()
    }
}

impl From<&LayerRecord> for LayerInfo {
    fn from(record: &LayerRecord) -> Self {
        Self {
            name: ArcStr::from(record.name.as_str()),
            spec: GdsLayerSpec(record.layer, record.datatype),
            mode: record.mode,
        }
    }
}

/// A logical layer.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    id: LayerKey,
    info: LayerInfo,
}

impl Layer {
    #[inline]
    pub fn id(&self) -> LayerKey {
        self.id
    }

    #[inline]
    pub fn info(&self) -> &LayerInfo {
        &self.info
    }
}

/// A manager for the logical layers of a mask.
///
/// Keeps track of layers in declaration order and indexes them by name.
/// Several logical layers may share one physical [`GdsLayerSpec`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layers {
    slots: SlotMap<LayerKey, Layer>,
    names: HashMap<ArcStr, LayerKey>,
    order: Vec<LayerKey>,
}

impl Layers {
    /// Creates an empty [`Layers`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Layers`] from a list of [`LayerInfo`]s.
    ///
    /// Fails if two entries share a logical name.
    pub fn from_layer_infos(layer_infos: impl IntoIterator<Item = LayerInfo>) -> Result<Self> {
        let mut layers = Self::new();
        for info in layer_infos {
            layers.add(info)?;
        }
        Ok(layers)
    }

    /// Creates a [`Layers`] from layer table records.
    pub fn from_records(records: &[LayerRecord]) -> Result<Self> {
        Self::from_layer_infos(records.iter().map(LayerInfo::from))
    }

    /// Creates a [`Layers`] from a CSV table with columns `name,layer,datatype,mode`.
    pub fn from_csv(csv: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let mut records = Vec::new();
        for record in reader.deserialize() {
            let record: LayerRecord = record?;
            records.push(record);
        }
        Self::from_records(&records)
    }

    /// The layer table of the reference mask.
    pub fn reference() -> Self {
        let mut layers = Self::new();
        for record in reference_layer_records() {
            layers.insert(LayerInfo::from(&record));
        }
        layers
    }

    /// Adds a layer, returning its new key.
    pub fn add(&mut self, info: LayerInfo) -> Result<LayerKey> {
        if self.names.contains_key(&info.name) {
            return Err(ErrorSource::InvalidArgs(format!(
                "layer {} is declared more than once",
                info.name
            ))
            .into());
        }
        Ok(self.insert(info))
    }

    fn insert(&mut self, info: LayerInfo) -> LayerKey {
        let name = info.name.clone();
        let id = self.slots.insert_with_key(|id| Layer { id, info });
        self.names.insert(name, id);
        self.order.push(id);
        id
    }

    /// Returns the layer with the given key.
    #[inline]
    pub fn get(&self, key: LayerKey) -> Option<&Layer> {
        self.slots.get(key)
    }

    /// Returns the key of the layer named `name`.
    #[inline]
    pub fn get_key(&self, name: &str) -> Option<LayerKey> {
        self.names.get(name).copied()
    }

    /// Looks up a layer by logical name.
    pub fn resolve(&self, name: &str) -> Result<&LayerInfo> {
        self.get_key(name)
            .and_then(|key| self.slots.get(key))
            .map(Layer::info)
            .ok_or_else(|| ErrorSource::LayerNotFound(name.to_string()).into())
    }

    /// Returns the physical layer of the layer named `name`.
    pub fn spec(&self, name: &str) -> Result<GdsLayerSpec> {
        Ok(self.resolve(name)?.spec)
    }

    /// Returns the post-processing mode of each physical layer.
    ///
    /// When several logical layers share a physical layer, the one declared first decides.
    pub fn modes(&self) -> HashMap<GdsLayerSpec, LayerMode> {
        let mut modes = HashMap::new();
        for layer in self.iter() {
            modes.entry(layer.spec).or_insert(layer.mode);
        }
        modes
    }

    /// Iterates over layers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerInfo> {
        self.order
            .iter()
            .filter_map(|key| self.slots.get(*key))
            .map(Layer::info)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
