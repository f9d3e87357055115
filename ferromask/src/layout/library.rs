//! Collection of a cell hierarchy into a library.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use super::cell::{Cell, CellKey};
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};

/// What to do when distinct cells in a library share a name.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Append `_1`, `_2`, ... to later cells. The top cell is never renamed.
    #[default]
    Rename,
    /// Fail with [`ErrorSource::NameCollision`].
    Error,
}

/// Every distinct cell reachable from a root cell.
///
/// Cells are keyed on their [`CellKey`]; names are metadata and may repeat.
#[derive(Debug, Clone)]
pub struct Library {
    top: Arc<Cell>,
    cells: Vec<Arc<Cell>>,
    index: HashSet<CellKey>,
    policy: CollisionPolicy,
}

impl Library {
    /// Collects `root` and every cell it references, depth first with the root first.
    ///
    /// A cell referenced along several paths is collected once.
    pub fn collect(root: &Arc<Cell>) -> Self {
        let mut lib = Self {
            top: root.clone(),
            cells: Vec::new(),
            index: HashSet::new(),
            policy: CollisionPolicy::default(),
        };
        lib.visit(root);
        lib
    }

    fn visit(&mut self, cell: &Arc<Cell>) {
        if !self.index.insert(cell.id()) {
            return;
        }
        self.cells.push(cell.clone());
        for inst in cell.insts() {
            self.visit(inst.cell());
        }
    }

    /// Sets the policy applied to name collisions on export.
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// The root cell.
    #[inline]
    pub fn top(&self) -> &Arc<Cell> {
        &self.top
    }

    /// Iterates over the collected cells in visiting order.
    pub fn cells(&self) -> impl Iterator<Item = &Arc<Cell>> {
        self.cells.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: CellKey) -> bool {
        self.index.contains(&id)
    }

    /// Counts the collected cells carrying each name.
    pub fn name_counts(&self) -> HashMap<ArcStr, usize> {
        let mut counts = HashMap::new();
        for cell in self.cells() {
            *counts.entry(cell.name().clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Assigns every collected cell a unique name under `policy`.
    pub fn cell_names(&self, policy: CollisionPolicy) -> Result<SecondaryMap<CellKey, ArcStr>> {
        let mut names_used = HashSet::with_capacity(self.cells.len());
        names_used.insert(self.top.name().clone());

        let mut names = SecondaryMap::new();
        names.insert(self.top.id(), self.top.name().clone());

        for cell in self.cells.iter().filter(|c| c.id() != self.top.id()) {
            let name = cell.name();
            let name = if names_used.contains(name) {
                if policy == CollisionPolicy::Error {
                    return Err(ErrorSource::NameCollision(name.clone()).into());
                }
                let mut i = 1;
                loop {
                    let newname = arcstr::format!("{}_{}", name, i);
                    if !names_used.contains(&newname) {
                        break newname;
                    }
                    i += 1;
                }
            } else {
                name.clone()
            };
            names_used.insert(name.clone());
            names.insert(cell.id(), name);
        }
        Ok(names)
    }
}
