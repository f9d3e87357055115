//! Declarative placement of blocks into a top-level cell.

use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use maskgeom::Point;
use serde::{Deserialize, Serialize};

use super::crossbar::{Crossbar, CrossbarParams};
use super::two_terminal::{TwoTerminal, TwoTerminalParams};
use super::vector::{Vector, VectorParams};
use crate::data::MaskCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::{with_err_context, ErrorContext, Result};
use crate::layout::cell::{Cell, Instance};
use crate::log::info;

/// A block that can be instantiated and placed in the top cell.
#[enum_dispatch]
pub trait BuildBlock {
    /// The block's label.
    fn name(&self) -> &ArcStr;
    /// Where the block's origin lands in the top cell.
    fn at(&self) -> [f64; 2];
    /// Generates the block's cell, returning an instance at the origin.
    fn instantiate(&self, ctx: &MaskCtx) -> Result<Instance>;
}

/// A single padded device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoTerminalBlock {
    pub name: ArcStr,
    pub mesa: f64,
    #[serde(default)]
    pub via: Option<f64>,
    #[serde(default)]
    pub short: bool,
    #[serde(default)]
    pub at: [f64; 2],
}

/// A 1xN vector of devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBlock {
    pub name: ArcStr,
    pub mesas: Vec<f64>,
    #[serde(default)]
    pub via: Option<f64>,
    #[serde(default)]
    pub at: [f64; 2],
}

/// A 2x2 crossbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossbarBlock {
    pub name: ArcStr,
    pub mesas: [[f64; 2]; 2],
    #[serde(default)]
    pub via: Option<f64>,
    #[serde(default)]
    pub at: [f64; 2],
}

#[enum_dispatch(BuildBlock)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    TwoTerminal(TwoTerminalBlock),
    Vector(VectorBlock),
    Crossbar(CrossbarBlock),
}

impl BuildBlock for TwoTerminalBlock {
    fn name(&self) -> &ArcStr {
        &self.name
    }

    fn at(&self) -> [f64; 2] {
        self.at
    }

    fn instantiate(&self, ctx: &MaskCtx) -> Result<Instance> {
        ctx.instantiate_layout::<TwoTerminal>(&TwoTerminalParams {
            name: self.name.clone(),
            mesa: self.mesa,
            via: self.via,
            short: self.short,
        })
    }
}

impl BuildBlock for VectorBlock {
    fn name(&self) -> &ArcStr {
        &self.name
    }

    fn at(&self) -> [f64; 2] {
        self.at
    }

    fn instantiate(&self, ctx: &MaskCtx) -> Result<Instance> {
        ctx.instantiate_layout::<Vector>(&VectorParams {
            name: self.name.clone(),
            mesas: self.mesas.clone(),
            via: self.via,
        })
    }
}

impl BuildBlock for CrossbarBlock {
    fn name(&self) -> &ArcStr {
        &self.name
    }

    fn at(&self) -> [f64; 2] {
        self.at
    }

    fn instantiate(&self, ctx: &MaskCtx) -> Result<Instance> {
        ctx.instantiate_layout::<Crossbar>(&CrossbarParams {
            name: self.name.clone(),
            mesas: self.mesas,
            via: self.via,
        })
    }
}

/// The blocks of a mask and the name of the cell holding them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskPlan {
    pub top: String,
    pub blocks: Vec<Block>,
}

impl Default for MaskPlan {
    /// The reference mask: a single device, a 25-device vector, a crossbar and a shorted device.
    fn default() -> Self {
        Self {
            top: "TOP".to_string(),
            blocks: vec![
                TwoTerminalBlock {
                    name: arcstr::literal!("FE"),
                    mesa: 20.,
                    via: None,
                    short: false,
                    at: [0., 0.],
                }
                .into(),
                VectorBlock {
                    name: arcstr::literal!("VECTOR"),
                    mesas: vec![5.; 25],
                    via: None,
                    at: [300., 0.],
                }
                .into(),
                CrossbarBlock {
                    name: arcstr::literal!("XBAR"),
                    mesas: [[1., 2.], [3., 4.]],
                    via: None,
                    at: [600., 0.],
                }
                .into(),
                TwoTerminalBlock {
                    name: arcstr::literal!("SHORT"),
                    mesa: 1.,
                    via: None,
                    short: true,
                    at: [950., 0.],
                }
                .into(),
            ],
        }
    }
}

impl MaskCtx {
    /// Builds the configured plan.
    pub fn build_plan(&self) -> Result<Arc<Cell>> {
        let plan = self.config().plan;
        self.build_plan_from(&plan)
    }

    /// Instantiates every block of `plan` at its origin inside a new top cell.
    pub fn build_plan_from(&self, plan: &MaskPlan) -> Result<Arc<Cell>> {
        let mut top = Cell::default();
        top.set_name(plan.top.as_str());
        for block in &plan.blocks {
            let at = block.at();
            let mut inst = with_err_context(block.instantiate(self), || {
                ErrorContext::PlaceBlock {
                    name: block.name().clone(),
                    at,
                }
            })?;
            inst.set_loc(Point::new(at[0], at[1]));
            top.add_inst(inst);
        }
        info!("placed {} blocks in {}", plan.blocks.len(), plan.top);
        Ok(self.add_cell(top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskConfig;
    use crate::error::ErrorSource;

    #[test]
    fn test_reference_plan() {
        let ctx = MaskCtx::from_config(MaskConfig::reference_mask()).unwrap();
        let top = ctx.build_plan().unwrap();
        assert_eq!(top.name().as_str(), "TOP");
        let placed: Vec<(String, Point)> = top
            .insts()
            .map(|inst| (inst.cell().name().to_string(), inst.loc()))
            .collect();
        let vector = format!("Vector25_M{}_V2000", vec!["5000"; 25].join("_"));
        assert_eq!(
            placed,
            vec![
                ("2T_M20000_V2000".to_string(), Point::zero()),
                (vector, Point::new(300., 0.)),
                (
                    "XBAR_M1000_2000__3000_4000_V2000".to_string(),
                    Point::new(600., 0.)
                ),
                ("2T_M1000_V2000_short".to_string(), Point::new(950., 0.)),
            ]
        );
    }

    #[test]
    fn test_failed_block_names_context() {
        let ctx = MaskCtx::from_config(MaskConfig::default()).unwrap();
        let plan = MaskPlan {
            top: "TOP".to_string(),
            blocks: vec![VectorBlock {
                name: arcstr::literal!("EMPTY"),
                mesas: Vec::new(),
                via: None,
                at: [10., 20.],
            }
            .into()],
        };
        let err = ctx.build_plan_from(&plan).unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidArgs(_)));
        assert!(err.context().iter().any(|frame| matches!(
            frame,
            ErrorContext::PlaceBlock { name, at } if name.as_str() == "EMPTY" && *at == [10., 20.]
        )));
        assert_eq!(ctx.num_cells(), 0);
    }
}
