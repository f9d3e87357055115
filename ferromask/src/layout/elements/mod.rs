//! Parametric shape generators.

pub mod label;
pub mod shapes;
