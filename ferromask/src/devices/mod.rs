//! Primitive cells: the ferroelectric device stack and its contact pads.

pub mod ferro;
pub mod pad;
