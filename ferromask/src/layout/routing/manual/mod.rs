//! Manual routing utilities.

pub mod jog;
