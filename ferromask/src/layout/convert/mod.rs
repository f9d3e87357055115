//! Conversion to and from GDSII.

pub mod error;
pub mod gds;
