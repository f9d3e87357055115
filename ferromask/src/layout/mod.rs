//! Layout cells, layers, and their persistence.

pub mod cell;
pub mod context;
pub mod convert;
pub mod elements;
pub mod error;
pub mod layers;
pub mod library;
pub mod routing;
