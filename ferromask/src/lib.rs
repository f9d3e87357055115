pub mod blocks;
pub mod component;
pub mod config;
pub mod data;
pub mod deps;
pub mod devices;
pub mod error;
pub mod io;
pub mod layout;
pub mod mask;

pub(crate) mod generation;
pub(crate) mod log;
