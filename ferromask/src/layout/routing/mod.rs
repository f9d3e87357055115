//! Wire routing.

pub mod manual;
