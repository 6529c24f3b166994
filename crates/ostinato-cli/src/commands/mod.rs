//! CLI command implementations.

pub mod common;
pub mod drivers;
pub mod load;
pub mod tick;
pub mod validate;
