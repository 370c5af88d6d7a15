//! CLI command implementations.

pub mod build;
pub mod check;
pub mod modules;
pub mod plan;
