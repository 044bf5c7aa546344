//! Command implementations behind the `protein-lasso` binary.
pub mod commands;
