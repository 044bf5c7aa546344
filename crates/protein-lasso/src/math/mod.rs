//! Small dense containers shared by the design matrix and the summaries.
//!
//! `Array2` is a row-major matrix and `Array1` a plain vector wrapper. Both
//! stay dependency-light; the heavy lifting happens on sparse supports.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
