//! Matrix backends: compressed sparse column storage and dense faer matrices.

pub mod dense;
pub mod sparse;

pub use sparse::CscMatrix;
