//! Vector kernels and the matrix interface consumed by the solvers.

pub mod traits;
pub mod vector;

pub use traits::{SparseOperator, Transpose};
