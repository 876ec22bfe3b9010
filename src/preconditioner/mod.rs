//! Preconditioners for the iterative solvers.
//!
//! Only diagonal (Jacobi) scaling is provided; it is cheap to build from an
//! MNA matrix and needs no factorization.

pub mod jacobi;

pub use jacobi::{Jacobi, apply_preconditioner};
