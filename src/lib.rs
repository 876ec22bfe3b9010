//! circsolve: Jacobi-preconditioned Krylov solvers for MNA circuit systems
//!
//! This crate solves the sparse linear systems `A x = b` produced by modified
//! nodal analysis with the Conjugate Gradient method (symmetric
//! positive-definite systems) and the Biconjugate Gradient method (general
//! systems). Matrices are consumed through the [`SparseOperator`] trait;
//! a compressed sparse column backend and a dense `faer::Mat` backend are
//! provided.
//!
//! ```rust
//! use circsolve::{CscMatrix, bicg_solve};
//! let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 4.0), (0, 1, 1.0), (1, 1, 3.0)]).unwrap();
//! let mut x = vec![0.0; 2];
//! let stats = bicg_solve(&a, &[5.0, 3.0], &mut x).unwrap();
//! assert!(stats.converged);
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use self::core::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;
pub use utils::*;
