//! Context module: solver selection and dispatch.
//!
//! [`ksp_context`] holds `KspContext`, which owns the system matrix and the
//! solver configuration and dispatches to CG or BiCG.
//!
//! # Example
//! ```rust
//! use circsolve::{CscMatrix, KspContext, SolverKind};
//! let a = CscMatrix::<f64>::identity(3);
//! let ksp = KspContext::new(SolverKind::Cg, a);
//! let mut x = vec![0.0; 3];
//! let stats = ksp.solve(&[1.0, 2.0, 3.0], &mut x).unwrap();
//! assert!(stats.converged);
//! assert_eq!(x, vec![1.0, 2.0, 3.0]);
//! ```

pub mod ksp_context;
pub use ksp_context::{KspContext, SolverKind};
