//! Factory for the Krylov solvers (KSP).
//!
//! `KspContext` bundles the system matrix, the solver kind and the solver
//! options so that a driver (e.g. an MNA solve step) can pick the method once
//! and then solve for as many right-hand sides as it needs.
//!
//! Circuit netlists ask for the iterative path with an `ITER` option and
//! flag symmetric positive-definite systems with `SPD`; [`SolverKind::for_system`]
//! maps that choice to CG or BiCG.

use std::fmt;
use std::str::FromStr;

use num_traits::Float;
use tracing::debug;

use crate::config::options::SolverOptions;
use crate::core::traits::SparseOperator;
use crate::error::KError;
use crate::matrix::CscMatrix;
use crate::solver::{BiCgSolver, CgSolver, LinearSolver};
use crate::utils::convergence::SolveStats;

/// Enum representing the available Krylov solver types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Conjugate Gradient (CG) method (for SPD matrices)
    Cg,
    /// Biconjugate Gradient (BiCG) method (general matrices)
    BiCg,
}

impl SolverKind {
    /// CG for systems declared SPD, BiCG otherwise.
    pub fn for_system(spd: bool) -> Self {
        if spd { SolverKind::Cg } else { SolverKind::BiCg }
    }
}

impl FromStr for SolverKind {
    type Err = KError;

    fn from_str(s: &str) -> Result<Self, KError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cg" => Ok(SolverKind::Cg),
            "bicg" => Ok(SolverKind::BiCg),
            other => Err(KError::UnknownSolver(other.to_string())),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Cg => f.write_str("cg"),
            SolverKind::BiCg => f.write_str("bicg"),
        }
    }
}

/// Context and configuration for a Krylov subspace solve.
pub struct KspContext<M, T> {
    /// The type of Krylov solver to use
    pub kind: SolverKind,
    /// The system matrix
    pub a: M,
    pub opts: SolverOptions<T>,
}

impl<M, T> KspContext<M, T>
where
    M: SparseOperator<T>,
    T: Float + Send + Sync,
{
    pub fn new(kind: SolverKind, a: M) -> Self {
        Self { kind, a, opts: SolverOptions::default() }
    }

    pub fn with_options(mut self, opts: SolverOptions<T>) -> Self {
        self.opts = opts;
        self
    }

    /// Solve `A x = b` with the configured solver.
    ///
    /// # Arguments
    /// * `b` - Right-hand side vector
    /// * `x` - Initial guess, overwritten with the solution
    ///
    /// # Returns
    /// * `Ok(SolveStats)` whether or not the tolerance was reached
    /// * `Err(KError)` on invalid input, allocation failure or breakdown
    pub fn solve(&self, b: &[T], x: &mut [T]) -> Result<SolveStats<T>, KError> {
        debug!(kind = %self.kind, n = b.len(), "dispatching solve");
        match self.kind {
            SolverKind::Cg => CgSolver::with_options(self.opts).solve(&self.a, b, x),
            SolverKind::BiCg => BiCgSolver::with_options(self.opts).solve(&self.a, b, x),
        }
    }
}

impl<T> KspContext<CscMatrix<T>, T>
where
    T: Float + Send + Sync,
{
    /// Pick the solver from the matrix itself: CG when `a` is symmetric
    /// within `sym_tol` with a strictly positive diagonal, BiCG otherwise.
    ///
    /// A positive diagonal is necessary but not sufficient for definiteness;
    /// callers that know better should use [`KspContext::new`].
    pub fn auto(a: CscMatrix<T>, sym_tol: T) -> Result<Self, KError> {
        let positive_diag = a.diagonal()?.iter().all(|&d| d > T::zero());
        let kind = SolverKind::for_system(positive_diag && a.is_symmetric(sym_tol));
        Ok(Self::new(kind, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn laplacian(n: usize) -> CscMatrix<f64> {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 4.0));
            if i > 0 {
                t.push((i, i - 1, -1.0));
                t.push((i - 1, i, -1.0));
            }
        }
        CscMatrix::from_triplets(n, n, &t).unwrap()
    }

    #[test]
    fn kind_parsing_and_selection() {
        assert_eq!("CG".parse::<SolverKind>().unwrap(), SolverKind::Cg);
        assert_eq!(" bicg ".parse::<SolverKind>().unwrap(), SolverKind::BiCg);
        assert!(matches!("gmres".parse::<SolverKind>(), Err(KError::UnknownSolver(_))));
        assert_eq!(SolverKind::for_system(true), SolverKind::Cg);
        assert_eq!(SolverKind::for_system(false), SolverKind::BiCg);
        assert_eq!(SolverKind::BiCg.to_string(), "bicg");
    }

    #[test]
    fn auto_selects_by_structure() {
        let spd = KspContext::auto(laplacian(4), 0.0).unwrap();
        assert_eq!(spd.kind, SolverKind::Cg);
        let nonsym =
            CscMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 1, 2.0)])
                .unwrap();
        assert_eq!(KspContext::auto(nonsym, 0.0).unwrap().kind, SolverKind::BiCg);
    }

    #[test]
    fn context_solves_with_either_kind() {
        let a = laplacian(6);
        let x_true = vec![1.0, -1.0, 2.0, 0.5, 3.0, -2.0];
        let mut b = vec![0.0; 6];
        a.multiply(&x_true, &mut b);
        let opts = SolverOptions::new(1e-7, 50);
        for kind in [SolverKind::Cg, SolverKind::BiCg] {
            let ctx = KspContext::new(kind, a.clone()).with_options(opts);
            let mut x = vec![0.0; 6];
            let stats = ctx.solve(&b, &mut x).unwrap();
            assert!(stats.converged, "{kind} did not converge: {stats:?}");
            for (xi, ti) in x.iter().zip(&x_true) {
                assert_abs_diff_eq!(*xi, *ti, epsilon = 1e-6);
            }
        }
    }
}
