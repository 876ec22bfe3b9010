//! Tunable parameters for the iterative solvers.
//!
//! The defaults reproduce the behaviour circuit netlists expect from the
//! iterative path: ten CG iterations, a BiCG cap five times larger, a
//! relative residual tolerance of `1e-3` and a breakdown threshold of
//! `1e-14`.

use num_traits::Float;

/// What to do with a zero (or non-finite reciprocal) diagonal entry when
/// building the Jacobi preconditioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDiagonal {
    /// Use 1 for that row, i.e. leave it unpreconditioned.
    #[default]
    Unit,
    /// Fail with `KError::ZeroPivot`.
    Reject,
}

/// Solver parameters.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions<T> {
    /// Iteration cap for CG.
    pub max_iters: usize,
    /// Relative residual tolerance `||r|| / ||b||`.
    pub tol: T,
    /// Magnitude below which `rho`, `omega` or `||b||` count as zero.
    pub breakdown_tol: T,
    /// BiCG runs for `bicg_iter_factor * max_iters` iterations at most.
    pub bicg_iter_factor: usize,
    pub zero_diagonal: ZeroDiagonal,
    /// Report a breakdown when `|p^T A p|` vanishes in CG.
    pub guard_curvature: bool,
}

fn cast<T: Float>(v: f64) -> T {
    T::from(v).unwrap_or_else(T::epsilon)
}

impl<T: Float> Default for SolverOptions<T> {
    fn default() -> Self {
        Self {
            max_iters: 10,
            tol: cast(1e-3),
            breakdown_tol: cast(1e-14),
            bicg_iter_factor: 5,
            zero_diagonal: ZeroDiagonal::Unit,
            guard_curvature: false,
        }
    }
}

impl<T: Float> SolverOptions<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self { tol, max_iters, ..Self::default() }
    }
    pub fn with_tol(mut self, tol: T) -> Self {
        self.tol = tol;
        self
    }
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }
    pub fn with_breakdown_tol(mut self, eps: T) -> Self {
        self.breakdown_tol = eps;
        self
    }
    pub fn with_bicg_iter_factor(mut self, factor: usize) -> Self {
        self.bicg_iter_factor = factor;
        self
    }
    pub fn with_zero_diagonal(mut self, policy: ZeroDiagonal) -> Self {
        self.zero_diagonal = policy;
        self
    }
    pub fn with_curvature_guard(mut self, flag: bool) -> Self {
        self.guard_curvature = flag;
        self
    }

    /// Iteration cap actually applied by BiCG.
    pub fn bicg_max_iters(&self) -> usize {
        self.bicg_iter_factor.saturating_mul(self.max_iters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_netlist_behaviour() {
        let opts = SolverOptions::<f64>::default();
        assert_eq!(opts.max_iters, 10);
        assert_eq!(opts.tol, 1e-3);
        assert_eq!(opts.breakdown_tol, 1e-14);
        assert_eq!(opts.bicg_max_iters(), 50);
        assert_eq!(opts.zero_diagonal, ZeroDiagonal::Unit);
        assert!(!opts.guard_curvature);
    }

    #[test]
    fn builder_overrides() {
        let opts = SolverOptions::new(1e-8, 200).with_bicg_iter_factor(2);
        assert_eq!(opts.max_iters, 200);
        assert_eq!(opts.tol, 1e-8);
        assert_eq!(opts.bicg_max_iters(), 400);
    }
}
