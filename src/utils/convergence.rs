//! Convergence tracking & tolerance checks for iterative solvers.

use num_traits::Float;

/// Stopping criteria.
#[derive(Debug, Clone, Copy)]
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    /// Relative residual `||r|| / ||b||` at exit.
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Float> Convergence<T> {
    /// Relative residual against `ref_norm`.
    pub fn relative(&self, res_norm: T, ref_norm: T) -> T {
        res_norm / ref_norm
    }

    /// True while the solver should keep iterating.
    ///
    /// NaN compares false, so a poisoned residual stops the loop.
    pub fn keep_going(&self, rel: T, i: usize) -> bool {
        i < self.max_iters && rel > self.tol
    }

    pub fn stats(&self, rel: T, i: usize) -> SolveStats<T> {
        SolveStats {
            iterations: i,
            final_residual: rel,
            converged: rel <= self.tol,
        }
    }
}
