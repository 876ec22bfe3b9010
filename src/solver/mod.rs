//! Jacobi-preconditioned Krylov solvers.

use num_traits::Float;

use crate::config::options::SolverOptions;
use crate::core::traits::SparseOperator;
use crate::core::vector::norm;
use crate::error::KError;
use crate::utils::convergence::SolveStats;

/// Common interface for the iterative solvers.
pub trait LinearSolver<M, T> {
    type Error;
    /// Solve A·x = b, using the incoming `x` as the initial guess and
    /// overwriting it with the approximate solution.
    /// Returns iteration stats (including convergence info).
    fn solve(&mut self, a: &M, b: &[T], x: &mut [T]) -> Result<SolveStats<T>, Self::Error>;
}

pub mod bicg;
pub mod cg;

pub use bicg::BiCgSolver;
pub use cg::CgSolver;

/// Solve a symmetric positive-definite system with CG and default options.
///
/// `x0` holds the initial guess on entry and the solution on return.
pub fn cg_solve<M, T>(a: &M, b: &[T], x0: &mut [T]) -> Result<SolveStats<T>, KError>
where
    M: SparseOperator<T>,
    T: Float + Send + Sync,
{
    CgSolver::with_options(SolverOptions::default()).solve(a, b, x0)
}

/// Solve a general system with BiCG and default options.
///
/// `x0` holds the initial guess on entry and the solution on return.
pub fn bicg_solve<M, T>(a: &M, b: &[T], x0: &mut [T]) -> Result<SolveStats<T>, KError>
where
    M: SparseOperator<T>,
    T: Float + Send + Sync,
{
    BiCgSolver::with_options(SolverOptions::default()).solve(a, b, x0)
}

/// Entry checks shared by both solvers: square `a` of order `b.len()` and
/// an initial guess of the same length.
pub(crate) fn check_system<M, T>(a: &M, b: &[T], x: &[T]) -> Result<usize, KError>
where
    M: SparseOperator<T>,
    T: Float,
{
    let n = b.len();
    crate::core::traits::check_square::<T, M>(a, n)?;
    if x.len() != n {
        return Err(KError::DimensionMismatch {
            what: "initial guess",
            expected: n,
            found: x.len(),
        });
    }
    Ok(n)
}

/// BiCG's residual scale: `||b||`, or 1 when `||b|| < eps`.
pub(crate) fn reference_norm<T: Float + Send + Sync>(b: &[T], eps: T) -> T {
    let normb = norm(b);
    if normb < eps { T::one() } else { normb }
}

pub(crate) fn as_f64<T: Float>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
