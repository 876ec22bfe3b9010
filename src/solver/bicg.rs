//! Jacobi-preconditioned Biconjugate Gradient (Saad §7.3).
//!
//! Handles general (non-symmetric) systems by running a shadow recurrence
//! against `A^T` next to the primal one. The shadow residual starts equal to
//! the primal residual, and the Jacobi scaling is shared since `A` and `A^T`
//! have the same diagonal.
//!
//! The method can break down when `rho = (r_t, z)` or `omega = (p_t, A p)`
//! vanishes. Both are checked before the iterate is updated, so on
//! `KError::Breakdown` the caller's `x` holds the last completed iterate.

use num_traits::Float;
use tracing::{debug, trace, warn};

use crate::config::options::SolverOptions;
use crate::core::traits::{SparseOperator, Transpose};
use crate::core::vector::{axpy, copy_of, dot, norm, xpby, zeros};
use crate::error::{BreakdownQuantity, KError};
use crate::preconditioner::Jacobi;
use crate::solver::{LinearSolver, as_f64, check_system, reference_norm};
use crate::utils::convergence::{Convergence, SolveStats};

pub struct BiCgSolver<T> {
    pub opts: SolverOptions<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
}

impl<T: Float> BiCgSolver<T> {
    /// `max_iters` is the base cap; BiCG runs up to
    /// `bicg_iter_factor * max_iters` iterations.
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self::with_options(SolverOptions::new(tol, max_iters))
    }
    pub fn with_options(opts: SolverOptions<T>) -> Self {
        Self { opts, monitor: None }
    }
    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    fn breakdown(&self, quantity: BreakdownQuantity, iteration: usize, value: T) -> KError {
        warn!(%quantity, iteration, value = as_f64(value), "BiCG breakdown");
        KError::Breakdown { quantity, iteration, value: as_f64(value.abs()) }
    }
}

impl<M, T> LinearSolver<M, T> for BiCgSolver<T>
where
    M: SparseOperator<T>,
    T: Float + Send + Sync,
{
    type Error = KError;

    fn solve(&mut self, a: &M, b: &[T], x: &mut [T]) -> Result<SolveStats<T>, KError> {
        let n = check_system(a, b, x)?;
        let eps = self.opts.breakdown_tol;
        let pc = Jacobi::setup(a, self.opts.zero_diagonal)?;
        let a_t = a.transpose()?;

        let mut r = copy_of(b, "residual")?;
        let mut z = zeros(n, "preconditioned residual")?;
        let mut p = zeros(n, "search direction")?;
        let mut q = zeros(n, "A*p")?;
        let mut z_t = zeros(n, "shadow preconditioned residual")?;
        let mut p_t = zeros(n, "shadow search direction")?;
        let mut q_t = zeros(n, "A^T*p_t")?;

        // r = b - A x, r_t = r
        a.multiply_add(x, &mut r, Transpose::No, -T::one(), T::one());
        let mut r_t = copy_of(&r, "shadow residual")?;

        let conv = Convergence { tol: self.opts.tol, max_iters: self.opts.bicg_max_iters() };
        let normb = reference_norm(b, eps);
        let mut rel = conv.relative(norm(&r), normb);
        debug!(
            n,
            tol = as_f64(conv.tol),
            max_iters = conv.max_iters,
            residual = as_f64(rel),
            "BiCG start"
        );
        if let Some(ref mut monitor) = self.monitor {
            monitor(0, rel);
        }

        let mut rho_prev = T::one();
        let mut it = 0;
        while conv.keep_going(rel, it) {
            it += 1;
            pc.apply(&r, &mut z);
            pc.apply(&r_t, &mut z_t);

            let rho = dot(&r_t, &z);
            if rho.abs() < eps {
                return Err(self.breakdown(BreakdownQuantity::Rho, it, rho));
            }
            if it == 1 {
                p.copy_from_slice(&z);
                p_t.copy_from_slice(&z_t);
            } else {
                let beta = rho / rho_prev;
                xpby(&mut p, beta, &z);
                xpby(&mut p_t, beta, &z_t);
            }
            rho_prev = rho;

            a.multiply(&p, &mut q);
            a_t.multiply(&p_t, &mut q_t);
            let omega = dot(&p_t, &q);
            if omega.abs() < eps {
                return Err(self.breakdown(BreakdownQuantity::Omega, it, omega));
            }
            let alpha = rho / omega;

            axpy(x, alpha, &p);
            axpy(&mut r, -alpha, &q);
            axpy(&mut r_t, -alpha, &q_t);

            rel = conv.relative(norm(&r), normb);
            trace!(iteration = it, residual = as_f64(rel), "BiCG iteration");
            if let Some(ref mut monitor) = self.monitor {
                monitor(it, rel);
            }
        }

        let stats = conv.stats(rel, it);
        if rel.is_nan() {
            warn!(iterations = it, "BiCG residual is NaN");
        } else if stats.converged {
            debug!(iterations = it, residual = as_f64(rel), "BiCG converged");
        } else {
            warn!(iterations = it, residual = as_f64(rel), "BiCG hit the iteration cap");
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CscMatrix;
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    // Helper: well-conditioned non-symmetric 3x3 matrix
    fn nonsym_3x3() -> (Mat<f64>, Vec<f64>) {
        let a = Mat::from_fn(3, 3, |i, j| if i == j { 10.0 } else { (i + 2 * j) as f64 + 1.0 });
        let x_true = vec![1.0, 2.0, 3.0];
        let mut b = vec![0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                b[i] += a[(i, j)] * x_true[j];
            }
        }
        (a, b)
    }

    #[test]
    fn bicg_solves_well_conditioned_nonsym() {
        let (a, b) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let mut solver = BiCgSolver::new(1e-6, 20);
        let stats = solver.solve(&a, &b, &mut x).unwrap();
        let x_true = vec![1.0, 2.0, 3.0];
        for i in 0..3 {
            assert_abs_diff_eq!(x[i], x_true[i], epsilon = 1e-4);
        }
        assert!(stats.converged, "BiCG did not converge: stats = {:?}", stats);
    }

    #[test]
    fn identity_converges_in_one_iteration() {
        let a = CscMatrix::<f64>::identity(3);
        let b = vec![1.0, 2.0, 3.0];
        let mut x = vec![0.0; 3];
        let stats = crate::solver::bicg_solve(&a, &b, &mut x).unwrap();
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.final_residual, 0.0);
        assert_eq!(x, b);
    }

    #[test]
    fn rho_breakdown_is_reported_and_x_untouched() {
        // M = diag(1, -1), r = [1, 1]  =>  rho = r^T M r = 0 on the first pass.
        let a = CscMatrix::from_diagonal(&[1.0, -1.0]);
        let mut x = vec![0.0; 2];
        let err = crate::solver::bicg_solve(&a, &[1.0, 1.0], &mut x).unwrap_err();
        assert!(err.is_breakdown());
        assert!(matches!(
            err,
            KError::Breakdown { quantity: BreakdownQuantity::Rho, iteration: 1, .. }
        ));
        assert_eq!(x, vec![0.0, 0.0]);
    }

    #[test]
    fn omega_breakdown_is_reported() {
        // p_t^T A p = z^T A z = 0 for z = [1, -1] and A = [[1,1],[1,1]].
        let a =
            CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)])
                .unwrap();
        let mut x = vec![0.0; 2];
        let err = crate::solver::bicg_solve(&a, &[1.0, -1.0], &mut x).unwrap_err();
        assert!(matches!(
            err,
            KError::Breakdown { quantity: BreakdownQuantity::Omega, iteration: 1, .. }
        ));
        assert_eq!(x, vec![0.0, 0.0]);
    }

    #[test]
    fn breakdown_after_a_completed_iteration_keeps_that_iterate() {
        // Iteration 1 gives x = [-1, 0, 0], r = [0, 0, 1] and r_t = [0, -1, 0];
        // then rho = (r_t, M r) = 0 exactly.
        let a = CscMatrix::from_triplets(
            3,
            3,
            &[(0, 0, -1.0), (0, 1, -1.0), (1, 1, -1.0), (2, 0, 1.0), (2, 1, 1.0), (2, 2, -1.0)],
        )
        .unwrap();
        let mut x = vec![0.0; 3];
        let err = crate::solver::bicg_solve(&a, &[1.0, 0.0, 0.0], &mut x).unwrap_err();
        assert!(matches!(
            err,
            KError::Breakdown { quantity: BreakdownQuantity::Rho, iteration: 2, .. }
        ));
        assert_eq!(x, vec![-1.0, 0.0, 0.0]);
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let a = Mat::from_fn(2, 3, |i, j| (i + j) as f64);
        let mut x = vec![0.0; 2];
        let err = crate::solver::bicg_solve(&a, &[1.0, 1.0], &mut x).unwrap_err();
        assert!(matches!(err, KError::NotSquare { nrows: 2, ncols: 3 }));
    }

    #[test]
    fn tiny_rhs_norm_is_treated_as_one() {
        let a = CscMatrix::from_diagonal(&[2.0, 2.0]);
        let mut x = vec![1e-4, 0.0];
        // ||b|| = 0 so the residual is measured absolutely: ||A x|| = 2e-4 < 1e-3.
        let stats = crate::solver::bicg_solve(&a, &[0.0, 0.0], &mut x).unwrap();
        assert_eq!(stats.iterations, 0);
        assert!(stats.converged);
    }
}
