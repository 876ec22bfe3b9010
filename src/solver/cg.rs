//! Jacobi-preconditioned Conjugate Gradient per Saad §9.2.
//!
//! For symmetric positive-definite systems. Symmetry is not verified; an
//! indefinite matrix just converges badly (or not at all) instead of
//! producing an error, unless the curvature guard is switched on.
//!
//! ```text
//! r = b - A x
//! loop while it < max_iters and ||r||/||b|| > tol:
//!     z = M⁻¹ r
//!     rho = (r, z)
//!     p = z                       (first iteration)
//!     p = (rho / rho_prev) p + z  (afterwards)
//!     q = A p
//!     alpha = rho / (p, q)
//!     x += alpha p
//!     r -= alpha q
//! ```

use num_traits::Float;
use tracing::{debug, trace, warn};

use crate::config::options::SolverOptions;
use crate::core::traits::{SparseOperator, Transpose};
use crate::core::vector::{axpy, copy_of, dot, norm, xpby, zeros};
use crate::error::{BreakdownQuantity, KError};
use crate::preconditioner::Jacobi;
use crate::solver::{LinearSolver, as_f64, check_system};
use crate::utils::convergence::{Convergence, SolveStats};

pub struct CgSolver<T> {
    pub opts: SolverOptions<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
}

impl<T: Float> CgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self::with_options(SolverOptions::new(tol, max_iters))
    }
    pub fn with_options(opts: SolverOptions<T>) -> Self {
        Self { opts, monitor: None }
    }
    /// Called with `(iteration, relative residual)`; iteration 0 is the
    /// initial residual.
    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }
}

impl<M, T> LinearSolver<M, T> for CgSolver<T>
where
    M: SparseOperator<T>,
    T: Float + Send + Sync,
{
    type Error = KError;

    fn solve(&mut self, a: &M, b: &[T], x: &mut [T]) -> Result<SolveStats<T>, KError> {
        let n = check_system(a, b, x)?;
        let pc = Jacobi::setup(a, self.opts.zero_diagonal)?;
        let mut r = copy_of(b, "residual")?;
        let mut z = zeros(n, "preconditioned residual")?;
        let mut p = zeros(n, "search direction")?;
        let mut q = zeros(n, "A*p")?;

        // r = b - A x
        a.multiply_add(x, &mut r, Transpose::No, -T::one(), T::one());

        let conv = Convergence { tol: self.opts.tol, max_iters: self.opts.max_iters };
        // Only an exactly zero rhs falls back to the absolute residual.
        let normb = match norm(b) {
            nb if nb == T::zero() => T::one(),
            nb => nb,
        };
        let mut rel = conv.relative(norm(&r), normb);
        debug!(
            n,
            tol = as_f64(conv.tol),
            max_iters = conv.max_iters,
            residual = as_f64(rel),
            "CG start"
        );
        if let Some(ref mut monitor) = self.monitor {
            monitor(0, rel);
        }

        let mut rho_prev = T::one();
        let mut it = 0;
        while conv.keep_going(rel, it) {
            it += 1;
            pc.apply(&r, &mut z);
            let rho = dot(&r, &z);
            if it == 1 {
                p.copy_from_slice(&z);
            } else {
                xpby(&mut p, rho / rho_prev, &z);
            }
            rho_prev = rho;

            a.multiply(&p, &mut q);
            let p_dot_q = dot(&p, &q);
            if self.opts.guard_curvature && p_dot_q.abs() < self.opts.breakdown_tol {
                warn!(iteration = it, p_dot_q = as_f64(p_dot_q), "CG curvature breakdown");
                return Err(KError::Breakdown {
                    quantity: BreakdownQuantity::Curvature,
                    iteration: it,
                    value: as_f64(p_dot_q.abs()),
                });
            }
            let alpha = rho / p_dot_q;
            axpy(x, alpha, &p);
            axpy(&mut r, -alpha, &q);

            rel = conv.relative(norm(&r), normb);
            trace!(iteration = it, residual = as_f64(rel), "CG iteration");
            if let Some(ref mut monitor) = self.monitor {
                monitor(it, rel);
            }
        }

        let stats = conv.stats(rel, it);
        if rel.is_nan() {
            warn!(iterations = it, "CG residual is NaN");
        } else if stats.converged {
            debug!(iterations = it, residual = as_f64(rel), "CG converged");
        } else {
            warn!(iterations = it, residual = as_f64(rel), "CG hit the iteration cap");
        }
        Ok(stats)
    }
}
