//! Core linear-algebra traits for circsolve.

use num_traits::Float;

use crate::config::options::ZeroDiagonal;
use crate::error::KError;

/// Selects `A` or `A^T` in [`SparseOperator::multiply_add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    No,
    Yes,
}

/// The matrix capabilities the iterative solvers rely on.
///
/// Storage is opaque to the solvers; any backend providing products, a
/// transpose and the diagonal can be plugged in.
pub trait SparseOperator<T: Float> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;

    /// Compute `y = alpha * op(A) * x + beta * y`.
    ///
    /// When `beta` is zero, `y` is overwritten without being read.
    fn multiply_add(&self, x: &[T], y: &mut [T], op: Transpose, alpha: T, beta: T);

    /// Compute `y = A * x`.
    fn multiply(&self, x: &[T], y: &mut [T]) {
        y.fill(T::zero());
        self.multiply_add(x, y, Transpose::No, T::one(), T::one());
    }

    /// Allocate a new matrix equal to `A^T`.
    fn transpose(&self) -> Result<Self, KError>
    where
        Self: Sized;

    /// Main diagonal `A[i][i]`, zero where no entry is stored.
    fn diagonal(&self) -> Result<Vec<T>, KError>;

    /// `1 / A[i][i]` for every row, the Jacobi preconditioner.
    ///
    /// Zero or non-finite diagonal entries are handled per `policy`.
    fn inverse_diagonal(&self, policy: ZeroDiagonal) -> Result<Vec<T>, KError> {
        let mut diag = self.diagonal()?;
        for (i, d) in diag.iter_mut().enumerate() {
            let inv = d.recip();
            if *d == T::zero() || !inv.is_finite() {
                match policy {
                    ZeroDiagonal::Reject => return Err(KError::ZeroPivot(i)),
                    ZeroDiagonal::Unit => {
                        tracing::warn!(row = i, "zero diagonal, leaving row unpreconditioned");
                        *d = T::one();
                    }
                }
            } else {
                *d = inv;
            }
        }
        Ok(diag)
    }
}

/// Checks that `a` is square with order `n`.
pub(crate) fn check_square<T: Float, M: SparseOperator<T>>(a: &M, n: usize) -> Result<(), KError> {
    if a.nrows() != a.ncols() {
        return Err(KError::NotSquare { nrows: a.nrows(), ncols: a.ncols() });
    }
    if a.nrows() != n {
        return Err(KError::DimensionMismatch {
            what: "matrix order",
            expected: n,
            found: a.nrows(),
        });
    }
    Ok(())
}
