//! Dense backend for [`SparseOperator`] on top of Faer.
//!
//! Small MNA systems are sometimes assembled densely; implementing the
//! solver interface for `faer::Mat<T>` lets them go through the same
//! iterative path without a conversion, and gives tests an independent
//! reference for the CSC kernels.

use faer::Mat;
use num_traits::Float;

use crate::core::traits::{SparseOperator, Transpose};
use crate::error::KError;

impl<T: Float> SparseOperator<T> for Mat<T> {
    fn nrows(&self) -> usize {
        Mat::nrows(self)
    }

    fn ncols(&self) -> usize {
        Mat::ncols(self)
    }

    fn multiply_add(&self, x: &[T], y: &mut [T], op: Transpose, alpha: T, beta: T) {
        let (m, n) = (Mat::nrows(self), Mat::ncols(self));
        match op {
            Transpose::No => {
                assert_eq!(n, x.len(), "Input vector x has incorrect length");
                assert_eq!(m, y.len(), "Output vector y has incorrect length");
                for i in 0..m {
                    let mut sum = T::zero();
                    for j in 0..n {
                        sum = sum + self[(i, j)] * x[j];
                    }
                    y[i] = if beta == T::zero() { alpha * sum } else { alpha * sum + beta * y[i] };
                }
            }
            Transpose::Yes => {
                assert_eq!(m, x.len(), "Input vector x has incorrect length");
                assert_eq!(n, y.len(), "Output vector y has incorrect length");
                for j in 0..n {
                    let mut sum = T::zero();
                    for i in 0..m {
                        sum = sum + self[(i, j)] * x[i];
                    }
                    y[j] = if beta == T::zero() { alpha * sum } else { alpha * sum + beta * y[j] };
                }
            }
        }
    }

    fn transpose(&self) -> Result<Self, KError> {
        Ok(Mat::from_fn(Mat::ncols(self), Mat::nrows(self), |i, j| self[(j, i)]))
    }

    fn diagonal(&self) -> Result<Vec<T>, KError> {
        let n = Mat::nrows(self).min(Mat::ncols(self));
        let mut diag = crate::core::vector::zeros(n, "diagonal")?;
        for (i, d) in diag.iter_mut().enumerate() {
            *d = self[(i, i)];
        }
        Ok(diag)
    }
}
