// Jacobi preconditioner implementation

use num_traits::Float;

use crate::config::options::ZeroDiagonal;
use crate::core::traits::SparseOperator;
use crate::error::KError;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
#[derive(Debug, Clone)]
pub struct Jacobi<T> {
    pub(crate) inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// Extract `1 / A[i][i]` from `a`.
    pub fn setup<M: SparseOperator<T>>(a: &M, policy: ZeroDiagonal) -> Result<Self, KError> {
        Ok(Self { inv_diag: a.inverse_diagonal(policy)? })
    }

    pub fn from_inverse_diagonal(inv_diag: Vec<T>) -> Self {
        Self { inv_diag }
    }

    pub fn inverse_diagonal(&self) -> &[T] {
        &self.inv_diag
    }

    pub fn len(&self) -> usize {
        self.inv_diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inv_diag.is_empty()
    }

    /// Solve `M z = r`, i.e. `z = D⁻¹ r`.
    pub fn apply(&self, r: &[T], z: &mut [T]) {
        apply_preconditioner(z, r, &self.inv_diag);
    }
}

/// `z[i] = m[i] * r[i]`.
pub fn apply_preconditioner<T: Float>(z: &mut [T], r: &[T], m: &[T]) {
    assert_eq!(z.len(), r.len(), "Vectors must have the same length");
    assert_eq!(m.len(), r.len(), "Preconditioner has incorrect length");
    for ((zi, ri), mi) in z.iter_mut().zip(r).zip(m) {
        *zi = *mi * *ri;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CscMatrix;

    #[test]
    fn jacobi_scales_by_inverse_diagonal() {
        let a = CscMatrix::from_triplets(
            3,
            3,
            &[(0, 0, 2.0), (1, 1, 4.0), (2, 2, -8.0), (0, 2, 1.0)],
        )
        .unwrap();
        let pc = Jacobi::setup(&a, ZeroDiagonal::Reject).unwrap();
        assert_eq!(pc.inverse_diagonal(), &[0.5, 0.25, -0.125]);
        let mut z = vec![0.0; 3];
        pc.apply(&[2.0, 2.0, 2.0], &mut z);
        assert_eq!(z, vec![1.0, 0.5, -0.25]);
    }

    #[test]
    fn from_explicit_inverse_diagonal() {
        let pc = Jacobi::from_inverse_diagonal(vec![0.5, 2.0]);
        assert_eq!(pc.len(), 2);
        assert!(!pc.is_empty());
        assert!(Jacobi::<f64>::from_inverse_diagonal(Vec::new()).is_empty());
        let mut z = vec![0.0; 2];
        pc.apply(&[4.0, 4.0], &mut z);
        assert_eq!(z, vec![2.0, 8.0]);
    }

    #[test]
    fn zero_diagonal_rows_pass_through_by_default() {
        // Voltage-source rows in MNA have no diagonal entry.
        let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 1e3), (0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        let pc = Jacobi::setup(&a, ZeroDiagonal::Unit).unwrap();
        let mut z = vec![0.0; 2];
        pc.apply(&[1.0, 5.0], &mut z);
        assert_eq!(z, vec![1e-3, 5.0]);
        assert!(matches!(Jacobi::setup(&a, ZeroDiagonal::Reject), Err(KError::ZeroPivot(1))));
    }
}
