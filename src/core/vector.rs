//! Dense vector kernels used by the Krylov solvers.
//!
//! All kernels operate on plain slices so that caller-owned buffers (the
//! solution vector in particular) are never copied or resized. With the
//! `rayon` feature enabled, `dot` and `norm` use parallel reductions.
//!
//! # Panics
//! The binary kernels assert that their operands have equal length; a
//! mismatch is a caller bug, not a recoverable condition.

use num_traits::Float;

use crate::error::KError;

/// Computes the dot product of two vectors: `x^T y`.
pub fn dot<T: Float + Send + Sync>(x: &[T], y: &[T]) -> T {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .zip(y.par_iter())
            .map(|(xi, yi)| *xi * *yi)
            .reduce(|| T::zero(), |acc, v| acc + v)
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .zip(y.iter())
            .map(|(xi, yi)| *xi * *yi)
            .fold(T::zero(), |acc, v| acc + v)
    }
}

/// Computes the Euclidean norm of a vector: `||x||_2`.
///
/// Accumulates `scale^2 * ssq` the way BLAS `dnrm2` does, so entries whose
/// squares would underflow or overflow still give a finite, non-zero norm.
pub fn norm<T: Float + Send + Sync>(x: &[T]) -> T {
    #[cfg(feature = "rayon")]
    let (scale, ssq) = {
        use rayon::prelude::*;
        x.par_iter()
            .fold(|| (T::zero(), T::zero()), |acc, xi| nrm2_push(acc, *xi))
            .reduce(|| (T::zero(), T::zero()), nrm2_merge)
    };
    #[cfg(not(feature = "rayon"))]
    let (scale, ssq) = x
        .iter()
        .fold((T::zero(), T::zero()), |acc, xi| nrm2_push(acc, *xi));
    scale * ssq.sqrt()
}

// (scale, ssq) with sum(x_i^2) = scale^2 * ssq.
fn nrm2_push<T: Float>((scale, ssq): (T, T), xi: T) -> (T, T) {
    if xi == T::zero() {
        return (scale, ssq);
    }
    let a = xi.abs();
    if scale < a {
        let ratio = scale / a;
        (a, T::one() + ssq * ratio * ratio)
    } else {
        let ratio = a / scale;
        (scale, ssq + ratio * ratio)
    }
}

#[cfg(feature = "rayon")]
fn nrm2_merge<T: Float>((s1, q1): (T, T), (s2, q2): (T, T)) -> (T, T) {
    if s1 == T::zero() && s2 == T::zero() {
        (s1, q1 + q2)
    } else if s1 >= s2 {
        let ratio = s2 / s1;
        (s1, q1 + q2 * ratio * ratio)
    } else {
        let ratio = s1 / s2;
        (s2, q2 + q1 * ratio * ratio)
    }
}

/// Writes `s * x` into `out`.
pub fn scale<T: Float>(out: &mut [T], s: T, x: &[T]) {
    assert_eq!(out.len(), x.len(), "Vectors must have the same length");
    for (oi, xi) in out.iter_mut().zip(x) {
        *oi = s * *xi;
    }
}

/// In-place form of [`scale`]: `x = s * x`.
pub fn scale_in_place<T: Float>(x: &mut [T], s: T) {
    x.iter_mut().for_each(|xi| *xi = s * *xi);
}

/// `y = y + alpha * x`.
pub fn axpy<T: Float>(y: &mut [T], alpha: T, x: &[T]) {
    assert_eq!(y.len(), x.len(), "Vectors must have the same length");
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi = *yi + alpha * *xi;
    }
}

/// `p = beta * p + z`, the search-direction update shared by CG and BiCG.
pub fn xpby<T: Float>(p: &mut [T], beta: T, z: &[T]) {
    assert_eq!(p.len(), z.len(), "Vectors must have the same length");
    for (pi, zi) in p.iter_mut().zip(z) {
        *pi = beta * *pi + *zi;
    }
}

/// Allocates a zero-filled scratch vector of length `n`.
///
/// Allocation failure is reported as [`KError::Allocation`] instead of
/// aborting, so a solver can back out cleanly.
pub fn zeros<T: Float>(n: usize, what: &'static str) -> Result<Vec<T>, KError> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| KError::Allocation { what, len: n })?;
    v.resize(n, T::zero());
    Ok(v)
}

/// Allocates a scratch copy of `src`.
pub fn copy_of<T: Float>(src: &[T], what: &'static str) -> Result<Vec<T>, KError> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len())
        .map_err(|_| KError::Allocation { what, len: src.len() })?;
    v.extend_from_slice(src);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn dot_is_symmetric() {
        let x = vec![1.0, -2.5, 3.0, 0.25];
        let y = vec![4.0, 5.0, -6.0, 8.0];
        assert_eq!(dot(&x, &y), dot(&y, &x));
        assert_abs_diff_eq!(dot(&x, &y), 4.0 - 12.5 - 18.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn norm_of_zero_vector_is_zero() {
        let z = vec![0.0f64; 5];
        assert_eq!(norm(&z), 0.0);
        assert_abs_diff_eq!(norm(&[3.0, 4.0]), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn norm_survives_extreme_magnitudes() {
        // Squares of these entries underflow to zero or overflow to inf.
        let tiny = norm(&[0.0, 3e-200, 4e-200]);
        assert!(tiny > 0.0);
        assert_abs_diff_eq!(tiny / 5e-200, 1.0, epsilon = 1e-12);
        let huge = norm(&[1e200, 1e200]);
        assert!(huge.is_finite());
        assert_abs_diff_eq!(huge / 1e200, 2.0f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(norm(&[1e-300, 1e300]), 1e300, epsilon = 1e288);
    }

    #[test]
    fn norm_propagates_nan() {
        assert!(norm(&[1.0, f64::NAN, 2.0]).is_nan());
        assert!(norm(&[f64::NAN]).is_nan());
        assert_eq!(norm(&[f64::INFINITY, 1.0]), f64::INFINITY);
    }

    #[test]
    fn scale_may_alias_through_in_place_variant() {
        let x = vec![1.0, 2.0, 3.0];
        let mut out = vec![0.0; 3];
        scale(&mut out, -2.0, &x);
        assert_eq!(out, vec![-2.0, -4.0, -6.0]);
        scale_in_place(&mut out, 0.5);
        assert_eq!(out, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn axpy_and_xpby() {
        let mut y = vec![1.0, 1.0];
        axpy(&mut y, 2.0, &[3.0, -1.0]);
        assert_eq!(y, vec![7.0, -1.0]);
        let mut p = vec![1.0, 2.0];
        xpby(&mut p, 3.0, &[1.0, 1.0]);
        assert_eq!(p, vec![4.0, 7.0]);
    }

    #[test]
    fn scratch_allocation_is_zeroed() {
        let v: Vec<f64> = zeros(4, "r").unwrap();
        assert_eq!(v, vec![0.0; 4]);
        let c = copy_of(&[1.0, 2.0], "b").unwrap();
        assert_eq!(c, vec![1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn dot_rejects_mismatched_lengths() {
        let _ = dot(&[1.0, 2.0], &[1.0]);
    }
}
