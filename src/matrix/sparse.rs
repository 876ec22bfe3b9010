// Compressed sparse column storage for MNA systems.

use faer::Mat;
use faer::sparse::{SparseColMat, SymbolicSparseColMat};
use num_traits::Float;

use crate::core::traits::{SparseOperator, Transpose};
use crate::error::KError;

/// Sparse matrix in compressed sparse column (CSC) format.
///
/// Column `j` owns the entries `col_ptr[j]..col_ptr[j + 1]` of `row_idx`
/// and `values`. Row indices within a column are kept sorted and unique.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T> {
    nrows: usize,
    ncols: usize,
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CscMatrix<T> {
    /// Build a CSC matrix from raw column pointers, row indices and values.
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, KError> {
        if col_ptr.len() != ncols + 1 {
            return Err(KError::InvalidStructure(format!(
                "col_ptr has length {}, expected {}",
                col_ptr.len(),
                ncols + 1
            )));
        }
        if col_ptr[0] != 0 || col_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(KError::InvalidStructure(
                "col_ptr must start at 0 and be non-decreasing".into(),
            ));
        }
        let nnz = col_ptr[ncols];
        if row_idx.len() != nnz || values.len() != nnz {
            return Err(KError::InvalidStructure(format!(
                "expected {nnz} entries, got {} row indices and {} values",
                row_idx.len(),
                values.len()
            )));
        }
        for j in 0..ncols {
            let rows = &row_idx[col_ptr[j]..col_ptr[j + 1]];
            if rows.iter().any(|&i| i >= nrows) {
                return Err(KError::InvalidStructure(format!(
                    "row index out of range in column {j}"
                )));
            }
            if rows.windows(2).any(|w| w[0] >= w[1]) {
                return Err(KError::InvalidStructure(format!(
                    "unsorted or duplicate rows in column {j}"
                )));
            }
        }
        Ok(Self { nrows, ncols, col_ptr, row_idx, values })
    }

    /// Build from `(row, col, value)` triplets. Duplicates are summed, the
    /// way repeated MNA stamps accumulate into one entry.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, T)],
    ) -> Result<Self, KError> {
        if let Some(&(i, j, _)) = triplets.iter().find(|&&(i, j, _)| i >= nrows || j >= ncols) {
            return Err(KError::InvalidStructure(format!(
                "triplet ({i}, {j}) outside {nrows}x{ncols}"
            )));
        }
        let mut order: Vec<usize> = (0..triplets.len()).collect();
        order.sort_by_key(|&k| (triplets[k].1, triplets[k].0));

        let mut col_ptr = vec![0usize; ncols + 1];
        let mut row_idx = Vec::with_capacity(triplets.len());
        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;
        for &k in &order {
            let (i, j, v) = triplets[k];
            if last == Some((i, j)) {
                if let Some(acc) = values.last_mut() {
                    *acc = *acc + v;
                }
                continue;
            }
            row_idx.push(i);
            values.push(v);
            col_ptr[j + 1] += 1;
            last = Some((i, j));
        }
        for j in 0..ncols {
            col_ptr[j + 1] += col_ptr[j];
        }
        Ok(Self { nrows, ncols, col_ptr, row_idx, values })
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![T::one(); n])
    }

    /// Square matrix with `diag` on the main diagonal.
    pub fn from_diagonal(diag: &[T]) -> Self {
        let n = diag.len();
        Self {
            nrows: n,
            ncols: n,
            col_ptr: (0..=n).collect(),
            row_idx: (0..n).collect(),
            values: diag.to_vec(),
        }
    }

    /// Keep the non-zero entries of a dense faer matrix.
    pub fn from_dense(a: &Mat<T>) -> Self {
        let (nrows, ncols) = (a.nrows(), a.ncols());
        let mut col_ptr = Vec::with_capacity(ncols + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        col_ptr.push(0);
        for j in 0..ncols {
            for i in 0..nrows {
                let v = a[(i, j)];
                if v != T::zero() {
                    row_idx.push(i);
                    values.push(v);
                }
            }
            col_ptr.push(row_idx.len());
        }
        Self { nrows, ncols, col_ptr, row_idx, values }
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    pub fn row_idx(&self) -> &[usize] {
        &self.row_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Entry `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        match self.row_idx[range.clone()].binary_search(&i) {
            Ok(k) => self.values[range.start + k],
            Err(_) => T::zero(),
        }
    }

    /// True if `|A[i][j] - A[j][i]| <= tol` for every stored entry.
    pub fn is_symmetric(&self, tol: T) -> bool {
        if self.nrows != self.ncols {
            return false;
        }
        (0..self.ncols).all(|j| {
            (self.col_ptr[j]..self.col_ptr[j + 1]).all(|k| {
                let i = self.row_idx[k];
                (self.values[k] - self.get(j, i)).abs() <= tol
            })
        })
    }

    /// Convert to a dense faer matrix. Intended for tests and small systems.
    pub fn to_dense(&self) -> Mat<T> {
        Mat::from_fn(self.nrows, self.ncols, |i, j| self.get(i, j))
    }
}

impl CscMatrix<f64> {
    /// Hand the matrix to faer's sparse module, e.g. for a direct
    /// factorization of the same system.
    pub fn to_faer(&self) -> SparseColMat<usize, f64> {
        let symbolic = SymbolicSparseColMat::new_checked(
            self.nrows,
            self.ncols,
            self.col_ptr.clone(),
            None,
            self.row_idx.clone(),
        );
        SparseColMat::new(symbolic, self.values.clone())
    }
}

impl<T: Float> SparseOperator<T> for CscMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn ncols(&self) -> usize {
        self.ncols
    }

    fn multiply_add(&self, x: &[T], y: &mut [T], op: Transpose, alpha: T, beta: T) {
        let (in_len, out_len) = match op {
            Transpose::No => (self.ncols, self.nrows),
            Transpose::Yes => (self.nrows, self.ncols),
        };
        assert_eq!(x.len(), in_len, "Input vector x has incorrect length");
        assert_eq!(y.len(), out_len, "Output vector y has incorrect length");

        if beta == T::zero() {
            y.fill(T::zero());
        } else if beta != T::one() {
            y.iter_mut().for_each(|yi| *yi = beta * *yi);
        }
        match op {
            // Column-oriented gaxpy: scatter alpha * x[j] * A[:, j] into y.
            Transpose::No => {
                for j in 0..self.ncols {
                    let xj = alpha * x[j];
                    for k in self.col_ptr[j]..self.col_ptr[j + 1] {
                        let i = self.row_idx[k];
                        y[i] = y[i] + self.values[k] * xj;
                    }
                }
            }
            // Column j of A is row j of A^T: gather.
            Transpose::Yes => {
                for j in 0..self.ncols {
                    let mut sum = T::zero();
                    for k in self.col_ptr[j]..self.col_ptr[j + 1] {
                        sum = sum + self.values[k] * x[self.row_idx[k]];
                    }
                    y[j] = y[j] + alpha * sum;
                }
            }
        }
    }

    fn transpose(&self) -> Result<Self, KError> {
        let nnz = self.nnz();
        let mut col_ptr: Vec<usize> = Vec::new();
        let mut row_idx: Vec<usize> = Vec::new();
        let mut values: Vec<T> = Vec::new();
        col_ptr
            .try_reserve_exact(self.nrows + 1)
            .and_then(|_| row_idx.try_reserve_exact(nnz))
            .and_then(|_| values.try_reserve_exact(nnz))
            .map_err(|_| KError::Allocation { what: "transposed matrix", len: nnz })?;

        // Count entries per row of A, which become the columns of A^T.
        col_ptr.resize(self.nrows + 1, 0);
        for &i in &self.row_idx {
            col_ptr[i + 1] += 1;
        }
        for i in 0..self.nrows {
            col_ptr[i + 1] += col_ptr[i];
        }
        row_idx.resize(nnz, 0);
        values.resize(nnz, T::zero());
        let mut next = col_ptr.clone();
        // Visiting columns in order keeps the new row indices sorted.
        for j in 0..self.ncols {
            for k in self.col_ptr[j]..self.col_ptr[j + 1] {
                let i = self.row_idx[k];
                let dst = next[i];
                row_idx[dst] = j;
                values[dst] = self.values[k];
                next[i] += 1;
            }
        }
        Ok(Self {
            nrows: self.ncols,
            ncols: self.nrows,
            col_ptr,
            row_idx,
            values,
        })
    }

    fn diagonal(&self) -> Result<Vec<T>, KError> {
        let n = self.nrows.min(self.ncols);
        let mut diag = crate::core::vector::zeros(n, "diagonal")?;
        for (j, d) in diag.iter_mut().enumerate() {
            *d = self.get(j, j);
        }
        Ok(diag)
    }
}
