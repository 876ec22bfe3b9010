use std::fmt;

use thiserror::Error;

// Unified error type for circsolve

/// Which recurrence scalar collapsed when a solver broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownQuantity {
    /// `rho = (r_t, z)` in BiCG.
    Rho,
    /// `omega = (p_t, A p)` in BiCG.
    Omega,
    /// `(p, A p)` in CG, only reported when the curvature guard is enabled.
    Curvature,
}

impl fmt::Display for BreakdownQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownQuantity::Rho => f.write_str("rho"),
            BreakdownQuantity::Omega => f.write_str("omega"),
            BreakdownQuantity::Curvature => f.write_str("p^T A p"),
        }
    }
}

#[derive(Error, Debug)]
pub enum KError {
    #[error("failed to allocate {what} of length {len}")]
    Allocation { what: &'static str, len: usize },
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("matrix is not square ({nrows}x{ncols})")]
    NotSquare { nrows: usize, ncols: usize },
    #[error("breakdown at iteration {iteration}: |{quantity}| = {value:.3e}")]
    Breakdown {
        quantity: BreakdownQuantity,
        iteration: usize,
        value: f64,
    },
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("invalid sparse structure: {0}")]
    InvalidStructure(String),
    #[error("unknown solver kind: {0}")]
    UnknownSolver(String),
}

impl KError {
    /// True for numerical breakdowns, which a caller may recover from by
    /// restarting with a different initial guess or method.
    pub fn is_breakdown(&self) -> bool {
        matches!(self, KError::Breakdown { .. })
    }
}
