//! Error types for the finite-difference library.
//!
//! Every crate in the workspace reports failures through the single
//! `thiserror`-derived [`Error`] enum.  Preconditions are checked with the
//! [`ensure!`](crate::ensure) macro.

use thiserror::Error;

/// The top-level error type used throughout the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Precondition violated (raised by `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [{lower}, {upper}]")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// Smallest admissible index.
        lower: usize,
        /// Largest admissible index.
        upper: usize,
    },

    /// A pivot or denominator was exactly zero.
    #[error("division by zero: {0}")]
    DivisionByZero(String),

    /// An iterative method hit its iteration cap.
    #[error("tolerance not reached after {iterations} iterations (residual {residual:e})")]
    NonConvergence {
        /// Iterations performed.
        iterations: usize,
        /// Residual norm at the last iteration.
        residual: f64,
    },

    /// The capability is not implemented by the concrete type.
    #[error("not supported: {0}")]
    NotSupported(String),
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Check a precondition.
///
/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}
