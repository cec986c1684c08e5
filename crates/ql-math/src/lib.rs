//! # ql-math
//!
//! Dense `Array` and `Matrix` newtypes over nalgebra, plus floating-point
//! comparison helpers.  These are the vector/matrix collaborators the
//! finite-difference engine is written against.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// One-dimensional real vector.
pub mod array;

/// Floating-point comparison utilities.
pub mod comparison;

/// Two-dimensional real matrix.
pub mod matrix;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use comparison::close;
pub use matrix::Matrix;
