//! # quantlib-fdm
//!
//! Finite-difference PDE engine modelled on QuantLib's
//! `ql/methods/finitedifferences`.
//!
//! This crate is a **façade** that re-exports the public items of the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use quantlib_fdm::methods::{Exercise, FdSettings, FdVanillaPricer};
//! use quantlib_fdm::processes::BlackScholesMertonProcess;
//!
//! let process = Arc::new(BlackScholesMertonProcess::new(100.0, 0.05, 0.0, 0.2).unwrap());
//! let pricer = FdVanillaPricer::new(process, 1.0, FdSettings::default()).unwrap();
//! let put = pricer
//!     .price(|s| (100.0 - s).max(0.0), &Exercise::American)
//!     .unwrap();
//! assert!(put.value > 5.0 && put.delta < 0.0);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Arrays, matrices and floating-point comparison.
pub use ql_math as math;

/// Stochastic process definitions.
pub use ql_processes as processes;

/// Finite-difference operators, evolvers and rollback.
pub use ql_methods as methods;
