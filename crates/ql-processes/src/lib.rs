//! # ql-processes
//!
//! Stochastic process definitions consumed by the finite-difference PDE
//! generators.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_scholes_process;
pub mod stochastic_process;

pub use black_scholes_process::{BlackScholesMertonProcess, GeneralizedBlackScholes};
pub use stochastic_process::StochasticProcess1D;
