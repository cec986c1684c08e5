//! Finite-difference methods for one-dimensional parabolic PDEs.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`] is the discrete spatial operator `L`, with a
//!   Thomas solver, SOR and an optional time dependence.
//! * [`BoundaryCondition`] implementations ([`NeumannBc`], [`DirichletBc`])
//!   patch the boundary rows around every application and solve.
//! * [`MixedScheme`] is the θ-scheme evolver (explicit Euler, implicit
//!   Euler, Crank-Nicolson).
//! * [`FiniteDifferenceModel`] rolls a value array back in time and lands
//!   exactly on every stopping time, applying a [`StepCondition`] there.
//! * [`FdVanillaPricer`] assembles all of the above for Black-Scholes
//!   vanilla options.

// ── Modules ───────────────────────────────────────────────────────────────────

pub mod boundary_condition;
pub mod evolver;
pub mod finite_difference_model;
pub mod grid;
pub mod mixed_scheme;
pub mod operators;
pub mod parallel_evolver;
pub mod pde;
pub mod settings;
pub mod step_condition;
pub mod tridiagonal_operator;
pub mod vanilla;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use boundary_condition::{BoundaryCondition, BoundaryConditionSet, DirichletBc, NeumannBc, Side};
pub use evolver::{Evolver, EvolverFactory};
pub use finite_difference_model::FiniteDifferenceModel;
pub use grid::{bounded_grid, bounded_log_grid, centered_grid, TransformedGrid};
pub use mixed_scheme::{MixedScheme, SchemeKind};
pub use operators::{bsm_operator, d_minus, d_plus, d_plus_d_minus, d_zero};
pub use parallel_evolver::ParallelEvolver;
pub use pde::{
    bsm_grid_operator, bsm_term_operator, pde_operator, GenericTimeSetter, PdeBsm,
    PdeConstantCoeff, PdeFactory, PdeSecondOrderParabolic,
};
pub use settings::FdSettings;
pub use step_condition::{
    AmericanCondition, CurveDependentStepCondition, NullCondition, ShoutCondition, StepCondition,
    StepConditionSet,
};
pub use tridiagonal_operator::{TimeSetter, TridiagonalOperator, SOR_MAX_ITERATIONS, SOR_OMEGA};
pub use vanilla::{Exercise, FdVanillaPricer, FdVanillaResults};
