//! # ql-methods
//!
//! Finite-difference engine for one-dimensional parabolic PDEs: tridiagonal
//! operators, boundary conditions, θ-scheme evolvers, and a rollback model
//! that honours stopping times and step conditions.
//!
//! # Modules
//!
//! * [`finite_differences`]: operators, schemes, rollback, vanilla pricer

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: operators, evolvers, rollback driver.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    AmericanCondition, BoundaryCondition, BoundaryConditionSet, DirichletBc, Evolver,
    EvolverFactory, Exercise, FdSettings, FdVanillaPricer, FdVanillaResults,
    FiniteDifferenceModel, MixedScheme, NeumannBc, SchemeKind, Side, StepCondition,
    TransformedGrid, TridiagonalOperator,
};
