//! Time-stepping evolvers.
//!
//! An [`Evolver`] advances a value array by one time step of adjustable
//! size.  [`EvolverFactory`] builds one from a spatial operator and its
//! boundary conditions, which is how `FiniteDifferenceModel` is usually
//! wired.

use ql_core::{Result, Time};

/// Advances a discretized solution backward in time.
pub trait Evolver {
    /// The value container stepped by this evolver.
    type Array;

    /// Advance `a` by one step from time `t` to `t - dt`.
    fn step(&mut self, a: &mut Self::Array, t: Time) -> Result<()>;

    /// Change the step size `dt`.
    fn set_step(&mut self, dt: Time) -> Result<()>;
}

/// Builds an evolver from a spatial operator and boundary conditions.
pub trait EvolverFactory: Evolver + Sized {
    /// The spatial operator type.
    type Operator;
    /// The boundary-condition collection type.
    type BcSet;

    /// Construct the evolver; the operator is copied, the conditions are moved in.
    fn from_operator(op: &Self::Operator, bcs: Self::BcSet) -> Result<Self>;
}
