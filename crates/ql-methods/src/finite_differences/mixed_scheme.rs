//! θ-scheme evolver.
//!
//! For a spatial operator `L` (with the sign convention `∂u/∂t = L u` when
//! rolling back), one step of size `dt` solves
//!
//! ```text
//! (I + θ·dt·L) · u(t - dt) = (I - (1-θ)·dt·L) · u(t)
//! ```
//!
//! θ = 0 is explicit Euler, θ = 1 implicit Euler and θ = ½ Crank-Nicolson.
//! The explicit part is skipped entirely when θ = 1 and the implicit part
//! when θ = 0.

use ql_core::{ensure, Real, Result, Time};
use ql_math::Array;
use tracing::trace;

use super::boundary_condition::BoundaryConditionSet;
use super::evolver::{Evolver, EvolverFactory};
use super::tridiagonal_operator::TridiagonalOperator;

/// Named θ values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchemeKind {
    /// θ = 0.
    ExplicitEuler,
    /// θ = 1.
    ImplicitEuler,
    /// θ = ½.
    CrankNicolson,
}

impl SchemeKind {
    /// The blending weight of this scheme.
    pub fn theta(self) -> Real {
        match self {
            SchemeKind::ExplicitEuler => 0.0,
            SchemeKind::ImplicitEuler => 1.0,
            SchemeKind::CrankNicolson => 0.5,
        }
    }
}

/// θ-scheme evolver over a [`TridiagonalOperator`].
///
/// Owns a private copy of `L`; later changes to the caller's operator do
/// not reach the scheme, except through an attached `TimeSetter`.
#[derive(Debug)]
pub struct MixedScheme {
    l: TridiagonalOperator,
    identity: TridiagonalOperator,
    explicit_part: Option<TridiagonalOperator>,
    implicit_part: Option<TridiagonalOperator>,
    dt: Time,
    theta: Real,
    bcs: BoundaryConditionSet,
}

impl MixedScheme {
    /// Create a scheme with blending weight `theta ∈ [0, 1]`.
    ///
    /// The step size starts at zero; call [`Evolver::set_step`] before stepping.
    pub fn new(l: &TridiagonalOperator, theta: Real, bcs: BoundaryConditionSet) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&theta),
            "theta must be in [0, 1], got {theta}"
        );
        let mut scheme = Self {
            l: l.clone(),
            identity: TridiagonalOperator::identity(l.size())?,
            explicit_part: None,
            implicit_part: None,
            dt: 0.0,
            theta,
            bcs,
        };
        scheme.set_step(0.0)?;
        Ok(scheme)
    }

    /// Create one of the named schemes.
    pub fn with_kind(
        l: &TridiagonalOperator,
        kind: SchemeKind,
        bcs: BoundaryConditionSet,
    ) -> Result<Self> {
        Self::new(l, kind.theta(), bcs)
    }

    /// Explicit Euler (θ = 0).
    pub fn explicit_euler(l: &TridiagonalOperator, bcs: BoundaryConditionSet) -> Result<Self> {
        Self::with_kind(l, SchemeKind::ExplicitEuler, bcs)
    }

    /// Implicit Euler (θ = 1).
    pub fn implicit_euler(l: &TridiagonalOperator, bcs: BoundaryConditionSet) -> Result<Self> {
        Self::with_kind(l, SchemeKind::ImplicitEuler, bcs)
    }

    /// Crank-Nicolson (θ = ½).
    pub fn crank_nicolson(l: &TridiagonalOperator, bcs: BoundaryConditionSet) -> Result<Self> {
        Self::with_kind(l, SchemeKind::CrankNicolson, bcs)
    }

    /// Blending weight.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Current step size.
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// The scheme's private copy of the spatial operator.
    pub fn operator(&self) -> &TridiagonalOperator {
        &self.l
    }

    /// `I - (1-θ)·dt·L`, absent when θ = 1.
    pub fn explicit_part(&self) -> Option<&TridiagonalOperator> {
        self.explicit_part.as_ref()
    }

    /// `I + θ·dt·L`, absent when θ = 0.
    pub fn implicit_part(&self) -> Option<&TridiagonalOperator> {
        self.implicit_part.as_ref()
    }

    fn has_explicit_part(&self) -> bool {
        self.theta != 1.0
    }

    fn has_implicit_part(&self) -> bool {
        self.theta != 0.0
    }

    fn build_explicit(&self) -> Result<TridiagonalOperator> {
        self.identity
            .subtract(&self.l.scalar_multiply((1.0 - self.theta) * self.dt))
    }

    fn build_implicit(&self) -> Result<TridiagonalOperator> {
        self.identity.add(&self.l.scalar_multiply(self.theta * self.dt))
    }
}

impl Evolver for MixedScheme {
    type Array = Array;

    fn step(&mut self, a: &mut Array, t: Time) -> Result<()> {
        for bc in self.bcs.iter_mut() {
            bc.set_time(t);
        }

        if self.has_explicit_part() {
            if self.l.is_time_dependent() {
                self.l.set_time(t)?;
                self.explicit_part = Some(self.build_explicit()?);
            }
            if let Some(explicit) = self.explicit_part.as_mut() {
                for bc in &self.bcs {
                    bc.apply_before_applying(explicit)?;
                }
                *a = explicit.apply_to(a)?;
            }
            for bc in &self.bcs {
                bc.apply_after_applying(a)?;
            }
        }

        if self.has_implicit_part() {
            if self.l.is_time_dependent() {
                self.l.set_time(t - self.dt)?;
                self.implicit_part = Some(self.build_implicit()?);
            }
            if let Some(implicit) = self.implicit_part.as_mut() {
                for bc in &self.bcs {
                    bc.apply_before_solving(implicit, a)?;
                }
                *a = implicit.solve_for(a)?;
            }
            for bc in &self.bcs {
                bc.apply_after_solving(a)?;
            }
        }
        Ok(())
    }

    fn set_step(&mut self, dt: Time) -> Result<()> {
        self.dt = dt;
        trace!(dt, theta = self.theta, "rebuilding scheme operators");
        if self.has_explicit_part() {
            self.explicit_part = Some(self.build_explicit()?);
        }
        if self.has_implicit_part() {
            self.implicit_part = Some(self.build_implicit()?);
        }
        Ok(())
    }
}

impl EvolverFactory for MixedScheme {
    type Operator = TridiagonalOperator;
    type BcSet = BoundaryConditionSet;

    /// Crank-Nicolson is the default θ when built through the factory.
    fn from_operator(op: &TridiagonalOperator, bcs: BoundaryConditionSet) -> Result<Self> {
        Self::crank_nicolson(op, bcs)
    }
}
