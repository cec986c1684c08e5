//! Boundary conditions for finite-difference evolvers.
//!
//! A condition touches one side of the grid and hooks into the four phases
//! of a θ-scheme step: before/after the explicit application and
//! before/after the implicit solve.  Phases a concrete condition does not
//! handle fail with [`Error::NotSupported`] rather than passing silently.

use std::fmt;

use ql_core::{ensure, Error, Real, Result, Time};
use ql_math::Array;

use super::tridiagonal_operator::TridiagonalOperator;

/// The grid side a boundary condition acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// First node.
    Lower,
    /// Last node.
    Upper,
}

/// A boundary condition for a tridiagonal operator and its value array.
pub trait BoundaryCondition: fmt::Debug + Send {
    /// The side this condition acts on.
    fn side(&self) -> Side;

    /// Update time-dependent parameters; no-op by default.
    fn set_time(&mut self, _t: Time) {}

    /// Adjust the operator before it is applied to the array.
    fn apply_before_applying(&self, _op: &mut TridiagonalOperator) -> Result<()> {
        Err(unsupported(self, "apply_before_applying"))
    }

    /// Fix the array after the operator has been applied.
    fn apply_after_applying(&self, _a: &mut Array) -> Result<()> {
        Err(unsupported(self, "apply_after_applying"))
    }

    /// Adjust the operator and right-hand side before solving.
    fn apply_before_solving(&self, _op: &mut TridiagonalOperator, _rhs: &mut Array) -> Result<()> {
        Err(unsupported(self, "apply_before_solving"))
    }

    /// Fix the solution after solving.
    fn apply_after_solving(&self, _a: &mut Array) -> Result<()> {
        Err(unsupported(self, "apply_after_solving"))
    }
}

fn unsupported<B: BoundaryCondition + ?Sized>(bc: &B, phase: &str) -> Error {
    Error::NotSupported(format!("{phase} on {bc:?}"))
}

/// The ordered list of boundary conditions handed to an evolver.
pub type BoundaryConditionSet = Vec<Box<dyn BoundaryCondition>>;

fn check_size(n: usize) -> Result<()> {
    ensure!(n >= 2, "boundary condition needs at least 2 nodes, got {n}");
    Ok(())
}

/// Neumann condition: fixed first difference at one side.
///
/// On the lower side `u[1] - u[0] = value`, on the upper side
/// `u[n-1] - u[n-2] = value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeumannBc {
    value: Real,
    side: Side,
}

impl NeumannBc {
    /// Create a Neumann condition.
    pub fn new(value: Real, side: Side) -> Self {
        Self { value, side }
    }

    /// The imposed first difference.
    pub fn value(&self) -> Real {
        self.value
    }
}

impl BoundaryCondition for NeumannBc {
    fn side(&self) -> Side {
        self.side
    }

    fn apply_before_applying(&self, op: &mut TridiagonalOperator) -> Result<()> {
        check_size(op.size())?;
        match self.side {
            Side::Lower => op.set_first_row(-1.0, 1.0),
            Side::Upper => op.set_last_row(-1.0, 1.0),
        }
    }

    fn apply_after_applying(&self, a: &mut Array) -> Result<()> {
        let n = a.size();
        check_size(n)?;
        match self.side {
            Side::Lower => a[0] = a[1] - self.value,
            Side::Upper => a[n - 1] = a[n - 2] + self.value,
        }
        Ok(())
    }

    fn apply_before_solving(&self, op: &mut TridiagonalOperator, rhs: &mut Array) -> Result<()> {
        let n = rhs.size();
        check_size(n)?;
        match self.side {
            Side::Lower => {
                op.set_first_row(-1.0, 1.0)?;
                rhs[0] = self.value;
            }
            Side::Upper => {
                op.set_last_row(-1.0, 1.0)?;
                rhs[n - 1] = self.value;
            }
        }
        Ok(())
    }

    fn apply_after_solving(&self, _a: &mut Array) -> Result<()> {
        Ok(())
    }
}

/// Dirichlet condition: fixed value at one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletBc {
    value: Real,
    side: Side,
}

impl DirichletBc {
    /// Create a Dirichlet condition.
    pub fn new(value: Real, side: Side) -> Self {
        Self { value, side }
    }

    /// The imposed boundary value.
    pub fn value(&self) -> Real {
        self.value
    }
}

impl BoundaryCondition for DirichletBc {
    fn side(&self) -> Side {
        self.side
    }

    fn apply_before_applying(&self, op: &mut TridiagonalOperator) -> Result<()> {
        check_size(op.size())?;
        match self.side {
            Side::Lower => op.set_first_row(1.0, 0.0),
            Side::Upper => op.set_last_row(0.0, 1.0),
        }
    }

    fn apply_after_applying(&self, a: &mut Array) -> Result<()> {
        let n = a.size();
        check_size(n)?;
        match self.side {
            Side::Lower => a[0] = self.value,
            Side::Upper => a[n - 1] = self.value,
        }
        Ok(())
    }

    fn apply_before_solving(&self, op: &mut TridiagonalOperator, rhs: &mut Array) -> Result<()> {
        let n = rhs.size();
        check_size(n)?;
        match self.side {
            Side::Lower => {
                op.set_first_row(1.0, 0.0)?;
                rhs[0] = self.value;
            }
            Side::Upper => {
                op.set_last_row(0.0, 1.0)?;
                rhs[n - 1] = self.value;
            }
        }
        Ok(())
    }

    fn apply_after_solving(&self, _a: &mut Array) -> Result<()> {
        Ok(())
    }
}
