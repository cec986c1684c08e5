//! Coefficient generators for second-order parabolic PDEs.
//!
//! A PDE of the form
//!
//! ```text
//! ∂u/∂t + ½σ²(t,x)·∂²u/∂x² + ν(t,x)·∂u/∂x - r(t,x)·u = 0
//! ```
//!
//! is discretized on a (possibly non-uniform) [`TransformedGrid`] into the
//! interior rows of a [`TridiagonalOperator`] with the rollback sign
//! convention of `MixedScheme`.

use std::fmt;
use std::sync::Arc;

use ql_core::{ensure, Real, Result, Time};
use ql_processes::GeneralizedBlackScholes;

use super::grid::TransformedGrid;
use super::tridiagonal_operator::{TimeSetter, TridiagonalOperator};

/// Diffusion, drift and discount coefficients of a parabolic PDE.
pub trait PdeSecondOrderParabolic: fmt::Debug + Send + Sync {
    /// Diffusion `σ(t, x)`.
    fn diffusion(&self, t: Time, x: Real) -> Real;

    /// Drift `ν(t, x)`.
    fn drift(&self, t: Time, x: Real) -> Real;

    /// Discount rate `r(t, x)`.
    fn discount(&self, t: Time, x: Real) -> Real;

    /// Write the interior rows of `op` for time `t`.
    ///
    /// Uses the three-point stencil for unequal spacings `dx⁻`, `dx⁺`.
    fn generate_operator(
        &self,
        t: Time,
        grid: &TransformedGrid,
        op: &mut TridiagonalOperator,
    ) -> Result<()> {
        ensure!(
            op.size() == grid.size(),
            "operator size {} does not match grid size {}",
            op.size(),
            grid.size()
        );
        for i in 1..grid.size() - 1 {
            let x = grid.transformed_grid(i);
            let sigma = self.diffusion(t, x);
            let nu = self.drift(t, x);
            let r = self.discount(t, x);
            let sigma2 = sigma * sigma;

            let pd = -(sigma2 / grid.dxm(i) - nu) / grid.dx(i);
            let pu = -(sigma2 / grid.dxp(i) + nu) / grid.dx(i);
            let pm = sigma2 / (grid.dxm(i) * grid.dxp(i)) + r;
            op.set_mid_row(i, pd, pm, pu)?;
        }
        Ok(())
    }
}

/// Builds a PDE from a stochastic process.
pub trait PdeFactory: Sized {
    /// The process the PDE is derived from.
    type Process: ?Sized;

    /// Instantiate the PDE for `process`.
    fn from_process(process: Arc<Self::Process>) -> Self;
}

/// Black-Scholes PDE in log-price coordinates.
#[derive(Debug, Clone)]
pub struct PdeBsm {
    process: Arc<dyn GeneralizedBlackScholes>,
}

impl PdeBsm {
    /// Create the PDE for `process`.
    pub fn new(process: Arc<dyn GeneralizedBlackScholes>) -> Self {
        Self { process }
    }
}

impl PdeSecondOrderParabolic for PdeBsm {
    fn diffusion(&self, t: Time, x: Real) -> Real {
        self.process.local_volatility(t, x.exp())
    }

    fn drift(&self, t: Time, x: Real) -> Real {
        self.process.log_drift(t, x.exp())
    }

    fn discount(&self, t: Time, _x: Real) -> Real {
        self.process.risk_free_rate(t)
    }
}

impl PdeFactory for PdeBsm {
    type Process = dyn GeneralizedBlackScholes;

    fn from_process(process: Arc<dyn GeneralizedBlackScholes>) -> Self {
        Self::new(process)
    }
}

/// A PDE with coefficients frozen at one reference point.
///
/// Valid only when the wrapped PDE's coefficients do not vary over the grid
/// and over the rollback horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdeConstantCoeff {
    diffusion: Real,
    drift: Real,
    discount: Real,
}

impl PdeConstantCoeff {
    /// Freeze the coefficients of `pde` at `(t, x)`.
    pub fn new<P: PdeSecondOrderParabolic + ?Sized>(pde: &P, t: Time, x: Real) -> Self {
        Self {
            diffusion: pde.diffusion(t, x),
            drift: pde.drift(t, x),
            discount: pde.discount(t, x),
        }
    }
}

impl PdeSecondOrderParabolic for PdeConstantCoeff {
    fn diffusion(&self, _t: Time, _x: Real) -> Real {
        self.diffusion
    }

    fn drift(&self, _t: Time, _x: Real) -> Real {
        self.drift
    }

    fn discount(&self, _t: Time, _x: Real) -> Real {
        self.discount
    }
}

/// Regenerates an operator from a PDE whenever the operator's time is set.
#[derive(Debug)]
pub struct GenericTimeSetter<P> {
    grid: TransformedGrid,
    pde: P,
}

impl<P: PdeSecondOrderParabolic> GenericTimeSetter<P> {
    /// Bind `pde` to `grid`.
    pub fn new(grid: TransformedGrid, pde: P) -> Self {
        Self { grid, pde }
    }
}

impl<P: PdeSecondOrderParabolic> TimeSetter for GenericTimeSetter<P> {
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
        self.pde.generate_operator(t, &self.grid, op)
    }
}

/// Time-dependent operator for `pde` on `grid`, generated at `residual_time`.
pub fn pde_operator<P: PdeSecondOrderParabolic + 'static>(
    grid: &TransformedGrid,
    pde: P,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    let mut op = TridiagonalOperator::new(grid.size())?;
    op.set_time_setter(Arc::new(GenericTimeSetter::new(grid.clone(), pde)));
    op.set_time(residual_time)?;
    Ok(op)
}

/// Constant-coefficient Black-Scholes operator on a log grid.
///
/// Coefficients are frozen at the first node and `residual_time`.
pub fn bsm_grid_operator(
    grid: &TransformedGrid,
    process: Arc<dyn GeneralizedBlackScholes>,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    let pde = PdeConstantCoeff::new(
        &PdeBsm::from_process(process),
        residual_time,
        grid.transformed_grid(0),
    );
    let mut op = TridiagonalOperator::new(grid.size())?;
    pde.generate_operator(residual_time, grid, &mut op)?;
    Ok(op)
}

/// Time-dependent Black-Scholes operator on a log grid.
pub fn bsm_term_operator(
    grid: &TransformedGrid,
    process: Arc<dyn GeneralizedBlackScholes>,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    pde_operator(grid, PdeBsm::from_process(process), residual_time)
}
