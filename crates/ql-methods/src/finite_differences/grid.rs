//! Spatial grids.
//!
//! [`TransformedGrid`] keeps a grid in its natural coordinates (e.g. spot
//! prices) together with the transformed coordinates the PDE is written in
//! (e.g. log-prices) and the local spacings `dx⁻`, `dx⁺` used by the
//! non-uniform stencil.

use ql_core::{ensure, Real, Result};
use ql_math::Array;

/// Uniform grid of `steps + 1` nodes between `x_min` and `x_max`.
pub fn bounded_grid(x_min: Real, x_max: Real, steps: usize) -> Result<Array> {
    ensure!(steps >= 1, "grid needs at least one step");
    ensure!(x_max > x_min, "empty grid range [{x_min}, {x_max}]");
    let dx = (x_max - x_min) / steps as Real;
    Ok(Array::from_fn(steps + 1, |i| x_min + i as Real * dx))
}

/// Uniform grid of `steps + 1` nodes centered on `center` with spacing `dx`.
///
/// An odd `steps` is rounded up so the center is a node.
pub fn centered_grid(center: Real, dx: Real, steps: usize) -> Result<Array> {
    ensure!(dx > 0.0, "grid spacing must be positive, got {dx}");
    let half = steps.div_ceil(2).max(1);
    let x_min = center - half as Real * dx;
    Ok(Array::from_fn(2 * half + 1, |i| x_min + i as Real * dx))
}

/// Grid of `steps + 1` nodes uniform in `ln x` between `x_min` and `x_max`.
pub fn bounded_log_grid(x_min: Real, x_max: Real, steps: usize) -> Result<Array> {
    ensure!(x_min > 0.0, "log grid needs a positive lower bound, got {x_min}");
    Ok(bounded_grid(x_min.ln(), x_max.ln(), steps)?.map(Real::exp))
}

/// A grid with transformed coordinates and local spacings.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedGrid {
    grid: Array,
    transformed: Array,
    dxm: Array,
    dxp: Array,
    dx: Array,
}

impl TransformedGrid {
    /// Grid whose transformed coordinates are the grid itself.
    pub fn new(grid: Array) -> Result<Self> {
        Self::with_transform(grid, |x| x)
    }

    /// Grid transformed by `f`; the transformed nodes must be strictly increasing.
    pub fn with_transform<F: Fn(Real) -> Real>(grid: Array, f: F) -> Result<Self> {
        let n = grid.size();
        ensure!(n >= 2, "grid needs at least 2 nodes, got {n}");
        let transformed = grid.map(f);
        for i in 1..n {
            ensure!(
                transformed[i] > transformed[i - 1],
                "transformed grid is not strictly increasing at node {i}"
            );
        }

        let mut dxm = Array::zeros(n);
        let mut dxp = Array::zeros(n);
        let mut dx = Array::zeros(n);
        for i in 1..n - 1 {
            dxm[i] = transformed[i] - transformed[i - 1];
            dxp[i] = transformed[i + 1] - transformed[i];
            dx[i] = dxm[i] + dxp[i];
        }
        Ok(Self {
            grid,
            transformed,
            dxm,
            dxp,
            dx,
        })
    }

    /// Grid transformed by the natural logarithm.
    pub fn log(grid: Array) -> Result<Self> {
        ensure!(
            grid.iter().all(|&x| x > 0.0),
            "log grid needs positive nodes"
        );
        Self::with_transform(grid, Real::ln)
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Nodes in natural coordinates.
    pub fn grid_array(&self) -> &Array {
        &self.grid
    }

    /// Nodes in transformed coordinates.
    pub fn transformed_grid_array(&self) -> &Array {
        &self.transformed
    }

    /// Node `i` in natural coordinates.
    pub fn grid(&self, i: usize) -> Real {
        self.grid[i]
    }

    /// Node `i` in transformed coordinates.
    pub fn transformed_grid(&self, i: usize) -> Real {
        self.transformed[i]
    }

    /// Spacing to the previous node (interior nodes only).
    pub fn dxm(&self, i: usize) -> Real {
        self.dxm[i]
    }

    /// Spacing to the next node (interior nodes only).
    pub fn dxp(&self, i: usize) -> Real {
        self.dxp[i]
    }

    /// `dxm(i) + dxp(i)`.
    pub fn dx(&self, i: usize) -> Real {
        self.dx[i]
    }
}
