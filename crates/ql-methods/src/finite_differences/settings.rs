//! Discretization settings for finite-difference pricing.

use ql_core::{ensure, Real, Result};

/// Grid, time-stepping and scheme parameters.
///
/// With the `serde` feature the struct can be loaded from any serde format;
/// missing fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FdSettings {
    /// Number of spatial grid points (rounded up to an odd count so the
    /// spot is a node).
    pub grid_points: usize,
    /// Number of uniform time steps.
    pub time_steps: usize,
    /// θ of the mixed scheme.
    pub theta: Real,
    /// Half-width of the log grid in standard deviations of `ln S_T`.
    pub std_devs: Real,
    /// Regenerate the operator at every step instead of freezing it at maturity.
    pub time_dependent: bool,
}

impl Default for FdSettings {
    fn default() -> Self {
        Self {
            grid_points: 100,
            time_steps: 100,
            theta: 0.5,
            std_devs: 4.0,
            time_dependent: false,
        }
    }
}

impl FdSettings {
    /// Check that the settings describe a usable discretization.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_points >= 3,
            "at least 3 grid points required, got {}",
            self.grid_points
        );
        ensure!(self.time_steps >= 1, "at least one time step required");
        ensure!(
            (0.0..=1.0).contains(&self.theta),
            "theta must be in [0, 1], got {}",
            self.theta
        );
        ensure!(
            self.std_devs > 0.0,
            "grid width must be positive, got {} standard deviations",
            self.std_devs
        );
        Ok(())
    }

    /// Set the number of grid points.
    pub fn with_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Set the number of time steps.
    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Set θ.
    pub fn with_theta(mut self, theta: Real) -> Self {
        self.theta = theta;
        self
    }

    /// Set the grid half-width in standard deviations.
    pub fn with_std_devs(mut self, std_devs: Real) -> Self {
        self.std_devs = std_devs;
        self
    }

    /// Regenerate the operator at every step.
    pub fn with_time_dependent(mut self, time_dependent: bool) -> Self {
        self.time_dependent = time_dependent;
        self
    }
}
