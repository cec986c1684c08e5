//! Finite-difference pricing of vanilla options under Black-Scholes.
//!
//! Wires the engine together: a log grid centered on spot, the terminal
//! payoff, a Black-Scholes operator with Neumann boundaries matching the
//! payoff slope, a θ-scheme, and a rollback from maturity to today with
//! the exercise condition.

use std::sync::Arc;

use ql_core::{ensure, Real, Result, Time};
use ql_math::Array;
use ql_processes::GeneralizedBlackScholes;
use tracing::debug;

use super::boundary_condition::{BoundaryConditionSet, NeumannBc, Side};
use super::finite_difference_model::FiniteDifferenceModel;
use super::grid::{centered_grid, TransformedGrid};
use super::mixed_scheme::MixedScheme;
use super::pde::{bsm_grid_operator, bsm_term_operator};
use super::settings::FdSettings;
use super::step_condition::AmericanCondition;

/// When the option may be exercised.
#[derive(Debug, Clone, PartialEq)]
pub enum Exercise {
    /// At maturity only.
    European,
    /// At any time up to maturity.
    American,
    /// On the given dates (year fractions from today).
    Bermudan(Vec<Time>),
}

/// Value and grid sensitivities at spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdVanillaResults {
    /// Option value.
    pub value: Real,
    /// `∂V/∂S`.
    pub delta: Real,
    /// `∂²V/∂S²`.
    pub gamma: Real,
}

/// Finite-difference pricer for single-asset vanilla payoffs.
#[derive(Debug, Clone)]
pub struct FdVanillaPricer {
    process: Arc<dyn GeneralizedBlackScholes>,
    maturity: Time,
    settings: FdSettings,
}

impl FdVanillaPricer {
    /// Create a pricer; `maturity` must be positive.
    pub fn new(
        process: Arc<dyn GeneralizedBlackScholes>,
        maturity: Time,
        settings: FdSettings,
    ) -> Result<Self> {
        ensure!(maturity > 0.0, "maturity must be positive, got {maturity}");
        settings.validate()?;
        Ok(Self {
            process,
            maturity,
            settings,
        })
    }

    /// The discretization settings.
    pub fn settings(&self) -> &FdSettings {
        &self.settings
    }

    /// Spot grid: uniform in `ln S`, spot at the middle node.
    pub fn grid(&self) -> Result<TransformedGrid> {
        let spot = self.process.x0();
        let sigma = self.process.local_volatility(self.maturity, spot);
        let half_width = self.settings.std_devs * sigma * self.maturity.sqrt();
        let steps = self.settings.grid_points - 1;
        let dx = 2.0 * half_width / steps as Real;
        let log_grid = centered_grid(spot.ln(), dx, steps)?;
        TransformedGrid::log(log_grid.map(Real::exp))
    }

    /// Price `payoff` with the given exercise.
    pub fn price(
        &self,
        payoff: impl Fn(Real) -> Real,
        exercise: &Exercise,
    ) -> Result<FdVanillaResults> {
        let grid = self.grid()?;
        let n = grid.size();
        let intrinsic = grid.grid_array().map(payoff);

        let op = if self.settings.time_dependent {
            bsm_term_operator(&grid, self.process.clone(), self.maturity)?
        } else {
            bsm_grid_operator(&grid, self.process.clone(), self.maturity)?
        };
        let bcs: BoundaryConditionSet = vec![
            Box::new(NeumannBc::new(intrinsic[1] - intrinsic[0], Side::Lower)),
            Box::new(NeumannBc::new(intrinsic[n - 1] - intrinsic[n - 2], Side::Upper)),
        ];
        let scheme = MixedScheme::new(&op, self.settings.theta, bcs)?;

        let exercise_times: Vec<Time> = match exercise {
            Exercise::Bermudan(dates) => {
                ensure!(
                    dates.iter().all(|&d| d >= 0.0 && d <= self.maturity),
                    "exercise dates must lie in [0, {}]",
                    self.maturity
                );
                dates.clone()
            }
            _ => Vec::new(),
        };
        let mut model = FiniteDifferenceModel::new(scheme, &exercise_times);
        debug!(
            grid_points = n,
            time_steps = self.settings.time_steps,
            theta = self.settings.theta,
            ?exercise,
            "pricing vanilla option"
        );

        let mut values = intrinsic.clone();
        let steps = self.settings.time_steps;
        match exercise {
            Exercise::European => model.rollback(&mut values, self.maturity, 0.0, steps)?,
            Exercise::American => {
                let mut condition = AmericanCondition::new(intrinsic);
                model.rollback_with(&mut values, self.maturity, 0.0, steps, &mut condition)?
            }
            Exercise::Bermudan(_) => {
                let stopping_times = model.stopping_times().to_vec();
                let mut condition = |a: &mut Array, t: Time| {
                    if stopping_times.contains(&t) {
                        for (v, &iv) in a.iter_mut().zip(intrinsic.iter()) {
                            *v = v.max(iv);
                        }
                    }
                };
                model.rollback_with(&mut values, self.maturity, 0.0, steps, &mut condition)?
            }
        }

        Ok(sensitivities_at_center(&grid, &values))
    }
}

fn sensitivities_at_center(grid: &TransformedGrid, values: &Array) -> FdVanillaResults {
    let mid = grid.size() / 2;
    let (s_m, s_0, s_p) = (grid.grid(mid - 1), grid.grid(mid), grid.grid(mid + 1));
    let (v_m, v_0, v_p) = (values[mid - 1], values[mid], values[mid + 1]);
    let dp = s_p - s_0;
    let dm = s_0 - s_m;

    let delta = (v_p - v_m) / (s_p - s_m);
    let gamma = 2.0 * ((v_p - v_0) / dp - (v_0 - v_m) / dm) / (dp + dm);
    FdVanillaResults {
        value: v_0,
        delta,
        gamma,
    }
}
