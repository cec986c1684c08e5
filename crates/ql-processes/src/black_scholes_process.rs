//! Black-Scholes-Merton process `dS/S = (r − q) dt + σ(t, S) dW`.
//!
//! [`GeneralizedBlackScholes`] is the view finite-difference generators
//! take of the process: term rates plus a local volatility.
//! [`BlackScholesMertonProcess`] is the constant-parameter implementation.

use crate::stochastic_process::StochasticProcess1D;
use ql_core::{ensure, Rate, Real, Result, Time, Volatility};

/// Rates and volatility of a generalized Black-Scholes process.
pub trait GeneralizedBlackScholes: StochasticProcess1D {
    /// Instantaneous risk-free rate at `t`.
    fn risk_free_rate(&self, t: Time) -> Rate;

    /// Instantaneous continuous dividend yield at `t`.
    fn dividend_yield(&self, t: Time) -> Rate;

    /// Local volatility at time `t` and underlying level `s`.
    fn local_volatility(&self, t: Time, s: Real) -> Volatility;

    /// Drift of `ln S`: `r − q − σ²/2`.
    fn log_drift(&self, t: Time, s: Real) -> Real {
        let sigma = self.local_volatility(t, s);
        self.risk_free_rate(t) - self.dividend_yield(t) - 0.5 * sigma * sigma
    }
}

/// A Black-Scholes-Merton process with flat rate, dividend yield and volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesMertonProcess {
    spot: Real,
    risk_free_rate: Rate,
    dividend_yield: Rate,
    volatility: Volatility,
}

impl BlackScholesMertonProcess {
    /// Create a new process; `spot` and `volatility` must be positive.
    pub fn new(
        spot: Real,
        risk_free_rate: Rate,
        dividend_yield: Rate,
        volatility: Volatility,
    ) -> Result<Self> {
        ensure!(spot > 0.0, "spot must be positive, got {spot}");
        ensure!(volatility > 0.0, "volatility must be positive, got {volatility}");
        Ok(Self {
            spot,
            risk_free_rate,
            dividend_yield,
            volatility,
        })
    }

    /// The spot price.
    pub fn spot(&self) -> Real {
        self.spot
    }

    /// The flat volatility.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl StochasticProcess1D for BlackScholesMertonProcess {
    fn x0(&self) -> Real {
        self.spot
    }

    fn drift_1d(&self, _t: Time, x: Real) -> Real {
        (self.risk_free_rate - self.dividend_yield) * x
    }

    fn diffusion_1d(&self, _t: Time, x: Real) -> Real {
        self.volatility * x
    }
}

impl GeneralizedBlackScholes for BlackScholesMertonProcess {
    fn risk_free_rate(&self, _t: Time) -> Rate {
        self.risk_free_rate
    }

    fn dividend_yield(&self, _t: Time) -> Rate {
        self.dividend_yield
    }

    fn local_volatility(&self, _t: Time, _s: Real) -> Volatility {
        self.volatility
    }
}
