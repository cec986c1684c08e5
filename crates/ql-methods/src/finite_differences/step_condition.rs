//! Per-step adjustments applied by the rollback driver.
//!
//! A [`StepCondition`] is invoked after every time step (and at every
//! stopping time) with the freshly stepped array and the time it now
//! represents.  Early exercise, shout rights and similar path-dependent
//! features are expressed this way.

use ql_core::{ensure, Rate, Real, Result, Time};
use ql_math::Array;

/// A transform of the value array applied at a given time.
pub trait StepCondition<A = Array> {
    /// Adjust `a`, which holds the solution at time `t`.
    fn apply_to(&mut self, a: &mut A, t: Time) -> Result<()>;
}

impl<F> StepCondition<Array> for F
where
    F: FnMut(&mut Array, Time),
{
    fn apply_to(&mut self, a: &mut Array, t: Time) -> Result<()> {
        self(a, t);
        Ok(())
    }
}

/// Leaves the array untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCondition;

impl<A> StepCondition<A> for NullCondition {
    fn apply_to(&mut self, _a: &mut A, _t: Time) -> Result<()> {
        Ok(())
    }
}

fn apply_against_curve(
    a: &mut Array,
    curve: &Array,
    mut f: impl FnMut(Real, Real) -> Real,
) -> Result<()> {
    ensure!(
        a.size() == curve.size(),
        "array of size {} does not match curve of size {}",
        a.size(),
        curve.size()
    );
    for (value, &c) in a.iter_mut().zip(curve.iter()) {
        *value = f(*value, c);
    }
    Ok(())
}

/// Node-wise combination of the array with a fixed curve.
///
/// At each node the value becomes `f(current, curve_value, t)`.
#[derive(Debug, Clone)]
pub struct CurveDependentStepCondition<F> {
    curve: Array,
    f: F,
}

impl<F> CurveDependentStepCondition<F>
where
    F: FnMut(Real, Real, Time) -> Real,
{
    /// Combine against `curve` with `f`.
    pub fn new(curve: Array, f: F) -> Self {
        Self { curve, f }
    }

    /// Combine against `payoff` sampled on `grid`.
    pub fn from_payoff(grid: &Array, payoff: impl Fn(Real) -> Real, f: F) -> Self {
        Self::new(grid.map(payoff), f)
    }

    /// The curve values.
    pub fn curve(&self) -> &Array {
        &self.curve
    }
}

impl<F> StepCondition<Array> for CurveDependentStepCondition<F>
where
    F: FnMut(Real, Real, Time) -> Real,
{
    fn apply_to(&mut self, a: &mut Array, t: Time) -> Result<()> {
        let f = &mut self.f;
        apply_against_curve(a, &self.curve, |current, c| f(current, c, t))
    }
}

/// Early exercise: each node is floored at its intrinsic value.
#[derive(Debug, Clone, PartialEq)]
pub struct AmericanCondition {
    intrinsic_values: Array,
}

impl AmericanCondition {
    /// Floor against precomputed intrinsic values.
    pub fn new(intrinsic_values: Array) -> Self {
        Self { intrinsic_values }
    }

    /// Floor against `payoff` sampled on `grid`.
    pub fn from_payoff(grid: &Array, payoff: impl Fn(Real) -> Real) -> Self {
        Self::new(grid.map(payoff))
    }

    /// The intrinsic values.
    pub fn intrinsic_values(&self) -> &Array {
        &self.intrinsic_values
    }
}

impl StepCondition<Array> for AmericanCondition {
    fn apply_to(&mut self, a: &mut Array, _t: Time) -> Result<()> {
        apply_against_curve(a, &self.intrinsic_values, Real::max)
    }
}

/// Shout option: the holder may lock in the intrinsic value, paid at maturity.
///
/// At time `t` each node is floored at the intrinsic value discounted from
/// the residual time back to `t` at `rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoutCondition {
    intrinsic_values: Array,
    residual_time: Time,
    rate: Rate,
}

impl ShoutCondition {
    /// Create a shout condition.
    pub fn new(intrinsic_values: Array, residual_time: Time, rate: Rate) -> Self {
        Self {
            intrinsic_values,
            residual_time,
            rate,
        }
    }

    /// Create from `payoff` sampled on `grid`.
    pub fn from_payoff(
        grid: &Array,
        payoff: impl Fn(Real) -> Real,
        residual_time: Time,
        rate: Rate,
    ) -> Self {
        Self::new(grid.map(payoff), residual_time, rate)
    }
}

impl StepCondition<Array> for ShoutCondition {
    fn apply_to(&mut self, a: &mut Array, t: Time) -> Result<()> {
        let disc = (-self.rate * (t - self.residual_time)).exp();
        apply_against_curve(a, &self.intrinsic_values, |current, intrinsic| {
            current.max(disc * intrinsic)
        })
    }
}

/// One condition per array, for evolvers that step several arrays together.
#[derive(Default)]
pub struct StepConditionSet {
    conditions: Vec<Box<dyn StepCondition<Array>>>,
}

impl StepConditionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition for the next array.
    pub fn push(&mut self, condition: Box<dyn StepCondition<Array>>) {
        self.conditions.push(condition);
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// `true` when the set holds no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl StepCondition<Vec<Array>> for StepConditionSet {
    fn apply_to(&mut self, a: &mut Vec<Array>, t: Time) -> Result<()> {
        ensure!(
            a.len() == self.conditions.len(),
            "{} arrays but {} step conditions",
            a.len(),
            self.conditions.len()
        );
        for (array, condition) in a.iter_mut().zip(self.conditions.iter_mut()) {
            condition.apply_to(array, t)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::Error;

    #[test]
    fn null_condition_is_identity() {
        let mut a = Array::from_slice(&[1.0, 2.0]);
        NullCondition.apply_to(&mut a, 0.3).unwrap();
        assert_eq!(a.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn american_floors_at_intrinsic() {
        let grid = Array::from_slice(&[80.0, 100.0, 120.0]);
        let mut cond = AmericanCondition::from_payoff(&grid, |s| (100.0 - s).max(0.0));
        let mut a = Array::from_slice(&[15.0, 4.0, 0.5]);
        cond.apply_to(&mut a, 0.5).unwrap();
        assert_eq!(a.as_slice(), &[20.0, 4.0, 0.5]);
    }

    #[test]
    fn american_rejects_mismatched_sizes() {
        let mut cond = AmericanCondition::new(Array::zeros(3));
        assert!(matches!(
            cond.apply_to(&mut Array::zeros(4), 0.0),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn shout_discounts_intrinsic_to_residual_time() {
        let mut cond = ShoutCondition::new(Array::from_slice(&[10.0, 0.0]), 1.0, 0.05);
        let mut a = Array::from_slice(&[5.0, 1.0]);
        cond.apply_to(&mut a, 0.0).unwrap();
        // exp(-0.05·(0 - 1)) = e^0.05
        assert_abs_diff_eq!(a[0], 10.0 * 0.05_f64.exp(), epsilon = 1e-12);
        assert_eq!(a[1], 1.0);
    }

    #[test]
    fn curve_dependent_condition_sees_time() {
        let mut seen = Vec::new();
        {
            let mut cond = CurveDependentStepCondition::new(
                Array::from_slice(&[1.0, 2.0]),
                |current: Real, curve: Real, t: Time| {
                    seen.push(t);
                    current + curve * t
                },
            );
            let mut a = Array::from_slice(&[0.0, 0.0]);
            cond.apply_to(&mut a, 0.5).unwrap();
            assert_eq!(a.as_slice(), &[0.5, 1.0]);
        }
        assert_eq!(seen, vec![0.5, 0.5]);
    }

    #[test]
    fn closures_are_step_conditions() {
        let mut calls = 0;
        let mut cond = |a: &mut Array, t: Time| {
            calls += 1;
            a[0] = t;
        };
        let mut a = Array::zeros(2);
        StepCondition::apply_to(&mut cond, &mut a, 0.75).unwrap();
        assert_eq!(a[0], 0.75);
        assert_eq!(calls, 1);
    }

    #[test]
    fn condition_set_applies_per_array() {
        let mut set = StepConditionSet::new();
        set.push(Box::new(AmericanCondition::new(Array::from_element(2, 1.0))));
        set.push(Box::new(NullCondition));
        assert_eq!(set.len(), 2);

        let mut arrays = vec![Array::zeros(2), Array::zeros(2)];
        set.apply_to(&mut arrays, 0.0).unwrap();
        assert_eq!(arrays[0].as_slice(), &[1.0, 1.0]);
        assert_eq!(arrays[1].as_slice(), &[0.0, 0.0]);

        assert!(set.apply_to(&mut vec![Array::zeros(2)], 0.0).is_err());
    }
}
