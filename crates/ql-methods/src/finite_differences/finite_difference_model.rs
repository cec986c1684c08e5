//! Backward time integration with mandatory stopping times.
//!
//! [`FiniteDifferenceModel::rollback`] walks a value array from `from` back
//! to `to` in `steps` uniform steps.  Whenever a stopping time falls inside
//! a step, the step is split so the array lands exactly on it and the step
//! condition is applied there; the regular cadence resumes afterwards.

use ql_core::{ensure, Real, Result, Time};
use ql_math::close;
use tracing::{debug, trace};

use super::evolver::{Evolver, EvolverFactory};
use super::step_condition::{NullCondition, StepCondition};

/// Owns an evolver and the stopping times it must hit during rollback.
#[derive(Debug)]
pub struct FiniteDifferenceModel<E> {
    evolver: E,
    stopping_times: Vec<Time>,
}

impl<E: Evolver> FiniteDifferenceModel<E> {
    /// Wrap `evolver`; the stopping times are sorted and de-duplicated.
    pub fn new(evolver: E, stopping_times: &[Time]) -> Self {
        let mut times = stopping_times.to_vec();
        times.sort_by(Real::total_cmp);
        times.dedup();
        Self {
            evolver,
            stopping_times: times,
        }
    }

    /// Build the evolver from an operator and boundary conditions.
    pub fn from_operator(
        op: &E::Operator,
        bcs: E::BcSet,
        stopping_times: &[Time],
    ) -> Result<Self>
    where
        E: EvolverFactory,
    {
        Ok(Self::new(E::from_operator(op, bcs)?, stopping_times))
    }

    /// Stopping times, ascending.
    pub fn stopping_times(&self) -> &[Time] {
        &self.stopping_times
    }

    /// The wrapped evolver.
    pub fn evolver(&self) -> &E {
        &self.evolver
    }

    /// Roll `a` back from `from` to `to` in `steps` steps with no step condition.
    pub fn rollback(&mut self, a: &mut E::Array, from: Time, to: Time, steps: usize) -> Result<()> {
        self.rollback_impl::<NullCondition>(a, from, to, steps, None)
    }

    /// Roll `a` back from `from` to `to`, applying `condition` after every
    /// step and at every stopping time crossed.
    pub fn rollback_with<C>(
        &mut self,
        a: &mut E::Array,
        from: Time,
        to: Time,
        steps: usize,
        condition: &mut C,
    ) -> Result<()>
    where
        C: StepCondition<E::Array> + ?Sized,
    {
        self.rollback_impl(a, from, to, steps, Some(condition))
    }

    fn rollback_impl<C>(
        &mut self,
        a: &mut E::Array,
        from: Time,
        to: Time,
        steps: usize,
        mut condition: Option<&mut C>,
    ) -> Result<()>
    where
        C: StepCondition<E::Array> + ?Sized,
    {
        ensure!(from >= to, "trying to roll back from {from} to {to}");
        ensure!(steps > 0, "rollback needs at least one step");

        let dt = (from - to) / steps as Real;
        debug!(
            from,
            to,
            steps,
            dt,
            stopping_times = self.stopping_times.len(),
            "rollback"
        );
        self.evolver.set_step(dt)?;

        if self.stopping_times.last() == Some(&from) {
            if let Some(c) = condition.as_deref_mut() {
                c.apply_to(a, from)?;
            }
        }

        let mut t = from;
        for _ in 0..steps {
            let mut now = t;
            let mut next = t - dt;
            if close(to, next, Real::EPSILON.sqrt()) {
                next = to;
            }

            let mut hit = false;
            for &st in self.stopping_times.iter().rev() {
                if next <= st && st < now {
                    hit = true;
                    trace!(stopping_time = st, sub_step = now - st, "stopping time hit");
                    self.evolver.set_step(now - st)?;
                    self.evolver.step(a, now)?;
                    if let Some(c) = condition.as_deref_mut() {
                        c.apply_to(a, st)?;
                    }
                    now = st;
                }
            }

            if hit {
                if now > next {
                    trace!(sub_step = now - next, "residual sub-step");
                    self.evolver.set_step(now - next)?;
                    self.evolver.step(a, now)?;
                    if let Some(c) = condition.as_deref_mut() {
                        c.apply_to(a, next)?;
                    }
                }
                self.evolver.set_step(dt)?;
            } else {
                self.evolver.step(a, now)?;
                if let Some(c) = condition.as_deref_mut() {
                    c.apply_to(a, next)?;
                }
            }
            t -= dt;
        }
        debug!(to, "rollback done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::Error;

    /// Records every call; each step adds `dt` to the single entry.
    #[derive(Debug, Default)]
    struct Recorder {
        dt: Time,
        steps: Vec<(Time, Time)>,
        set_steps: usize,
    }

    impl Evolver for Recorder {
        type Array = Vec<Real>;

        fn step(&mut self, a: &mut Vec<Real>, t: Time) -> Result<()> {
            self.steps.push((t, self.dt));
            a[0] += self.dt;
            Ok(())
        }

        fn set_step(&mut self, dt: Time) -> Result<()> {
            self.dt = dt;
            self.set_steps += 1;
            Ok(())
        }
    }

    #[test]
    fn stopping_times_are_sorted_and_unique() {
        let model = FiniteDifferenceModel::new(Recorder::default(), &[0.5, 0.1, 0.5, 0.3]);
        assert_eq!(model.stopping_times(), &[0.1, 0.3, 0.5]);
    }

    #[test]
    fn backward_interval_is_rejected() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[]);
        let mut a = vec![0.0];
        assert!(matches!(
            model.rollback(&mut a, 0.0, 1.0, 4),
            Err(Error::Precondition(_))
        ));
        assert!(model.evolver().steps.is_empty());
        assert!(matches!(
            model.rollback(&mut a, 1.0, 0.0, 0),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn plain_rollback_takes_uniform_steps() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[]);
        let mut a = vec![0.0];
        model.rollback(&mut a, 1.0, 0.0, 4).unwrap();
        let steps = &model.evolver().steps;
        assert_eq!(steps, &vec![(1.0, 0.25), (0.75, 0.25), (0.5, 0.25), (0.25, 0.25)]);
        assert_eq!(a[0], 1.0);
        assert_eq!(model.evolver().set_steps, 1);
    }

    #[test]
    fn stopping_time_splits_the_step() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[0.6]);
        let mut a = vec![0.0];
        let mut seen = Vec::new();
        let mut cond = |_: &mut Vec<Real>, t: Time| -> Result<()> {
            seen.push(t);
            Ok(())
        };
        model.rollback_with(&mut a, 1.0, 0.0, 4, &mut Adapter(&mut cond)).unwrap();

        let steps = &model.evolver().steps;
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[1], (0.75, 0.75 - 0.6));
        assert_eq!(steps[2], (0.6, 0.6 - 0.5));
        // split, residual, restore
        assert_eq!(model.evolver().set_steps, 4);
        assert_eq!(seen, vec![0.75, 0.6, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn stopping_time_on_grid_node_applies_condition_once() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[0.5]);
        let mut a = vec![0.0];
        let mut seen = Vec::new();
        let mut cond = |_: &mut Vec<Real>, t: Time| -> Result<()> {
            seen.push(t);
            Ok(())
        };
        model.rollback_with(&mut a, 1.0, 0.0, 4, &mut Adapter(&mut cond)).unwrap();
        assert_eq!(model.evolver().steps.len(), 4);
        assert_eq!(seen, vec![0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn stopping_time_at_start_is_applied_to_terminal_values() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[1.0]);
        let mut a = vec![0.0];
        let mut seen = Vec::new();
        let mut cond = |_: &mut Vec<Real>, t: Time| -> Result<()> {
            seen.push(t);
            Ok(())
        };
        model.rollback_with(&mut a, 1.0, 0.5, 2, &mut Adapter(&mut cond)).unwrap();
        assert_eq!(seen, vec![1.0, 0.75, 0.5]);
    }

    #[test]
    fn null_condition_rollback() {
        let mut model = FiniteDifferenceModel::new(Recorder::default(), &[0.3]);
        let mut a = vec![0.0];
        model
            .rollback_with(&mut a, 1.0, 0.0, 2, &mut NullCondition)
            .unwrap();
        assert_eq!(model.evolver().steps.len(), 3);
        assert!((a[0] - 1.0).abs() < 1e-15);
    }

    /// Lets a closure over `Vec<Real>` act as a step condition.
    struct Adapter<'a, F>(&'a mut F);

    impl<F> StepCondition<Vec<Real>> for Adapter<'_, F>
    where
        F: FnMut(&mut Vec<Real>, Time) -> Result<()>,
    {
        fn apply_to(&mut self, a: &mut Vec<Real>, t: Time) -> Result<()> {
            (self.0)(a, t)
        }
    }
}
