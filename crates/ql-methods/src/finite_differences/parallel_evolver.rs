//! Lock-step evolution of several arrays.
//!
//! Each array has its own evolver (and hence its own operator and boundary
//! conditions); all of them share the step size and the time axis.

use ql_core::{ensure, Result, Time};

use super::evolver::{Evolver, EvolverFactory};

/// A sequence of evolvers stepping a matching sequence of arrays.
#[derive(Debug)]
pub struct ParallelEvolver<E> {
    evolvers: Vec<E>,
}

impl<E: Evolver> ParallelEvolver<E> {
    /// Wrap the given evolvers.
    pub fn new(evolvers: Vec<E>) -> Self {
        Self { evolvers }
    }

    /// Number of arrays stepped together.
    pub fn len(&self) -> usize {
        self.evolvers.len()
    }

    /// `true` when there are no evolvers.
    pub fn is_empty(&self) -> bool {
        self.evolvers.is_empty()
    }

    /// The wrapped evolvers.
    pub fn evolvers(&self) -> &[E] {
        &self.evolvers
    }
}

impl<E: Evolver> Evolver for ParallelEvolver<E> {
    type Array = Vec<E::Array>;

    fn step(&mut self, a: &mut Vec<E::Array>, t: Time) -> Result<()> {
        ensure!(
            a.len() == self.evolvers.len(),
            "{} arrays for {} evolvers",
            a.len(),
            self.evolvers.len()
        );
        for (evolver, array) in self.evolvers.iter_mut().zip(a.iter_mut()) {
            evolver.step(array, t)?;
        }
        Ok(())
    }

    fn set_step(&mut self, dt: Time) -> Result<()> {
        self.evolvers.iter_mut().try_for_each(|e| e.set_step(dt))
    }
}

impl<E: EvolverFactory> EvolverFactory for ParallelEvolver<E> {
    type Operator = Vec<E::Operator>;
    type BcSet = Vec<E::BcSet>;

    fn from_operator(ops: &Vec<E::Operator>, bcs: Vec<E::BcSet>) -> Result<Self> {
        ensure!(
            ops.len() == bcs.len(),
            "{} operators but {} boundary condition sets",
            ops.len(),
            bcs.len()
        );
        let evolvers = ops
            .iter()
            .zip(bcs)
            .map(|(op, bc)| E::from_operator(op, bc))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(evolvers))
    }
}
