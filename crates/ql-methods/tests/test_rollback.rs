//! End-to-end rollback tests.
//!
//! These integration tests drive `FiniteDifferenceModel` through the public
//! API: a heat-equation regression, compositionality over contiguous
//! intervals, exact landing on stopping times, and boundary conditions on
//! flat arrays.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ql_core::{Real, Result, Time};
use ql_math::Array;
use ql_methods::finite_differences::{
    bounded_log_grid, bsm_grid_operator, d_plus_d_minus, AmericanCondition, BoundaryCondition,
    BoundaryConditionSet, Evolver, FiniteDifferenceModel, MixedScheme, NeumannBc, Side,
    StepCondition, TransformedGrid, TridiagonalOperator,
};
use ql_processes::BlackScholesMertonProcess;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn zero_neumann() -> BoundaryConditionSet {
    vec![
        Box::new(NeumannBc::new(0.0, Side::Lower)),
        Box::new(NeumannBc::new(0.0, Side::Upper)),
    ]
}

/// Log grid, payoff and Black-Scholes operator for a put struck at 100.
fn bsm_setup() -> (Array, TridiagonalOperator, BoundaryConditionSet) {
    let process = Arc::new(BlackScholesMertonProcess::new(100.0, 0.05, 0.01, 0.2).unwrap());
    let grid = TransformedGrid::log(bounded_log_grid(40.0, 250.0, 80).unwrap()).unwrap();
    let payoff = grid.grid_array().map(|s| (100.0 - s).max(0.0));
    let op = bsm_grid_operator(&grid, process, 1.0).unwrap();
    let n = payoff.size();
    let bcs: BoundaryConditionSet = vec![
        Box::new(NeumannBc::new(payoff[1] - payoff[0], Side::Lower)),
        Box::new(NeumannBc::new(payoff[n - 1] - payoff[n - 2], Side::Upper)),
    ];
    (payoff, op, bcs)
}

// ───────────────────────── heat equation ─────────────────────────

#[test]
fn heat_equation_single_crank_nicolson_step() {
    init_tracing();
    let mut model = FiniteDifferenceModel::<MixedScheme>::from_operator(
        &d_plus_d_minus(5, 1.0).unwrap(),
        zero_neumann(),
        &[],
    )
    .unwrap();

    let mut u = Array::from_slice(&[0.0, 1.0, 4.0, 1.0, 0.0]);
    model.rollback(&mut u, 0.1, 0.0, 1).unwrap();

    let expected = [0.7, 0.7, 4.7, 0.7, 0.7];
    for (i, e) in expected.iter().enumerate() {
        assert_abs_diff_eq!(u[i], *e, epsilon = 1e-12);
    }
}

// ───────────────────────── compositionality ─────────────────────────

#[test]
fn rollback_composes_over_contiguous_intervals() {
    init_tracing();
    let (payoff, op, _) = bsm_setup();

    let (_, _, bcs) = bsm_setup();
    let mut whole = FiniteDifferenceModel::<MixedScheme>::from_operator(&op, bcs, &[]).unwrap();
    let mut a = payoff.clone();
    whole.rollback(&mut a, 1.0, 0.0, 40).unwrap();

    let (_, _, bcs) = bsm_setup();
    let mut halves = FiniteDifferenceModel::<MixedScheme>::from_operator(&op, bcs, &[]).unwrap();
    let mut b = payoff;
    halves.rollback(&mut b, 1.0, 0.5, 20).unwrap();
    halves.rollback(&mut b, 0.5, 0.0, 20).unwrap();

    for i in 0..a.size() {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-10);
    }
}

#[test]
fn rollback_composes_with_early_exercise() {
    let (payoff, op, bcs) = bsm_setup();
    let mut model = FiniteDifferenceModel::<MixedScheme>::from_operator(&op, bcs, &[]).unwrap();
    let mut condition = AmericanCondition::new(payoff.clone());

    let mut a = payoff.clone();
    model.rollback_with(&mut a, 1.0, 0.0, 40, &mut condition).unwrap();
    let mut b = payoff.clone();
    model.rollback_with(&mut b, 1.0, 0.25, 30, &mut condition).unwrap();
    model.rollback_with(&mut b, 0.25, 0.0, 10, &mut condition).unwrap();

    for i in 0..a.size() {
        assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-10);
        assert!(a[i] >= payoff[i]);
    }
}

// ───────────────────────── stopping times ─────────────────────────

/// Counts steps and remembers every (t, dt) pair.
#[derive(Debug, Default)]
struct CountingEvolver {
    dt: Time,
    calls: Vec<(Time, Time)>,
}

impl Evolver for CountingEvolver {
    type Array = Array;

    fn step(&mut self, _a: &mut Array, t: Time) -> Result<()> {
        self.calls.push((t, self.dt));
        Ok(())
    }

    fn set_step(&mut self, dt: Time) -> Result<()> {
        self.dt = dt;
        Ok(())
    }
}

#[test]
fn stopping_times_are_hit_exactly() {
    init_tracing();
    let stopping = [0.33, 0.37, 0.81];
    let mut model = FiniteDifferenceModel::new(CountingEvolver::default(), &stopping);
    let mut seen = Vec::new();
    let mut condition = |_: &mut Array, t: Time| seen.push(t);
    let mut a = Array::zeros(3);
    model.rollback_with(&mut a, 1.0, 0.0, 10, &mut condition).unwrap();

    // 10 regular steps, one split for 0.81, two splits for the step
    // spanning 0.4 -> 0.3
    let calls = &model.evolver().calls;
    assert_eq!(calls.len(), 13);
    for st in stopping {
        assert_eq!(seen.iter().filter(|&&t| t == st).count(), 1, "{st} in {seen:?}");
    }
    let landing: Vec<Real> = calls.iter().map(|&(t, dt)| t - dt).collect();
    for st in stopping {
        assert!(
            landing.iter().any(|&l| (l - st).abs() < 1e-14),
            "no step lands on {st}"
        );
    }

    let total: Time = calls.iter().map(|&(_, dt)| dt).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    assert_eq!(seen.last().copied(), Some(0.0));
}

#[test]
fn stopping_time_outside_interval_is_ignored() {
    let mut model = FiniteDifferenceModel::new(CountingEvolver::default(), &[1.5, -0.2]);
    let mut a = Array::zeros(3);
    model.rollback(&mut a, 1.0, 0.0, 4).unwrap();
    assert_eq!(model.evolver().calls.len(), 4);
}

// ───────────────────────── boundary conditions ─────────────────────────

#[test]
fn zero_neumann_leaves_flat_arrays_unchanged() {
    let mut flat = Array::from_element(6, 3.5);
    for bc in zero_neumann() {
        bc.apply_after_applying(&mut flat).unwrap();
        bc.apply_after_solving(&mut flat).unwrap();
    }
    assert_eq!(flat.as_slice(), &[3.5; 6]);

    let mut model = FiniteDifferenceModel::<MixedScheme>::from_operator(
        &d_plus_d_minus(6, 0.5).unwrap(),
        zero_neumann(),
        &[],
    )
    .unwrap();
    model.rollback(&mut flat, 1.0, 0.0, 10).unwrap();
    for v in flat.iter() {
        assert_abs_diff_eq!(*v, 3.5, epsilon = 1e-12);
    }
}

#[test]
fn step_condition_trait_objects_drive_rollback() {
    let (payoff, op, bcs) = bsm_setup();
    let mut model = FiniteDifferenceModel::<MixedScheme>::from_operator(&op, bcs, &[0.5]).unwrap();
    let mut condition: Box<dyn StepCondition<Array>> = Box::new(AmericanCondition::new(payoff.clone()));
    let mut a = payoff.clone();
    model
        .rollback_with(&mut a, 1.0, 0.0, 20, condition.as_mut())
        .unwrap();
    assert!(a.iter().zip(payoff.iter()).all(|(v, p)| v >= p));
}
