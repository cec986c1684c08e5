//! Banded operator with lower, main and upper diagonals.
//!
//! A [`TridiagonalOperator`] of size `n` stores `lower[0..n-1]`,
//! `diag[0..n]` and `upper[0..n-1]`; row `i` reads
//! `lower[i-1]·v[i-1] + diag[i]·v[i] + upper[i]·v[i+1]`.
//! Sizes 0 and `n ≥ 2` are valid, size 1 is rejected.

use std::fmt;
use std::sync::Arc;

use ql_core::{ensure, Error, Real, Result, Time};
use ql_math::{Array, Matrix};
use tracing::{debug, warn};

/// Relaxation factor used by [`TridiagonalOperator::sor`].
pub const SOR_OMEGA: Real = 1.5;

/// Iteration cap of [`TridiagonalOperator::sor`].
pub const SOR_MAX_ITERATIONS: usize = 100_000;

/// Regenerates an operator's diagonals for a given time.
///
/// Attached to operators whose PDE coefficients depend on time; invoked by
/// [`TridiagonalOperator::set_time`].
pub trait TimeSetter: fmt::Debug + Send + Sync {
    /// Rewrite the diagonals of `op` for time `t`.
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()>;
}

/// A tridiagonal linear operator on a 1-D grid.
///
/// Cloning deep-copies the diagonals; an attached [`TimeSetter`] is shared.
#[derive(Debug, Clone, Default)]
pub struct TridiagonalOperator {
    lower: Vec<Real>,
    diag: Vec<Real>,
    upper: Vec<Real>,
    time_setter: Option<Arc<dyn TimeSetter>>,
}

impl TridiagonalOperator {
    /// Zero operator of size `n`.
    pub fn new(n: usize) -> Result<Self> {
        ensure!(n != 1, "invalid size (1) for tridiagonal operator (must be 0 or >= 2)");
        let off = n.saturating_sub(1);
        Ok(Self {
            lower: vec![0.0; off],
            diag: vec![0.0; n],
            upper: vec![0.0; off],
            time_setter: None,
        })
    }

    /// Build from explicit diagonals.
    ///
    /// `lower` and `upper` must be one shorter than `diag`.
    pub fn from_diagonals(lower: Vec<Real>, diag: Vec<Real>, upper: Vec<Real>) -> Result<Self> {
        let n = diag.len();
        ensure!(n != 1, "invalid size (1) for tridiagonal operator (must be 0 or >= 2)");
        let off = n.saturating_sub(1);
        ensure!(
            lower.len() == off,
            "wrong size for lower diagonal vector: {} instead of {off}",
            lower.len()
        );
        ensure!(
            upper.len() == off,
            "wrong size for upper diagonal vector: {} instead of {off}",
            upper.len()
        );
        Ok(Self {
            lower,
            diag,
            upper,
            time_setter: None,
        })
    }

    /// Identity operator of size `n`.
    pub fn identity(n: usize) -> Result<Self> {
        let mut op = Self::new(n)?;
        op.diag.fill(1.0);
        Ok(op)
    }

    /// Number of grid nodes.
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Lower diagonal (`size() - 1` entries).
    pub fn lower_diagonal(&self) -> &[Real] {
        &self.lower
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> &[Real] {
        &self.diag
    }

    /// Upper diagonal (`size() - 1` entries).
    pub fn upper_diagonal(&self) -> &[Real] {
        &self.upper
    }

    // ── Row mutators ─────────────────────────────────────────────────────────

    /// Set the first row to `(b, c)`.
    pub fn set_first_row(&mut self, b: Real, c: Real) -> Result<()> {
        ensure!(self.size() >= 2, "operator of size {} has no boundary rows", self.size());
        self.diag[0] = b;
        self.upper[0] = c;
        Ok(())
    }

    /// Set interior row `i` (`1 ≤ i ≤ n-2`) to `(a, b, c)`.
    pub fn set_mid_row(&mut self, i: usize, a: Real, b: Real, c: Real) -> Result<()> {
        let n = self.size();
        if i < 1 || i + 1 >= n {
            return Err(Error::IndexOutOfRange {
                index: i,
                lower: 1,
                upper: n.saturating_sub(2),
            });
        }
        self.lower[i - 1] = a;
        self.diag[i] = b;
        self.upper[i] = c;
        Ok(())
    }

    /// Set every interior row to `(a, b, c)`.
    pub fn set_mid_rows(&mut self, a: Real, b: Real, c: Real) {
        let n = self.size();
        for i in 1..n.saturating_sub(1) {
            self.lower[i - 1] = a;
            self.diag[i] = b;
            self.upper[i] = c;
        }
    }

    /// Set the last row to `(a, b)`.
    pub fn set_last_row(&mut self, a: Real, b: Real) -> Result<()> {
        let n = self.size();
        ensure!(n >= 2, "operator of size {n} has no boundary rows");
        self.lower[n - 2] = a;
        self.diag[n - 1] = b;
        Ok(())
    }

    // ── Time dependence ──────────────────────────────────────────────────────

    /// `true` when a [`TimeSetter`] is attached.
    pub fn is_time_dependent(&self) -> bool {
        self.time_setter.is_some()
    }

    /// Attach a time setter.
    pub fn set_time_setter(&mut self, setter: Arc<dyn TimeSetter>) {
        self.time_setter = Some(setter);
    }

    /// Regenerate the diagonals at time `t`; no-op without a time setter.
    pub fn set_time(&mut self, t: Time) -> Result<()> {
        match self.time_setter.clone() {
            Some(setter) => setter.set_time(t, self),
            None => Ok(()),
        }
    }

    // ── Linear algebra ───────────────────────────────────────────────────────

    /// Compute `L · v`.
    pub fn apply_to(&self, v: &Array) -> Result<Array> {
        let n = self.size();
        ensure!(
            v.size() == n,
            "vector of the wrong size {} instead of {n}",
            v.size()
        );
        let mut result = Array::zeros(n);
        if n == 0 {
            return Ok(result);
        }

        result[0] = self.diag[0] * v[0] + self.upper[0] * v[1];
        for i in 1..n - 1 {
            result[i] =
                self.lower[i - 1] * v[i - 1] + self.diag[i] * v[i] + self.upper[i] * v[i + 1];
        }
        result[n - 1] = self.lower[n - 2] * v[n - 2] + self.diag[n - 1] * v[n - 1];
        Ok(result)
    }

    /// Solve `L · x = rhs` with the Thomas algorithm.
    ///
    /// A zero pivot is reported as [`Error::DivisionByZero`]; no pivoting is
    /// attempted.
    pub fn solve_for(&self, rhs: &Array) -> Result<Array> {
        let n = self.size();
        ensure!(
            rhs.size() == n,
            "rhs vector of size {} instead of {n}",
            rhs.size()
        );
        let mut result = Array::zeros(n);
        if n == 0 {
            return Ok(result);
        }

        let mut bet = self.diag[0];
        if bet == 0.0 {
            return Err(Error::DivisionByZero("zero pivot in row 0".into()));
        }
        result[0] = rhs[0] / bet;

        let mut gamma = vec![0.0; n];
        for j in 1..n {
            gamma[j] = self.upper[j - 1] / bet;
            bet = self.diag[j] - self.lower[j - 1] * gamma[j];
            if bet == 0.0 {
                return Err(Error::DivisionByZero(format!("zero pivot in row {j}")));
            }
            result[j] = (rhs[j] - self.lower[j - 1] * result[j - 1]) / bet;
        }

        for j in (0..n - 1).rev() {
            result[j] -= gamma[j + 1] * result[j + 1];
        }
        Ok(result)
    }

    /// Solve `L · x = rhs` by successive over-relaxation.
    ///
    /// Starts from `rhs`, relaxes with [`SOR_OMEGA`] and stops once the
    /// norm of the last correction falls to `tol`.  Fails with
    /// [`Error::NonConvergence`] after [`SOR_MAX_ITERATIONS`] sweeps.
    pub fn sor(&self, rhs: &Array, tol: Real) -> Result<Array> {
        let n = self.size();
        ensure!(
            rhs.size() == n,
            "rhs vector of size {} instead of {n}",
            rhs.size()
        );
        ensure!(tol > 0.0, "tolerance must be positive, got {tol}");
        let mut result = rhs.clone();
        if n == 0 {
            return Ok(result);
        }
        if let Some(i) = self.diag.iter().position(|&d| d == 0.0) {
            return Err(Error::DivisionByZero(format!("zero diagonal entry in row {i}")));
        }

        let mut iterations = 0;
        loop {
            let mut err = 0.0;
            for i in 0..n {
                let mut r = rhs[i] - self.diag[i] * result[i];
                if i > 0 {
                    r -= self.lower[i - 1] * result[i - 1];
                }
                if i + 1 < n {
                    r -= self.upper[i] * result[i + 1];
                }
                let correction = SOR_OMEGA * r / self.diag[i];
                err += correction * correction;
                result[i] += correction;
            }
            iterations += 1;

            let residual: Real = err.sqrt();
            if residual <= tol {
                debug!(iterations, residual, "SOR converged");
                return Ok(result);
            }
            // a diverging sweep ends in NaN, which never passes the check above
            if iterations == SOR_MAX_ITERATIONS {
                warn!(iterations, residual, tol, "SOR did not converge");
                return Err(Error::NonConvergence {
                    iterations,
                    residual,
                });
            }
        }
    }

    // ── Algebra ──────────────────────────────────────────────────────────────

    fn check_same_size(&self, other: &Self) -> Result<()> {
        ensure!(
            self.size() == other.size(),
            "operator size mismatch: {} vs {}",
            self.size(),
            other.size()
        );
        Ok(())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(Real, Real) -> Real) -> Self {
        let combine = |a: &[Real], b: &[Real]| -> Vec<Real> {
            a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
        };
        Self {
            lower: combine(&self.lower, &other.lower),
            diag: combine(&self.diag, &other.diag),
            upper: combine(&self.upper, &other.upper),
            time_setter: None,
        }
    }

    /// `self + other`; both operands must have the same size.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_same_size(other)?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    /// `self - other`; both operands must have the same size.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.check_same_size(other)?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    /// `a · self`.
    pub fn scalar_multiply(&self, a: Real) -> Self {
        let scale = |v: &[Real]| -> Vec<Real> { v.iter().map(|x| a * x).collect() };
        Self {
            lower: scale(&self.lower),
            diag: scale(&self.diag),
            upper: scale(&self.upper),
            time_setter: None,
        }
    }

    /// `-self`.
    pub fn negate(&self) -> Self {
        self.scalar_multiply(-1.0)
    }

    /// Row scaling `diag(a) · self`: row `i` is multiplied by `a[i]`.
    pub fn multiply(&self, a: &Array) -> Result<Self> {
        let n = self.size();
        ensure!(a.size() == n, "array of size {} instead of {n}", a.size());
        Ok(Self {
            lower: (0..n.saturating_sub(1)).map(|i| self.lower[i] * a[i + 1]).collect(),
            diag: (0..n).map(|i| self.diag[i] * a[i]).collect(),
            upper: (0..n.saturating_sub(1)).map(|i| self.upper[i] * a[i]).collect(),
            time_setter: None,
        })
    }

    /// Dense copy of the operator.
    pub fn to_matrix(&self) -> Matrix {
        let n = self.size();
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = self.diag[i];
            if i + 1 < n {
                m[(i, i + 1)] = self.upper[i];
                m[(i + 1, i)] = self.lower[i];
            }
        }
        m
    }
}
