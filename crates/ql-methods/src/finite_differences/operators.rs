//! Standard finite-difference stencils on a uniform grid of spacing `h`.
//!
//! Boundary rows of the first-derivative operators use one-sided
//! differences; the second-derivative operator leaves them zero, to be
//! filled in by boundary conditions.

use ql_core::{ensure, Rate, Real, Result, Volatility};

use super::tridiagonal_operator::TridiagonalOperator;

fn uniform(n: usize, h: Real) -> Result<TridiagonalOperator> {
    ensure!(n >= 3, "stencil needs at least 3 grid points, got {n}");
    ensure!(h > 0.0, "grid spacing must be positive, got {h}");
    TridiagonalOperator::new(n)
}

/// Forward first difference `D+`.
pub fn d_plus(n: usize, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(n, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(0.0, -1.0 / h, 1.0 / h);
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Backward first difference `D-`.
pub fn d_minus(n: usize, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(n, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(-1.0 / h, 1.0 / h, 0.0);
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Central first difference `D0`.
pub fn d_zero(n: usize, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(n, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(-0.5 / h, 0.0, 0.5 / h);
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Central second difference `D+D-`.
pub fn d_plus_d_minus(n: usize, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(n, h)?;
    let h2 = h * h;
    op.set_first_row(0.0, 0.0)?;
    op.set_mid_rows(1.0 / h2, -2.0 / h2, 1.0 / h2);
    op.set_last_row(0.0, 0.0)?;
    Ok(op)
}

/// Black-Scholes operator in log-price space with constant coefficients.
///
/// `L = -(σ²/2)·D+D- - ν·D0 + r·I` with `ν = r - q - σ²/2`, on a uniform
/// log grid of spacing `dx`.  Boundary rows are left zero.
pub fn bsm_operator(
    n: usize,
    dx: Real,
    r: Rate,
    q: Rate,
    sigma: Volatility,
) -> Result<TridiagonalOperator> {
    let mut op = uniform(n, dx)?;
    let sigma2 = sigma * sigma;
    let nu = r - q - 0.5 * sigma2;
    let pd = -(sigma2 / dx - nu) / (2.0 * dx);
    let pu = -(sigma2 / dx + nu) / (2.0 * dx);
    let pm = sigma2 / (dx * dx) + r;
    op.set_mid_rows(pd, pm, pu);
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::Error;
    use ql_math::Array;

    fn samples(f: impl Fn(Real) -> Real, n: usize, h: Real) -> Array {
        Array::from_fn(n, |i| f(i as Real * h))
    }

    #[test]
    fn first_differences_of_linear_function_are_exact() {
        let (n, h) = (7, 0.5);
        let v = samples(|x| 3.0 * x - 1.0, n, h);
        for op in [d_plus(n, h), d_minus(n, h), d_zero(n, h)] {
            let d = op.unwrap().apply_to(&v).unwrap();
            for i in 0..n {
                assert_abs_diff_eq!(d[i], 3.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn second_difference_of_quadratic_is_exact_inside() {
        let (n, h) = (6, 0.25);
        let v = samples(|x| x * x, n, h);
        let d2 = d_plus_d_minus(n, h).unwrap().apply_to(&v).unwrap();
        assert_eq!(d2[0], 0.0);
        assert_eq!(d2[n - 1], 0.0);
        for i in 1..n - 1 {
            assert_abs_diff_eq!(d2[i], 2.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn d_plus_d_minus_is_product_of_first_differences_inside() {
        let (n, h) = (5, 1.0);
        let v = Array::from_slice(&[0.0, 1.0, 4.0, 1.0, 0.0]);
        let via_product = d_plus(n, h)
            .unwrap()
            .apply_to(&d_minus(n, h).unwrap().apply_to(&v).unwrap())
            .unwrap();
        let direct = d_plus_d_minus(n, h).unwrap().apply_to(&v).unwrap();
        for i in 1..n - 1 {
            assert_abs_diff_eq!(via_product[i], direct[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn bsm_operator_annihilates_discounted_forward() {
        // L applied to e^x (the forward) leaves q·e^x inside the grid,
        // up to the O(dx²) stencil error.
        let (r, q, sigma) = (0.05, 0.02, 0.2);
        let (n, dx) = (21, 0.01);
        let op = bsm_operator(n, dx, r, q, sigma).unwrap();
        let v = samples(Real::exp, n, dx);
        let lv = op.apply_to(&v).unwrap();
        for i in 1..n - 1 {
            assert_abs_diff_eq!(lv[i], q * v[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn stencils_validate_inputs() {
        assert!(matches!(d_plus(2, 1.0), Err(Error::Precondition(_))));
        assert!(matches!(d_zero(5, 0.0), Err(Error::Precondition(_))));
    }
}
