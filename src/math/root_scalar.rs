use crate::error::{Result, SolverError};

/// Ridder's method for a continuous function with a sign change on a bracket.
///
/// Each iteration probes the bracket midpoint first and then an exponential
/// fit through the endpoints and the midpoint, so convergence is quadratic
/// while the root always stays bracketed.
#[derive(Debug, Clone, Copy)]
pub struct BracketSolver {
    /// Absolute tolerance on the root.
    pub xtol: f64,
    /// Relative tolerance on the root.
    pub rtol: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for BracketSolver {
    fn default() -> Self {
        Self {
            xtol: 2e-12,
            rtol: 4.0 * f64::EPSILON,
            max_iterations: 100,
        }
    }
}

impl BracketSolver {
    /// Finds a root of `f` inside `[a, b]`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidBracket`] if `f(a)` and `f(b)` have the
    /// same sign, [`SolverError::NotConverged`] if the iteration cap is hit or
    /// `f` produces a non-finite value, and propagates any error from `f`.
    #[allow(clippy::float_cmp, clippy::many_single_char_names)]
    pub fn ridder<F>(&self, mut f: F, a: f64, b: f64) -> Result<f64>
    where
        F: FnMut(f64) -> Result<f64>,
    {
        let (mut a, mut b) = (a, b);
        let mut fa = f(a)?;
        let mut fb = f(b)?;
        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::InvalidBracket { a, b }.into());
        }

        let mut previous = f64::NAN;
        for iteration in 1..=self.max_iterations {
            let mid = 0.5 * (a + b);
            let fm = f(mid)?;
            let s = fm.mul_add(fm, -fa * fb).sqrt();
            if s == 0.0 {
                return Ok(mid);
            }
            let direction = if fa > fb { 1.0 } else { -1.0 };
            let x = mid + (mid - a) * direction * fm / s;
            let fx = f(x)?;
            if !x.is_finite() || !fx.is_finite() {
                return Err(SolverError::NotConverged {
                    iterations: iteration,
                    message: "function returned a non-finite value".into(),
                }
                .into());
            }

            let tol = self.rtol.mul_add(x.abs(), self.xtol);
            if fx == 0.0 || (x - previous).abs() <= tol {
                return Ok(x);
            }
            previous = x;

            if fm.signum() != fx.signum() {
                a = mid;
                fa = fm;
                b = x;
                fb = fx;
            } else if fa.signum() != fx.signum() {
                b = x;
                fb = fx;
            } else {
                a = x;
                fa = fx;
            }

            if (b - a).abs() <= tol {
                return Ok(x);
            }
        }

        Err(SolverError::NotConverged {
            iterations: self.max_iterations,
            message: "bracket did not shrink below tolerance".into(),
        }
        .into())
    }
}
