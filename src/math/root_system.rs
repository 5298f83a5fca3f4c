use crate::error::{Result, SolverError};

use super::{Matrix3, Vector3};

/// A system of three nonlinear equations in three unknowns.
pub trait NonlinearSystem {
    /// Evaluates the residual vector `F(x)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying geometry cannot be evaluated at `x`.
    fn residual(&self, x: &Vector3) -> Result<Vector3>;

    /// Evaluates the Jacobian `dF/dx`.
    ///
    /// The default uses forward differences around `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the residual cannot be evaluated.
    fn jacobian(&self, x: &Vector3) -> Result<Matrix3> {
        let f0 = self.residual(x)?;
        let mut jacobian = Matrix3::zeros();
        for j in 0..3 {
            let h = f64::EPSILON.sqrt() * x[j].abs().max(1.0);
            let mut shifted = *x;
            shifted[j] += h;
            let column = (self.residual(&shifted)? - f0) / h;
            jacobian.set_column(j, &column);
        }
        Ok(jacobian)
    }
}

/// Iteration strategy for [`SystemSolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SolverMethod {
    /// Powell's hybrid method: a dogleg trust region between the Newton step
    /// and the steepest-descent step.
    #[default]
    Hybrid,
    /// Newton iteration damped by a backtracking line search.
    Newton,
}

/// Converged solution of a [`NonlinearSystem`].
#[derive(Debug, Clone, Copy)]
pub struct SystemSolution {
    /// The root.
    pub x: Vector3,
    /// Euclidean norm of the residual at `x`.
    pub residual: f64,
    /// Number of iterations used.
    pub iterations: usize,
}

/// Configurable nonlinear system solver.
#[derive(Debug, Clone, Copy)]
pub struct SystemSolver {
    /// Iteration strategy.
    pub method: SolverMethod,
    /// Residual norm accepted as a root.
    pub ftol: f64,
    /// Relative step size below which the iteration is considered stalled.
    pub xtol: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for SystemSolver {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            ftol: 1e-10,
            xtol: 1.49012e-8,
            max_iterations: 100,
        }
    }
}

const NO_PROGRESS: &str = "the iteration is not making good progress";
const MAX_ITERATIONS: &str = "the maximum number of iterations was reached";

impl SystemSolver {
    /// Creates a solver with default tolerances for the given method.
    #[must_use]
    pub fn new(method: SolverMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Solves `system` starting from `x0`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::NotConverged`] with a diagnostic message when
    /// no root is reached, and propagates evaluation errors from `system`.
    pub fn solve(&self, system: &impl NonlinearSystem, x0: Vector3) -> Result<SystemSolution> {
        match self.method {
            SolverMethod::Hybrid => self.solve_hybrid(system, x0),
            SolverMethod::Newton => self.solve_newton(system, x0),
        }
    }

    fn stalled(&self, step: &Vector3, x: &Vector3) -> bool {
        step.norm() <= self.xtol * (x.norm() + self.xtol)
    }

    fn not_converged(iterations: usize, message: &str) -> crate::error::ParaqueryError {
        SolverError::NotConverged {
            iterations,
            message: message.into(),
        }
        .into()
    }

    fn solve_newton(&self, system: &impl NonlinearSystem, x0: Vector3) -> Result<SystemSolution> {
        let mut x = x0;
        let mut f = system.residual(&x)?;
        let mut norm = f.norm();

        for iteration in 0..self.max_iterations {
            if norm <= self.ftol {
                return Ok(SystemSolution {
                    x,
                    residual: norm,
                    iterations: iteration,
                });
            }

            let jacobian = system.jacobian(&x)?;
            let Some(step) = jacobian.lu().solve(&-f) else {
                return Err(Self::not_converged(iteration, "the Jacobian is singular"));
            };

            let mut lambda = 1.0;
            let (x_next, f_next) = loop {
                let candidate = x + step * lambda;
                let f_candidate = system.residual(&candidate)?;
                if f_candidate.norm() < (1.0 - 1e-4 * lambda) * norm {
                    break (candidate, f_candidate);
                }
                lambda *= 0.5;
                if lambda < 1e-10 {
                    if norm <= self.ftol.sqrt() && self.stalled(&step, &x) {
                        return Ok(SystemSolution {
                            x,
                            residual: norm,
                            iterations: iteration,
                        });
                    }
                    return Err(Self::not_converged(iteration, NO_PROGRESS));
                }
            };

            let taken = x_next - x;
            x = x_next;
            f = f_next;
            norm = f.norm();

            if self.stalled(&taken, &x) && norm <= self.ftol.sqrt() {
                return Ok(SystemSolution {
                    x,
                    residual: norm,
                    iterations: iteration + 1,
                });
            }
        }

        if norm <= self.ftol {
            return Ok(SystemSolution {
                x,
                residual: norm,
                iterations: self.max_iterations,
            });
        }
        Err(Self::not_converged(self.max_iterations, MAX_ITERATIONS))
    }

    fn solve_hybrid(&self, system: &impl NonlinearSystem, x0: Vector3) -> Result<SystemSolution> {
        let mut x = x0;
        let mut f = system.residual(&x)?;
        let mut norm = f.norm();
        let mut radius = x.norm().max(1.0);

        for iteration in 0..self.max_iterations {
            if norm <= self.ftol {
                return Ok(SystemSolution {
                    x,
                    residual: norm,
                    iterations: iteration,
                });
            }

            let jacobian = system.jacobian(&x)?;
            let newton = jacobian.lu().solve(&-f);
            let gradient = jacobian.transpose() * f;
            let curvature = (jacobian * gradient).norm_squared();
            if curvature <= f64::MIN_POSITIVE {
                return Err(Self::not_converged(iteration, NO_PROGRESS));
            }
            let cauchy = -gradient * (gradient.norm_squared() / curvature);
            let step = dogleg(newton, cauchy, radius);

            let predicted = norm * norm - (f + jacobian * step).norm_squared();
            let candidate = x + step;
            let f_candidate = system.residual(&candidate)?;
            let candidate_norm = f_candidate.norm();
            let actual = norm * norm - candidate_norm * candidate_norm;
            let ratio = if predicted > 0.0 { actual / predicted } else { -1.0 };

            let step_norm = step.norm();
            if ratio < 0.25 {
                radius = 0.25 * step_norm;
            } else if ratio > 0.75 && step_norm >= 0.99 * radius {
                radius = (2.0 * step_norm).max(radius);
            }

            if ratio > 1e-4 {
                x = candidate;
                f = f_candidate;
                norm = candidate_norm;
                if self.stalled(&step, &x) && norm <= self.ftol.sqrt() {
                    return Ok(SystemSolution {
                        x,
                        residual: norm,
                        iterations: iteration + 1,
                    });
                }
            }

            if radius <= self.xtol * (x.norm() + self.xtol) {
                if norm <= self.ftol.sqrt() {
                    return Ok(SystemSolution {
                        x,
                        residual: norm,
                        iterations: iteration + 1,
                    });
                }
                return Err(Self::not_converged(iteration + 1, NO_PROGRESS));
            }
        }

        if norm <= self.ftol {
            return Ok(SystemSolution {
                x,
                residual: norm,
                iterations: self.max_iterations,
            });
        }
        Err(Self::not_converged(self.max_iterations, MAX_ITERATIONS))
    }
}

/// Picks the dogleg step inside a trust region of the given radius.
fn dogleg(newton: Option<Vector3>, cauchy: Vector3, radius: f64) -> Vector3 {
    if let Some(newton) = newton {
        if newton.norm() <= radius {
            return newton;
        }
    }

    let cauchy_norm = cauchy.norm();
    if cauchy_norm >= radius {
        return cauchy * (radius / cauchy_norm);
    }

    let Some(newton) = newton else {
        return cauchy;
    };

    // Walk from the Cauchy point towards the Newton point until the boundary.
    let d = newton - cauchy;
    let a = d.norm_squared();
    let b = 2.0 * cauchy.dot(&d);
    let c = cauchy_norm * cauchy_norm - radius * radius;
    let tau = (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
    cauchy + d * tau.clamp(0.0, 1.0)
}
