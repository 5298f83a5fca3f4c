use tracing::trace;

use crate::error::{OperationError, ProjectionError, Result};
use crate::geometry::curve::Curve;
use crate::math::root_scalar::BracketSolver;
use crate::math::{linspace, Point3};

/// Result of projecting a point onto a curve.
///
/// Holds every foot of perpendicular found, plus the one nearest to the
/// source point.
#[derive(Debug, Clone)]
pub struct CurveProjection {
    /// Parameters of all feet of perpendicular.
    pub parameters: Vec<f64>,
    /// Curve points at [`CurveProjection::parameters`].
    pub points: Vec<Point3>,
    /// The projected point.
    pub source: Point3,
    /// Nearest candidate to `source`.
    pub nearest: Point3,
    /// Parameter of `nearest`.
    pub nearest_parameter: f64,
    /// Index of `nearest` in `points`.
    pub nearest_index: usize,
    /// Distance from `source` to `nearest`.
    pub nearest_distance: f64,
}

/// Orthogonal projection of a point onto a curve.
///
/// Finds roots of `(source - C(t)) . C'(t)` by sampling the domain and
/// solving every sign-changing interval with Ridder's method. Feet lying
/// between two samples of equal sign are missed, so the sample count bounds
/// the resolution.
#[derive(Debug, Clone)]
pub struct ProjectPointOnCurve {
    point: Point3,
    init_samples: usize,
    solver: BracketSolver,
}

impl ProjectPointOnCurve {
    /// Creates a new projection of `point` with 10 initial samples.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            init_samples: 10,
            solver: BracketSolver::default(),
        }
    }

    /// Sets the number of initial samples over the curve domain.
    #[must_use]
    pub fn with_init_samples(mut self, samples: usize) -> Self {
        self.init_samples = samples;
        self
    }

    /// Sets the bracketed root finder.
    #[must_use]
    pub fn with_solver(mut self, solver: BracketSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Executes the projection.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::NoProjectionFound`] when no foot of
    /// perpendicular is bracketed, an error for fewer than two samples or an
    /// unbounded domain, and propagates curve and solver errors.
    #[allow(clippy::float_cmp)]
    pub fn execute<C: Curve + ?Sized>(&self, curve: &C) -> Result<CurveProjection> {
        if self.init_samples < 2 {
            return Err(OperationError::InvalidInput(format!(
                "curve projection needs at least 2 samples, got {}",
                self.init_samples
            ))
            .into());
        }
        let domain = curve.domain().bounded()?;

        let goal = |t: f64| -> Result<f64> {
            let on_curve = curve.evaluate(t)?;
            Ok((self.point - on_curve).dot(&curve.tangent(t)?))
        };

        let ts = linspace(domain.t_min, domain.t_max, self.init_samples);
        let values = ts.iter().map(|&t| goal(t)).collect::<Result<Vec<_>>>()?;

        let mut parameters = Vec::new();
        for (i, (&t, &g)) in ts.iter().zip(&values).enumerate() {
            if g == 0.0 {
                parameters.push(t);
                continue;
            }
            if let (Some(&t_next), Some(&g_next)) = (ts.get(i + 1), values.get(i + 1)) {
                if g * g_next < 0.0 {
                    parameters.push(self.solver.ridder(&goal, t, t_next)?);
                }
            }
        }
        trace!(roots = parameters.len(), "Projected point onto curve");

        let points = curve.evaluate_array(&parameters)?;
        let Some((nearest_index, nearest_distance)) = points
            .iter()
            .map(|p| (self.point - p).norm())
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return Err(ProjectionError::NoProjectionFound { point: self.point }.into());
        };

        Ok(CurveProjection {
            nearest: points[nearest_index],
            nearest_parameter: parameters[nearest_index],
            nearest_index,
            nearest_distance,
            source: self.point,
            parameters,
            points,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, ParaqueryError};
    use crate::geometry::curve::{Circle, Line};
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn circle(radius: f64) -> Circle {
        Circle::new(Point3::origin(), radius, Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn point_outside_circle() {
        let result = ProjectPointOnCurve::new(Point3::new(3.0, 4.0, 0.0))
            .execute(&circle(2.0))
            .unwrap();
        assert_relative_eq!(result.nearest_distance, 3.0, epsilon = 1e-9);
        assert_relative_eq!(result.nearest, Point3::new(1.2, 1.6, 0.0), epsilon = 1e-9);
        // The far side is a foot of perpendicular too.
        assert_eq!(result.points.len(), 2);
    }

    #[test]
    fn point_inside_circle() {
        let source = Point3::new(0.5, 0.5, 0.0);
        let result = ProjectPointOnCurve::new(source).execute(&circle(2.0)).unwrap();
        let expected = 2.0 - source.coords.norm();
        assert_relative_eq!(result.nearest_distance, expected, epsilon = 1e-9);
        assert_relative_eq!(result.nearest_parameter, std::f64::consts::FRAC_PI_4, epsilon = 1e-9);
        assert_eq!(result.source, source);
    }

    #[test]
    fn point_on_segment_projects_to_itself() {
        let segment =
            Line::segment(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0)).unwrap();
        let on = Point3::new(0.7, 0.7, 0.0);
        let result = ProjectPointOnCurve::new(on).execute(&segment).unwrap();
        assert_relative_eq!(result.nearest, on, epsilon = 1e-9);
        assert_relative_eq!(result.nearest_distance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn sample_exactly_on_foot_is_a_root() {
        // Samples land on t = 0, 1, 2, 3, 4; the foot is at t = 2.
        let segment = Line::segment(Point3::origin(), Point3::new(4.0, 0.0, 0.0)).unwrap();
        let result = ProjectPointOnCurve::new(Point3::new(2.0, 1.0, 0.0))
            .with_init_samples(5)
            .execute(&segment)
            .unwrap();
        assert_eq!(result.parameters, vec![2.0]);
    }

    #[test]
    fn no_foot_of_perpendicular() {
        let segment = Line::segment(Point3::origin(), Point3::new(1.0, 0.0, 0.0)).unwrap();
        let err = ProjectPointOnCurve::new(Point3::new(5.0, 1.0, 0.0))
            .execute(&segment)
            .unwrap_err();
        assert!(matches!(
            err,
            ParaqueryError::Projection(ProjectionError::NoProjectionFound { .. })
        ));
    }

    #[test]
    fn rejects_bad_setup() {
        let segment = Line::segment(Point3::origin(), Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(matches!(
            ProjectPointOnCurve::new(Point3::origin())
                .with_init_samples(1)
                .execute(&segment),
            Err(ParaqueryError::Operation(OperationError::InvalidInput(_)))
        ));
        let infinite = Line::new(Point3::origin(), Vector3::x()).unwrap();
        assert!(matches!(
            ProjectPointOnCurve::new(Point3::origin()).execute(&infinite),
            Err(ParaqueryError::Geometry(GeometryError::UnboundedDomain))
        ));
    }
}
