use tracing::debug;

use crate::error::{ProjectionError, Result};
use crate::geometry::curve::{IsoAxis, IsoCurve};
use crate::geometry::surface::Surface;
use crate::math::Point3;

use super::ProjectPointOnCurve;

/// Result of a closest-point-on-surface query.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    /// U parameter on the surface.
    pub u: f64,
    /// V parameter on the surface.
    pub v: f64,
    /// 3D point on the surface.
    pub point: Point3,
    /// Distance from the query point to the surface point.
    pub distance: f64,
}

/// Orthogonal projection of a point onto a surface.
///
/// Starting at the centre of the domain, alternately projects onto the
/// iso-`u` curve through the current estimate (updating `v`) and the iso-`v`
/// curve (updating `u`) until a step moves less than the tolerance. The
/// result is a local foot of perpendicular; which one is found depends on the
/// starting point, see [`ProjectPointOnSurface::with_start`].
#[derive(Debug, Clone)]
pub struct ProjectPointOnSurface {
    point: Point3,
    init_samples: usize,
    max_iterations: usize,
    tolerance: f64,
    start: Option<(f64, f64)>,
}

impl ProjectPointOnSurface {
    /// Creates a new projection of `point`.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            init_samples: 10,
            max_iterations: 30,
            tolerance: 1e-4,
            start: None,
        }
    }

    /// Starts the iteration at `(u, v)` instead of the domain centre.
    ///
    /// The domain centre can be a stationary point of the iteration (the far
    /// side of a sphere, say), so callers with a better seed should pass it.
    #[must_use]
    pub fn with_start(mut self, u: f64, v: f64) -> Self {
        self.start = Some((u, v));
        self
    }

    /// Sets the number of samples for each curve projection.
    #[must_use]
    pub fn with_init_samples(mut self, samples: usize) -> Self {
        self.init_samples = samples;
        self
    }

    /// Sets the maximum number of alternating steps.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the step length below which the iteration stops.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the projection.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::ConvergenceFailure`] when the step never
    /// drops below the tolerance, and propagates curve projection errors.
    pub fn execute<S: Surface + ?Sized>(&self, surface: &S) -> Result<SurfacePoint> {
        let domain = surface.domain().bounded()?;
        let (mut u, mut v) = self.start.unwrap_or_else(|| domain.midpoint());
        let mut previous = surface.evaluate(u, v)?;
        let mut axis = IsoAxis::U;
        let mut step = f64::INFINITY;

        for iteration in 0..self.max_iterations {
            let fixed = match axis {
                IsoAxis::U => u,
                IsoAxis::V => v,
            };
            let projection = ProjectPointOnCurve::new(self.point)
                .with_init_samples(self.init_samples)
                .execute(&IsoCurve::new(surface, axis, fixed))?;
            match axis {
                IsoAxis::U => v = projection.nearest_parameter,
                IsoAxis::V => u = projection.nearest_parameter,
            }

            step = (projection.nearest - previous).norm();
            if step < self.tolerance {
                debug!(iterations = iteration + 1, u, v, "Surface projection converged");
                return Ok(SurfacePoint {
                    u,
                    v,
                    point: projection.nearest,
                    distance: projection.nearest_distance,
                });
            }
            previous = projection.nearest;
            axis = axis.flipped();
        }

        Err(ProjectionError::ConvergenceFailure {
            iterations: self.max_iterations,
            step,
        }
        .into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ParaqueryError;
    use crate::geometry::surface::{Cylinder, HeightField, PlanarPatch, Sphere, SurfaceDomain};
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    #[test]
    fn projects_onto_flat_patch() {
        let patch = PlanarPatch::horizontal(0.0, SurfaceDomain::new(-1.0, 1.0, -1.0, 1.0));
        let result = ProjectPointOnSurface::new(Point3::new(0.3, -0.2, 2.0))
            .execute(&patch)
            .unwrap();
        assert_relative_eq!(result.u, 0.3, epsilon = 1e-6);
        assert_relative_eq!(result.v, -0.2, epsilon = 1e-6);
        assert_relative_eq!(result.point, Point3::new(0.3, -0.2, 0.0), epsilon = 1e-6);
        assert_relative_eq!(result.distance, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn projects_onto_cylinder() {
        let cylinder = Cylinder::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x())
            .unwrap()
            .with_height(0.0, 2.0)
            .unwrap();
        let source = Point3::new(-3.0, 0.5, 1.5);
        let result = ProjectPointOnSurface::new(source).execute(&cylinder).unwrap();
        let radial = Vector3::new(-3.0, 0.5, 0.0).normalize();
        assert_relative_eq!(
            result.point,
            Point3::new(radial.x, radial.y, 1.5),
            epsilon = 1e-6
        );
        assert_relative_eq!(result.distance, 9.25_f64.sqrt() - 1.0, epsilon = 1e-6);
    }

    #[test]
    fn point_on_surface_projects_to_itself() {
        let field = HeightField::new(|x, y| 0.5 * x * y, SurfaceDomain::new(-1.0, 1.0, -1.0, 1.0));
        let on = field.evaluate(0.4, 0.6).unwrap();
        let result = ProjectPointOnSurface::new(on).execute(&field).unwrap();
        assert_relative_eq!(result.point, on, epsilon = 1e-3);
        assert!(result.distance < 1e-3);
    }

    #[test]
    fn start_seed_escapes_far_side() {
        let sphere = Sphere::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let source = Point3::new(1.0, 0.0, 0.0);

        // From the domain centre the iteration stalls on the antipode.
        let centred = ProjectPointOnSurface::new(source).execute(&sphere).unwrap();
        assert_relative_eq!(centred.distance, 2.0, epsilon = 1e-6);

        let seeded = ProjectPointOnSurface::new(source)
            .with_start(0.0, -0.2)
            .execute(&sphere)
            .unwrap();
        assert_relative_eq!(seeded.point, source, epsilon = 1e-6);
        assert!(seeded.distance < 1e-6);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let patch = PlanarPatch::horizontal(0.0, SurfaceDomain::new(-1.0, 1.0, -1.0, 1.0));
        let err = ProjectPointOnSurface::new(Point3::new(0.3, -0.2, 2.0))
            .with_max_iterations(1)
            .execute(&patch)
            .unwrap_err();
        assert!(matches!(
            err,
            ParaqueryError::Projection(ProjectionError::ConvergenceFailure { iterations: 1, .. })
        ));
    }
}
