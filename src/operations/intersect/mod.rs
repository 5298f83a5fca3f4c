mod curve_plane;
mod curve_surface;
mod surface_plane;

pub use curve_plane::CurvePlaneIntersect;
pub use curve_surface::CurveSurfaceIntersect;
pub use surface_plane::{Contour, SurfacePlaneContours, SurfacePlaneIsoCurves};

use tracing::debug;

use crate::error::{IntersectionError, Result};
use crate::geometry::curve::Curve;
use crate::math::Point3;

use super::projection::{CurveProjection, ProjectPointOnCurve};

/// Sampling and convergence settings shared by the curve intersectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionParams {
    /// Samples used to bracket crossings along the curve.
    pub init_samples: usize,
    /// Samples for each orthogonal projection onto the curve.
    pub ortho_samples: usize,
    /// Step length at which the refinement stops.
    pub tolerance: f64,
    /// Maximum number of refinement rounds.
    pub max_iterations: usize,
}

impl Default for IntersectionParams {
    fn default() -> Self {
        Self {
            init_samples: 10,
            ortho_samples: 10,
            tolerance: 1e-3,
            max_iterations: 50,
        }
    }
}

/// Runs the project-then-advance refinement from `start`.
///
/// Each round snaps the current estimate onto the curve by orthogonal
/// projection, then moves along the curve tangent onto the other object.
/// The loop stops once either move is shorter than the tolerance.
///
/// `advance` receives the projection of the current estimate onto the curve
/// and returns the next point on the other object.
fn refine_on_curve<C, F>(
    curve: &C,
    start: Point3,
    params: &IntersectionParams,
    mut advance: F,
) -> Result<Point3>
where
    C: Curve + ?Sized,
    F: FnMut(&CurveProjection) -> Result<Point3>,
{
    let mut previous = start;
    let mut on_curve = start;
    let mut step = f64::INFINITY;

    for iteration in 1..=params.max_iterations {
        let ortho = ProjectPointOnCurve::new(previous)
            .with_init_samples(params.ortho_samples)
            .execute(curve)?;
        step = (ortho.nearest - previous).norm();
        if step < params.tolerance {
            debug!(iteration, step, "Converged after curve projection");
            return Ok(ortho.nearest);
        }

        on_curve = ortho.nearest;
        let point = advance(&ortho)?;
        step = (point - on_curve).norm();
        if step < params.tolerance {
            debug!(iteration, step, "Converged after tangent step");
            return Ok(point);
        }
        previous = point;
    }

    Err(IntersectionError::MaxIterationsExceeded {
        previous: on_curve,
        last: previous,
        step,
    }
    .into())
}
