use tracing::{debug, trace};

use crate::error::{IntersectionError, Result};
use crate::geometry::curve::Curve;
use crate::geometry::surface::Surface;
use crate::math::root_system::SolverMethod;
use crate::math::{Point3, Vector3};
use crate::operations::projection::ProjectPointOnSurface;
use crate::operations::raycast::{InitFailPolicy, Ray, RaycastOptions, SurfaceRaycaster};

use super::{refine_on_curve, IntersectionParams};

/// Finds one intersection point of a curve and a surface.
///
/// Casts a ray along the tangent at a curve end onto the surface, then
/// alternates between projecting onto the curve and casting along the
/// tangent at the projection, until both moves fall below the tolerance.
/// Which intersection is found depends on the curve ends; a curve crossing
/// the surface several times yields only one of the crossings.
#[derive(Debug, Clone)]
pub struct CurveSurfaceIntersect {
    params: IntersectionParams,
    raycast_samples: usize,
    raycast_method: SolverMethod,
}

impl Default for CurveSurfaceIntersect {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveSurfaceIntersect {
    /// Creates a new intersection query with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: IntersectionParams::default(),
            raycast_samples: 10,
            raycast_method: SolverMethod::default(),
        }
    }

    /// Sets the refinement parameters.
    #[must_use]
    pub fn with_params(mut self, params: IntersectionParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the grid resolution of the raycast mesh.
    #[must_use]
    pub fn with_raycast_samples(mut self, samples: usize) -> Self {
        self.raycast_samples = samples;
        self
    }

    /// Sets the solver used to refine raycast hits.
    #[must_use]
    pub fn with_raycast_method(mut self, method: SolverMethod) -> Self {
        self.raycast_method = method;
        self
    }

    /// Executes the intersection.
    ///
    /// # Errors
    ///
    /// Returns [`IntersectionError::NoInitialGuess`] when no tangent ray at
    /// either curve end hits the surface,
    /// [`IntersectionError::RaycastMissed`] when a later tangent ray misses in
    /// both directions, [`IntersectionError::MaxIterationsExceeded`] after the
    /// iteration budget, and propagates projection and raycast errors.
    ///
    /// A curve that does not reach the surface usually fails with
    /// [`ProjectionError::NoProjectionFound`](crate::error::ProjectionError::NoProjectionFound)
    /// instead: the initial ray hits beyond the curve's end, and that hit has
    /// no foot of perpendicular on the curve.
    pub fn execute<C, S>(&self, curve: &C, surface: &S) -> Result<Point3>
    where
        C: Curve + ?Sized,
        S: Surface + ?Sized,
    {
        let domain = curve.domain().bounded()?;
        let raycaster = SurfaceRaycaster::build(surface, self.raycast_samples)?;
        let options = RaycastOptions::default()
            .with_method(self.raycast_method)
            .with_on_init_fail(InitFailPolicy::ReturnNone);
        let cast = |origin: Point3, direction: Vector3| -> Result<Option<Point3>> {
            let result = raycaster.raycast(&[Ray::new(origin, direction)], &options)?;
            Ok(result.and_then(|r| r.hits.first().map(|hit| hit.point)))
        };

        let ends = [domain.t_min, domain.t_max];

        // Tangent rays from a point already on the surface only graze it.
        for t in ends {
            let point = curve.evaluate(t)?;
            if self.lies_on(&raycaster, surface, point) {
                debug!(t, "Curve end lies on the surface");
                return Ok(point);
            }
        }

        let mut start = None;
        'ends: for t in ends {
            let point = curve.evaluate(t)?;
            let tangent = curve.tangent(t)?;
            for sign in [1.0, -1.0] {
                if let Some(hit) = cast(point, tangent * sign)? {
                    debug!(t, sign, "Initial raycast hit");
                    start = Some((hit, sign));
                    break 'ends;
                }
            }
        }
        let (start, mut sign) = start.ok_or(IntersectionError::NoInitialGuess)?;

        refine_on_curve(curve, start, &self.params, |ortho| {
            let tangent = curve.tangent(ortho.nearest_parameter)?;
            if let Some(hit) = cast(ortho.nearest, tangent * sign)? {
                return Ok(hit);
            }
            if let Some(hit) = cast(ortho.nearest, -tangent * sign)? {
                trace!(sign, "Flipping raycast direction");
                sign = -sign;
                return Ok(hit);
            }
            Err(IntersectionError::RaycastMissed {
                point: ortho.nearest,
                direction: tangent * sign,
            }
            .into())
        })
    }

    /// Whether `point` is within tolerance of the surface. Projection
    /// failures count as "no".
    fn lies_on<S: Surface + ?Sized>(
        &self,
        raycaster: &SurfaceRaycaster<'_, S>,
        surface: &S,
        point: Point3,
    ) -> bool {
        let mut projection =
            ProjectPointOnSurface::new(point).with_init_samples(self.params.ortho_samples);
        if let Some(seed) = raycaster.nearest_sample(&point) {
            projection = projection.with_start(seed.x, seed.y);
        }
        projection
            .execute(surface)
            .is_ok_and(|foot| foot.distance < self.params.tolerance)
    }
}
