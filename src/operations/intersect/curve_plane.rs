use tracing::debug;

use crate::error::{IntersectionError, OperationError, Result};
use crate::geometry::curve::{Curve, Line};
use crate::geometry::plane::{Plane, Side};
use crate::math::{linspace, Point3, TOLERANCE};

use super::{refine_on_curve, IntersectionParams};

/// Finds every crossing of a curve with a plane.
///
/// The curve is sampled at `init_samples` parameters and every pair of
/// neighbouring samples on opposite sides of the plane is refined to one
/// crossing. Crossings between two samples on the same side are missed.
#[derive(Debug, Clone)]
pub struct CurvePlaneIntersect {
    plane: Plane,
    params: IntersectionParams,
}

impl CurvePlaneIntersect {
    /// Creates a new intersection query against `plane`.
    #[must_use]
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            params: IntersectionParams::default(),
        }
    }

    /// Sets the refinement parameters.
    #[must_use]
    pub fn with_params(mut self, params: IntersectionParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the intersection.
    ///
    /// Returns an empty vector when the curve never changes side.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for fewer than two samples,
    /// [`IntersectionError::NoInitialPoint`] when both tangents of a bracket
    /// are parallel to the plane, [`IntersectionError::TangentParallelToPlane`]
    /// or [`IntersectionError::MaxIterationsExceeded`] when the refinement
    /// fails.
    pub fn execute<C: Curve + ?Sized>(&self, curve: &C) -> Result<Vec<Point3>> {
        if self.params.init_samples < 2 {
            return Err(OperationError::InvalidInput(format!(
                "curve-plane intersection needs at least 2 samples, got {}",
                self.params.init_samples
            ))
            .into());
        }
        let domain = curve.domain().bounded()?;
        let ts = linspace(domain.t_min, domain.t_max, self.params.init_samples);
        let points = curve.evaluate_array(&ts)?;
        let sides = self.plane.side_of_points(&points);
        let last = sides.len() - 1;
        let closed = (points[last] - points[0]).norm() < TOLERANCE;

        let mut crossings = Vec::new();
        for (i, side) in sides.iter().enumerate() {
            if *side != Side::On || (closed && i == last) {
                continue;
            }
            let before = i.checked_sub(1).map(|j| sides[j]);
            let after = sides.get(i + 1).copied();
            if [before, after].into_iter().flatten().any(|s| s != Side::On) {
                crossings.push(points[i]);
            }
        }

        for (i, pair) in sides.windows(2).enumerate() {
            if pair[0].is_opposite(pair[1]) {
                crossings.push(self.solve_bracket(curve, ts[i], ts[i + 1])?);
            }
        }

        debug!(crossings = crossings.len(), "Curve-plane intersection finished");
        Ok(crossings)
    }

    fn solve_bracket<C: Curve + ?Sized>(
        &self,
        curve: &C,
        t_start: f64,
        t_end: f64,
    ) -> Result<Point3> {
        let start = match self.tangent_hit(curve, t_start)? {
            Some(point) => point,
            None => self
                .tangent_hit(curve, t_end)?
                .ok_or(IntersectionError::NoInitialPoint { t_start, t_end })?,
        };

        refine_on_curve(curve, start, &self.params, |ortho| {
            let parameter = ortho.nearest_parameter;
            self.tangent_hit(curve, parameter)?
                .ok_or_else(|| IntersectionError::TangentParallelToPlane { parameter }.into())
        })
    }

    /// Where the tangent line at `t` meets the plane, if it does.
    fn tangent_hit<C: Curve + ?Sized>(&self, curve: &C, t: f64) -> Result<Option<Point3>> {
        let point = curve.evaluate(t)?;
        let tangent = curve.tangent(t)?;
        Ok(Line::new(point, tangent)
            .ok()
            .and_then(|line| self.plane.intersect_with_line(&line)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ParaqueryError;
    use crate::geometry::curve::{Circle, CurveDomain};
    use crate::math::Vector3;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn plane(normal: Vector3, d: f64) -> Plane {
        Plane::new(normal, d).unwrap()
    }

    /// `(t, t^3, 0)` on `[-1, 1]`. Crosses `y = 0` at the origin with a
    /// horizontal tangent.
    struct Cubic;

    impl Curve for Cubic {
        fn evaluate(&self, t: f64) -> Result<Point3> {
            Ok(Point3::new(t, t.powi(3), 0.0))
        }

        fn tangent(&self, t: f64) -> Result<Vector3> {
            Ok(Vector3::new(1.0, 3.0 * t * t, 0.0))
        }

        fn domain(&self) -> CurveDomain {
            CurveDomain::new(-1.0, 1.0)
        }
    }

    #[test]
    fn segment_crosses_plane_once() {
        let segment =
            Line::segment(Point3::new(0.0, -1.0, 0.0), Point3::new(2.0, 3.0, 1.0)).unwrap();
        let crossings = CurvePlaneIntersect::new(plane(Vector3::y(), 0.0))
            .execute(&segment)
            .unwrap();
        assert_eq!(crossings.len(), 1);
        assert_relative_eq!(crossings[0], Point3::new(0.5, 0.0, 0.25), epsilon = 1e-9);
    }

    #[test]
    fn circle_crosses_plane_twice() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let mut crossings = CurvePlaneIntersect::new(plane(Vector3::x(), -0.5))
            .execute(&circle)
            .unwrap();
        assert_eq!(crossings.len(), 2);
        crossings.sort_by(|a, b| a.y.total_cmp(&b.y));
        let h = 0.75_f64.sqrt();
        assert_relative_eq!(crossings[0], Point3::new(0.5, -h, 0.0), epsilon = 1e-3);
        assert_relative_eq!(crossings[1], Point3::new(0.5, h, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn sample_on_plane_is_reported_directly() {
        let segment =
            Line::segment(Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0)).unwrap();
        let crossings = CurvePlaneIntersect::new(plane(Vector3::y(), 0.0))
            .with_params(IntersectionParams {
                init_samples: 3,
                ..IntersectionParams::default()
            })
            .execute(&segment)
            .unwrap();
        assert_eq!(crossings, vec![Point3::origin()]);
    }

    #[test]
    fn curve_in_plane_has_no_crossings() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let crossings = CurvePlaneIntersect::new(plane(Vector3::z(), 0.0))
            .execute(&circle)
            .unwrap();
        assert!(crossings.is_empty());
    }

    #[test]
    fn curve_beside_plane_has_no_crossings() {
        let segment =
            Line::segment(Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 2.0, 0.0)).unwrap();
        let crossings = CurvePlaneIntersect::new(plane(Vector3::y(), 0.0))
            .execute(&segment)
            .unwrap();
        assert!(crossings.is_empty());
    }

    #[test]
    fn too_few_samples_is_rejected() {
        let segment = Line::segment(Point3::origin(), Point3::new(1.0, 0.0, 0.0)).unwrap();
        let err = CurvePlaneIntersect::new(plane(Vector3::x(), -0.5))
            .with_params(IntersectionParams {
                init_samples: 1,
                ..IntersectionParams::default()
            })
            .execute(&segment)
            .unwrap_err();
        assert!(matches!(
            err,
            ParaqueryError::Operation(OperationError::InvalidInput(_))
        ));
    }

    #[test]
    fn iteration_cap_is_reported() {
        let circle = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x()).unwrap();
        let err = CurvePlaneIntersect::new(plane(Vector3::x(), -0.5))
            .with_params(IntersectionParams {
                tolerance: 1e-12,
                max_iterations: 1,
                ..IntersectionParams::default()
            })
            .execute(&circle)
            .unwrap_err();
        let ParaqueryError::Intersection(IntersectionError::MaxIterationsExceeded {
            previous,
            last,
            step,
        }) = err
        else {
            panic!("unexpected error: {err}");
        };
        assert_relative_eq!(previous.coords.norm(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(last.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(step, (last - previous).norm(), epsilon = 1e-12);
        assert_relative_eq!(step, 0.043, epsilon = 1e-3);
    }

    #[test]
    fn bracket_with_parallel_tangents_has_no_start() {
        // Both arc ends have tangents along x, parallel to y = 0.
        let arc = Circle::new(Point3::origin(), 1.0, Vector3::z(), Vector3::x())
            .unwrap()
            .with_sweep(FRAC_PI_2, 3.0 * FRAC_PI_2)
            .unwrap();
        let err = CurvePlaneIntersect::new(plane(Vector3::y(), 0.0))
            .with_params(IntersectionParams {
                init_samples: 2,
                ..IntersectionParams::default()
            })
            .execute(&arc)
            .unwrap_err();
        let ParaqueryError::Intersection(IntersectionError::NoInitialPoint { t_start, t_end }) = err
        else {
            panic!("unexpected error: {err}");
        };
        assert_relative_eq!(t_start, FRAC_PI_2);
        assert_relative_eq!(t_end, 3.0 * FRAC_PI_2);
    }

    #[test]
    fn flat_crossing_stalls_on_parallel_tangent() {
        // Tangent steps approach the triple root one third at a time until
        // the tangent lies in the plane.
        let err = CurvePlaneIntersect::new(plane(Vector3::y(), 0.0))
            .with_params(IntersectionParams {
                init_samples: 2,
                tolerance: 0.0,
                max_iterations: 200,
                ..IntersectionParams::default()
            })
            .execute(&Cubic)
            .unwrap_err();
        let ParaqueryError::Intersection(IntersectionError::TangentParallelToPlane { parameter }) =
            err
        else {
            panic!("unexpected error: {err}");
        };
        assert!(parameter.abs() < 1e-5);
    }
}
