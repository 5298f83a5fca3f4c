use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::curve::{IsoAxis, IsoCurve};
use crate::geometry::plane::Plane;
use crate::geometry::surface::Surface;
use crate::math::{linspace, Point2, Point3, TOLERANCE};
use crate::tessellation::{find_contours, SampleGrid};

use super::{CurvePlaneIntersect, IntersectionParams};

/// One ordered polyline of a surface-plane intersection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    /// Parameter-space vertices. Closed loops repeat the first vertex.
    pub uvs: Vec<Point2>,
    /// Surface points at `uvs`; empty when points were not requested.
    pub points: Vec<Point3>,
}

impl Contour {
    /// Whether the polyline ends where it starts.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.uvs.len() > 2 && self.uvs.first() == self.uvs.last()
    }
}

/// Surface-plane intersection by marching squares on a signed-distance grid.
///
/// Accuracy is that of linear interpolation on the sample grid; the result
/// is not refined onto the surface.
#[derive(Debug, Clone)]
pub struct SurfacePlaneContours {
    plane: Plane,
    samples_u: usize,
    samples_v: usize,
    with_points: bool,
}

impl SurfacePlaneContours {
    /// Creates a new intersection query against `plane`.
    #[must_use]
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            samples_u: 50,
            samples_v: 50,
            with_points: true,
        }
    }

    /// Sets the grid resolution.
    #[must_use]
    pub fn with_samples(mut self, samples_u: usize, samples_v: usize) -> Self {
        self.samples_u = samples_u;
        self.samples_v = samples_v;
        self
    }

    /// Sets whether 3D points are evaluated for each contour vertex.
    #[must_use]
    pub fn with_points(mut self, with_points: bool) -> Self {
        self.with_points = with_points;
        self
    }

    /// Executes the intersection.
    ///
    /// Returns no contours when the surface misses the plane or lies in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid cannot be built (fewer than 2 samples per
    /// direction, unbounded domain) or the surface fails to evaluate.
    pub fn execute<S: Surface + ?Sized>(&self, surface: &S) -> Result<Vec<Contour>> {
        let grid = SampleGrid::new(surface, self.samples_u, self.samples_v)?;
        let field: Vec<f64> = grid
            .points()
            .iter()
            .map(|p| {
                let d = self.plane.signed_distance(p);
                if d.abs() < TOLERANCE { 0.0 } else { d }
            })
            .collect();

        let domain = surface.domain();
        let to_uv = |index: Point2| {
            Point2::new(
                grid_parameter(domain.u_min, domain.u_max, grid.n_u(), index.x),
                grid_parameter(domain.v_min, domain.v_max, grid.n_v(), index.y),
            )
        };

        let contours = find_contours(&field, grid.n_u(), grid.n_v(), 0.0)?
            .into_iter()
            .map(|line| {
                let uvs: Vec<Point2> = line.into_iter().map(to_uv).collect();
                let points = if self.with_points {
                    uvs.iter()
                        .map(|uv| surface.evaluate(uv.x, uv.y))
                        .collect::<Result<_>>()?
                } else {
                    Vec::new()
                };
                Ok(Contour { uvs, points })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(contours = contours.len(), "Surface-plane contours traced");
        Ok(contours)
    }
}

/// Maps a fractional grid index to a parameter. Index `n - 1` lands on `max`.
#[allow(clippy::cast_precision_loss)]
fn grid_parameter(min: f64, max: f64, n: usize, index: f64) -> f64 {
    min + index * (max - min) / (n - 1) as f64
}

/// Surface-plane intersection by cutting iso-parametric curves.
///
/// Runs [`CurvePlaneIntersect`] on `samples_u` iso-`u` curves and `samples_v`
/// iso-`v` curves. The result is an unordered point cloud of exact
/// crossings.
#[derive(Debug, Clone)]
pub struct SurfacePlaneIsoCurves {
    plane: Plane,
    samples_u: usize,
    samples_v: usize,
    params: IntersectionParams,
}

impl SurfacePlaneIsoCurves {
    /// Creates a new intersection query against `plane`.
    #[must_use]
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            samples_u: 50,
            samples_v: 50,
            params: IntersectionParams::default(),
        }
    }

    /// Sets the number of iso-curves in each direction.
    #[must_use]
    pub fn with_samples(mut self, samples_u: usize, samples_v: usize) -> Self {
        self.samples_u = samples_u;
        self.samples_v = samples_v;
        self
    }

    /// Sets the parameters of each curve-plane intersection.
    #[must_use]
    pub fn with_params(mut self, params: IntersectionParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the intersection.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for fewer than two iso-curves
    /// in either direction, and propagates curve-plane intersection errors.
    pub fn execute<S: Surface + ?Sized>(&self, surface: &S) -> Result<Vec<Point3>> {
        if self.samples_u < 2 || self.samples_v < 2 {
            return Err(OperationError::InvalidInput(format!(
                "iso-curve intersection needs at least 2x2 curves, got {}x{}",
                self.samples_u, self.samples_v
            ))
            .into());
        }
        let domain = surface.domain().bounded()?;
        let query = CurvePlaneIntersect::new(self.plane).with_params(self.params);

        let mut points = Vec::new();
        for u in linspace(domain.u_min, domain.u_max, self.samples_u) {
            points.extend(query.execute(&IsoCurve::new(surface, IsoAxis::U, u))?);
        }
        for v in linspace(domain.v_min, domain.v_max, self.samples_v) {
            points.extend(query.execute(&IsoCurve::new(surface, IsoAxis::V, v))?);
        }

        debug!(points = points.len(), "Surface-plane iso-curve crossings");
        Ok(points)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ParaqueryError;
    use crate::geometry::surface::{HeightField, PlanarPatch, SurfaceDomain};
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn square() -> SurfaceDomain {
        SurfaceDomain::new(-1.0, 1.0, -1.0, 1.0)
    }

    fn plane(normal: Vector3, d: f64) -> Plane {
        Plane::new(normal, d).unwrap()
    }

    #[test]
    fn patch_cut_by_vertical_plane() {
        let patch = PlanarPatch::horizontal(0.0, square());
        let cut = plane(Vector3::x(), -0.25);

        let contours = SurfacePlaneContours::new(cut).execute(&patch).unwrap();
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(contour.uvs.len(), 50);
        assert!(!contour.is_closed());
        for uv in &contour.uvs {
            assert_relative_eq!(uv.x, 0.25, epsilon = 1e-9);
        }
        let (lo, hi) = contour
            .uvs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), uv| (lo.min(uv.y), hi.max(uv.y)));
        assert_relative_eq!(lo, -1.0, epsilon = 1e-9);
        assert_relative_eq!(hi, 1.0, epsilon = 1e-9);
        for p in &contour.points {
            assert_relative_eq!(p.x, 0.25, epsilon = 1e-9);
        }

        let points = SurfacePlaneIsoCurves::new(cut).execute(&patch).unwrap();
        assert_eq!(points.len(), 50);
        for p in &points {
            assert_relative_eq!(p.x, 0.25, epsilon = 1e-6);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn paraboloid_level_set_is_closed_loop() {
        let bowl = HeightField::new(|x, y| x * x + y * y, square());
        let cut = plane(Vector3::z(), -0.25);

        let contours = SurfacePlaneContours::new(cut).execute(&bowl).unwrap();
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert!(contour.is_closed());
        for uv in &contour.uvs {
            assert_relative_eq!(uv.coords.norm(), 0.5, epsilon = 1e-2);
        }

        let points = SurfacePlaneIsoCurves::new(cut).execute(&bowl).unwrap();
        assert!(!points.is_empty());
        for p in &points {
            assert_relative_eq!(p.z, 0.25, epsilon = 1e-3);
        }
    }

    #[test]
    fn points_can_be_skipped() {
        let bowl = HeightField::new(|x, y| x * x + y * y, square());
        let contours = SurfacePlaneContours::new(plane(Vector3::z(), -0.25))
            .with_samples(20, 20)
            .with_points(false)
            .execute(&bowl)
            .unwrap();
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].uvs.is_empty());
        assert!(contours[0].points.is_empty());
    }

    #[test]
    fn plane_missing_surface_gives_nothing() {
        let patch = PlanarPatch::horizontal(0.0, square());
        let above = plane(Vector3::z(), -1.0);
        assert!(SurfacePlaneContours::new(above).execute(&patch).unwrap().is_empty());
        assert!(SurfacePlaneIsoCurves::new(above).execute(&patch).unwrap().is_empty());
    }

    #[test]
    fn coincident_plane_gives_nothing() {
        let patch = PlanarPatch::horizontal(0.0, square());
        let same = plane(Vector3::z(), 0.0);
        assert!(SurfacePlaneContours::new(same).execute(&patch).unwrap().is_empty());
        assert!(SurfacePlaneIsoCurves::new(same).execute(&patch).unwrap().is_empty());
    }

    #[test]
    fn too_few_iso_curves_is_rejected() {
        let patch = PlanarPatch::horizontal(0.0, square());
        let err = SurfacePlaneIsoCurves::new(plane(Vector3::x(), 0.0))
            .with_samples(1, 10)
            .execute(&patch)
            .unwrap_err();
        assert!(matches!(
            err,
            ParaqueryError::Operation(OperationError::InvalidInput(_))
        ));
    }
}
