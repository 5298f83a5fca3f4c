use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::geometry::{positive_radius, unit_frame};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A circle in 3D space.
///
/// Defined by a center, radius, normal axis, and a reference direction
/// for the zero-angle. The parametric domain is `[0, 2*pi]` unless it is
/// narrowed to an arc with [`Circle::with_sweep`].
///
/// `P(t) = center + radius * cos(t) * ref_dir + radius * sin(t) * binormal`
/// where `binormal = normal x ref_dir`.
#[derive(Debug, Clone)]
pub struct Circle {
    center: Point3,
    radius: f64,
    normal: Vector3,
    ref_dir: Vector3,
    domain: CurveDomain,
}

impl Circle {
    /// Creates a new circle.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the circle
    /// * `radius` - Radius (must be positive)
    /// * `normal` - Normal vector defining the circle plane
    /// * `ref_dir` - Reference direction for angle = 0 (must be perpendicular to normal)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the normal is zero-length,
    /// or the reference direction is not perpendicular to the normal.
    pub fn new(
        center: Point3,
        radius: f64,
        normal: Vector3,
        ref_dir: Vector3,
    ) -> Result<Self> {
        positive_radius(radius, "circle")?;
        let (normal, ref_dir) = unit_frame(normal, ref_dir, "circle")?;

        Ok(Self {
            center,
            radius,
            normal,
            ref_dir,
            domain: CurveDomain::new(0.0, TAU),
        })
    }

    /// Restricts the circle to the arc between angles `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sweep is empty or exceeds a full turn.
    pub fn with_sweep(mut self, start: f64, end: f64) -> Result<Self> {
        let sweep = end - start;
        if sweep < TOLERANCE || sweep > TAU + TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "arc sweep {sweep} must lie in (0, 2*pi]"
            ))
            .into());
        }
        self.domain = CurveDomain::new(start, end);
        Ok(self)
    }

    /// Returns the center of the circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the circle.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Computes the binormal direction (`normal x ref_dir`).
    fn binormal(&self) -> Vector3 {
        self.normal.cross(&self.ref_dir)
    }
}

impl Curve for Circle {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let binormal = self.binormal();
        let x = self.radius * t.cos();
        let y = self.radius * t.sin();
        Ok(self.center + self.ref_dir * x + binormal * y)
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        let binormal = self.binormal();
        let dx = -self.radius * t.sin();
        let dy = self.radius * t.cos();
        let tangent = self.ref_dir * dx + binormal * dy;
        let len = tangent.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(tangent / len)
    }

    fn domain(&self) -> CurveDomain {
        self.domain
    }
}
