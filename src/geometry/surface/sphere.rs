use std::f64::consts::{FRAC_PI_2, TAU};

use crate::error::Result;
use crate::geometry::{positive_radius, unit_frame};
use crate::math::{Point3, Vector3};

use super::{Surface, SurfaceDomain};

/// A spherical surface in 3D space.
///
/// Defined by a center, radius, axis (north pole direction), and a
/// reference direction for the equator at u=0.
///
/// `P(u, v) = center + r * cos(v) * (cos(u) * ref_dir + sin(u) * binormal) + r * sin(v) * axis`
/// where `binormal = axis x ref_dir`.
///
/// Parameters: `u` = longitude `[0, 2*pi]`, `v` = latitude `[-pi/2, pi/2]`.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the sphere
    /// * `radius` - Radius (must be positive)
    /// * `axis` - North pole direction (will be normalized)
    /// * `ref_dir` - Equatorial reference direction for u=0 (must be perpendicular to axis)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, axis is zero-length,
    /// or the reference direction is not perpendicular to the axis.
    pub fn new(
        center: Point3,
        radius: f64,
        axis: Vector3,
        ref_dir: Vector3,
    ) -> Result<Self> {
        positive_radius(radius, "sphere")?;
        let (axis, ref_dir) = unit_frame(axis, ref_dir, "sphere")?;

        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
        })
    }

    /// Returns the center of the sphere.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Computes the binormal direction (`axis x ref_dir`).
    fn binormal(&self) -> Vector3 {
        self.axis.cross(&self.ref_dir)
    }
}

impl Surface for Sphere {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let binormal = self.binormal();
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        Ok(self.center
            + self.ref_dir * (self.radius * cv * cu)
            + binormal * (self.radius * cv * su)
            + self.axis * (self.radius * sv))
    }

    fn derivatives(&self, u: f64, v: f64) -> Result<(Vector3, Vector3)> {
        let binormal = self.binormal();
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        let du = (binormal * cu - self.ref_dir * su) * (self.radius * cv);
        let dv = (self.axis * cv - (self.ref_dir * cu + binormal * su) * sv) * self.radius;
        Ok((du, dv))
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, -FRAC_PI_2, FRAC_PI_2)
    }
}
