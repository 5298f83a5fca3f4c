use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::geometry::{positive_radius, unit_frame};
use crate::math::{Point3, Vector3};

use super::{Surface, SurfaceDomain};

/// A cylindrical surface in 3D space.
///
/// `P(u, v) = center + radius * (cos(u) * ref_dir + sin(u) * binormal) + v * axis`
/// where `binormal = axis x ref_dir`. `u` runs over `[0, 2*pi]`; `v` is
/// unbounded until [`Cylinder::with_height`] restricts it.
#[derive(Debug, Clone)]
pub struct Cylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
    v_range: (f64, f64),
}

impl Cylinder {
    /// Creates an infinite cylinder around the axis through `center`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the axis is
    /// zero-length, or `ref_dir` is not perpendicular to the axis.
    pub fn new(center: Point3, radius: f64, axis: Vector3, ref_dir: Vector3) -> Result<Self> {
        positive_radius(radius, "cylinder")?;
        let (axis, ref_dir) = unit_frame(axis, ref_dir, "cylinder")?;
        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
            v_range: (f64::NEG_INFINITY, f64::INFINITY),
        })
    }

    /// Restricts the cylinder to `v_min <= v <= v_max` along the axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is empty.
    pub fn with_height(mut self, v_min: f64, v_max: f64) -> Result<Self> {
        if v_max <= v_min {
            return Err(GeometryError::Degenerate(format!(
                "cylinder height range [{v_min}, {v_max}] is empty"
            ))
            .into());
        }
        self.v_range = (v_min, v_max);
        Ok(self)
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn radial(&self, u: f64) -> Vector3 {
        let (su, cu) = u.sin_cos();
        self.ref_dir * cu + self.axis.cross(&self.ref_dir) * su
    }
}

impl Surface for Cylinder {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.center + self.radial(u) * self.radius + self.axis * v)
    }

    fn derivatives(&self, u: f64, _v: f64) -> Result<(Vector3, Vector3)> {
        let (su, cu) = u.sin_cos();
        let binormal = self.axis.cross(&self.ref_dir);
        Ok(((binormal * cu - self.ref_dir * su) * self.radius, self.axis))
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, TAU, self.v_range.0, self.v_range.1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn z_cylinder(radius: f64) -> Cylinder {
        Cylinder::new(Point3::origin(), radius, Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn evaluates_around_and_along_axis() {
        let c = z_cylinder(2.0);
        assert_relative_eq!(c.evaluate(0.0, 0.0).unwrap(), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(
            c.evaluate(FRAC_PI_2, 5.0).unwrap(),
            Point3::new(0.0, 2.0, 5.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn derivatives_are_tangent() {
        let c = z_cylinder(1.5);
        let (du, dv) = c.derivatives(0.0, 1.0).unwrap();
        assert_relative_eq!(du, Vector3::new(0.0, 1.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(dv, Vector3::z());
    }

    #[test]
    fn height_bounds_the_domain() {
        assert!(!z_cylinder(1.0).domain().is_bounded());
        let c = z_cylinder(1.0).with_height(-1.0, 3.0).unwrap();
        let d = c.domain();
        assert!(d.is_bounded());
        assert_relative_eq!(d.v_min, -1.0);
        assert_relative_eq!(d.v_max, 3.0);
        assert!(z_cylinder(1.0).with_height(2.0, 2.0).is_err());
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(Cylinder::new(Point3::origin(), -1.0, Vector3::z(), Vector3::x()).is_err());
        assert!(Cylinder::new(Point3::origin(), 1.0, Vector3::zeros(), Vector3::x()).is_err());
    }
}
