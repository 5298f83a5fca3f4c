use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A bounded piece of a plane.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir` with `(u, v)`
/// restricted to the given domain. The directions are normalized, so `u` and
/// `v` measure distance along them.
#[derive(Debug, Clone)]
pub struct PlanarPatch {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    domain: SurfaceDomain,
}

impl PlanarPatch {
    /// Creates a new patch from an origin, two directions and a domain.
    ///
    /// # Errors
    ///
    /// Returns an error if a direction is zero-length or the directions are
    /// parallel.
    pub fn new(
        origin: Point3,
        u_dir: Vector3,
        v_dir: Vector3,
        domain: SurfaceDomain,
    ) -> Result<Self> {
        let u_len = u_dir.norm();
        let v_len = v_dir.norm();
        if u_len < TOLERANCE || v_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;
        let v_dir = v_dir / v_len;

        if u_dir.cross(&v_dir).norm() < TOLERANCE {
            return Err(
                GeometryError::Degenerate("patch directions are parallel".into()).into(),
            );
        }

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            domain,
        })
    }

    /// The patch of the plane `z = height` with `u = x` and `v = y`.
    #[must_use]
    pub fn horizontal(height: f64, domain: SurfaceDomain) -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, height),
            u_dir: Vector3::x(),
            v_dir: Vector3::y(),
            domain,
        }
    }
}

impl Surface for PlanarPatch {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_dir * u + self.v_dir * v)
    }

    fn derivatives(&self, _u: f64, _v: f64) -> Result<(Vector3, Vector3)> {
        Ok((self.u_dir, self.v_dir))
    }

    fn domain(&self) -> SurfaceDomain {
        self.domain
    }
}
