mod cylinder;
mod height_field;
mod planar_patch;
mod sphere;

pub use cylinder::Cylinder;
pub use height_field::HeightField;
pub use planar_patch::PlanarPatch;
pub use sphere::Sphere;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};

/// Relative step used by the finite-difference fallback of
/// [`Surface::derivatives`].
const DERIVATIVE_STEP: f64 = 1e-6;

/// Parameter domain for a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDomain {
    /// Start of the U parameter range.
    pub u_min: f64,
    /// End of the U parameter range.
    pub u_max: f64,
    /// Start of the V parameter range.
    pub v_min: f64,
    /// End of the V parameter range.
    pub v_max: f64,
}

impl SurfaceDomain {
    /// Creates a new surface domain.
    #[must_use]
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// Returns whether all four bounds are finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        [self.u_min, self.u_max, self.v_min, self.v_max]
            .iter()
            .all(|b| b.is_finite())
    }

    /// Returns the domain if it is bounded.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnboundedDomain`] if any bound is infinite.
    pub fn bounded(self) -> Result<Self> {
        if self.is_bounded() {
            Ok(self)
        } else {
            Err(GeometryError::UnboundedDomain.into())
        }
    }

    /// Returns the parametric centre `(u, v)` of the domain.
    #[must_use]
    pub fn midpoint(&self) -> (f64, f64) {
        (
            0.5 * (self.u_min + self.u_max),
            0.5 * (self.v_min + self.v_max),
        )
    }
}

/// Trait for parametric surfaces in 3D space.
///
/// Queries treat implementors as black boxes: only evaluation, first
/// derivatives and the parameter domain are ever used.
pub trait Surface {
    /// Evaluates the surface at parameters `(u, v)`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3>;

    /// Evaluates the surface at every pair `(us[i], vs[i])`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MismatchedLengths`] if the slices differ in
    /// length, or the first evaluation error.
    fn evaluate_array(&self, us: &[f64], vs: &[f64]) -> Result<Vec<Point3>> {
        if us.len() != vs.len() {
            return Err(GeometryError::MismatchedLengths {
                us: us.len(),
                vs: vs.len(),
            }
            .into());
        }
        us.iter()
            .zip(vs)
            .map(|(&u, &v)| self.evaluate(u, v))
            .collect()
    }

    /// Computes the partial derivatives `(dS/du, dS/dv)` at `(u, v)`.
    ///
    /// The default uses central differences.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be evaluated around `(u, v)`.
    fn derivatives(&self, u: f64, v: f64) -> Result<(Vector3, Vector3)> {
        let hu = DERIVATIVE_STEP * u.abs().max(1.0);
        let hv = DERIVATIVE_STEP * v.abs().max(1.0);
        let du = (self.evaluate(u + hu, v)? - self.evaluate(u - hu, v)?) / (2.0 * hu);
        let dv = (self.evaluate(u, v + hv)? - self.evaluate(u, v - hv)?) / (2.0 * hv);
        Ok((du, dv))
    }

    /// Returns the parameter domain of the surface.
    fn domain(&self) -> SurfaceDomain;
}

impl<S: Surface + ?Sized> Surface for &S {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        (**self).evaluate(u, v)
    }

    fn evaluate_array(&self, us: &[f64], vs: &[f64]) -> Result<Vec<Point3>> {
        (**self).evaluate_array(us, vs)
    }

    fn derivatives(&self, u: f64, v: f64) -> Result<(Vector3, Vector3)> {
        (**self).derivatives(u, v)
    }

    fn domain(&self) -> SurfaceDomain {
        (**self).domain()
    }
}
