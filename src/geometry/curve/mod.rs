mod circle;
mod iso_curve;
mod line;

pub use circle::Circle;
pub use iso_curve::{IsoAxis, IsoCurve};
pub use line::Line;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};

/// Parameter domain for a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDomain {
    /// Start of the parameter range.
    pub t_min: f64,
    /// End of the parameter range.
    pub t_max: f64,
}

impl CurveDomain {
    /// Creates a new curve domain.
    #[must_use]
    pub fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }

    /// Returns whether both ends of the domain are finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.t_min.is_finite() && self.t_max.is_finite()
    }

    /// Returns the domain if it is bounded.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnboundedDomain`] if either end is infinite.
    pub fn bounded(self) -> Result<Self> {
        if self.is_bounded() {
            Ok(self)
        } else {
            Err(GeometryError::UnboundedDomain.into())
        }
    }
}

/// Trait for parametric curves in 3D space.
///
/// Queries treat implementors as black boxes: only evaluation, tangents and
/// the parameter domain are ever used.
pub trait Curve {
    /// Evaluates the curve at parameter `t`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, t: f64) -> Result<Point3>;

    /// Evaluates the curve at every parameter in `ts`.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    fn evaluate_array(&self, ts: &[f64]) -> Result<Vec<Point3>> {
        ts.iter().map(|&t| self.evaluate(t)).collect()
    }

    /// Computes the tangent vector at parameter `t`.
    ///
    /// The magnitude is unspecified; callers normalize when they need to.
    ///
    /// # Errors
    ///
    /// Returns an error if the tangent cannot be evaluated.
    fn tangent(&self, t: f64) -> Result<Vector3>;

    /// Returns the parameter domain of the curve.
    fn domain(&self) -> CurveDomain;
}

impl<C: Curve + ?Sized> Curve for &C {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        (**self).evaluate(t)
    }

    fn evaluate_array(&self, ts: &[f64]) -> Result<Vec<Point3>> {
        (**self).evaluate_array(ts)
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        (**self).tangent(t)
    }

    fn domain(&self) -> CurveDomain {
        (**self).domain()
    }
}
