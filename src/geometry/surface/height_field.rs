use std::fmt;

use crate::error::Result;
use crate::math::Point3;

use super::{Surface, SurfaceDomain};

/// An explicit surface `z = f(x, y)` with `u = x` and `v = y`.
///
/// Wraps any scalar function, e.g. an interpolant evaluated elsewhere.
/// Derivatives come from the finite-difference default of [`Surface`].
pub struct HeightField<F> {
    height: F,
    domain: SurfaceDomain,
}

impl<F> HeightField<F>
where
    F: Fn(f64, f64) -> f64,
{
    /// Creates a height field over `domain`.
    #[must_use]
    pub fn new(height: F, domain: SurfaceDomain) -> Self {
        Self { height, domain }
    }
}

impl<F> fmt::Debug for HeightField<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightField")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl<F> Surface for HeightField<F>
where
    F: Fn(f64, f64) -> f64,
{
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(Point3::new(u, v, (self.height)(u, v)))
    }

    fn domain(&self) -> SurfaceDomain {
        self.domain
    }
}
