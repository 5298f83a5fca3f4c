use crate::error::Result;
use crate::geometry::surface::Surface;
use crate::math::{Point3, Vector3};

use super::{Curve, CurveDomain};

/// Which surface parameter an [`IsoCurve`] holds fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoAxis {
    /// `u` is fixed; the curve parameter runs over `v`.
    U,
    /// `v` is fixed; the curve parameter runs over `u`.
    V,
}

impl IsoAxis {
    /// Returns the other axis.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::U => Self::V,
            Self::V => Self::U,
        }
    }
}

/// The curve traced on a surface by holding one parameter fixed.
#[derive(Debug)]
pub struct IsoCurve<'a, S: Surface + ?Sized> {
    surface: &'a S,
    axis: IsoAxis,
    value: f64,
}

impl<'a, S: Surface + ?Sized> IsoCurve<'a, S> {
    /// Creates the iso-curve of `surface` with `axis` fixed at `value`.
    #[must_use]
    pub fn new(surface: &'a S, axis: IsoAxis, value: f64) -> Self {
        Self {
            surface,
            axis,
            value,
        }
    }

    /// Maps a curve parameter to surface `(u, v)`.
    #[must_use]
    pub fn surface_parameters(&self, t: f64) -> (f64, f64) {
        match self.axis {
            IsoAxis::U => (self.value, t),
            IsoAxis::V => (t, self.value),
        }
    }
}

impl<S: Surface + ?Sized> Curve for IsoCurve<'_, S> {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let (u, v) = self.surface_parameters(t);
        self.surface.evaluate(u, v)
    }

    fn evaluate_array(&self, ts: &[f64]) -> Result<Vec<Point3>> {
        let fixed = vec![self.value; ts.len()];
        match self.axis {
            IsoAxis::U => self.surface.evaluate_array(&fixed, ts),
            IsoAxis::V => self.surface.evaluate_array(ts, &fixed),
        }
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        let (u, v) = self.surface_parameters(t);
        let (du, dv) = self.surface.derivatives(u, v)?;
        Ok(match self.axis {
            IsoAxis::U => dv,
            IsoAxis::V => du,
        })
    }

    fn domain(&self) -> CurveDomain {
        let d = self.surface.domain();
        match self.axis {
            IsoAxis::U => CurveDomain::new(d.v_min, d.v_max),
            IsoAxis::V => CurveDomain::new(d.u_min, d.u_max),
        }
    }
}
