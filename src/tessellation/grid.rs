use crate::error::{OperationError, Result};
use crate::geometry::surface::Surface;
use crate::math::{linspace, Point2, Point3};

/// A quadrilateral cell of a [`SampleGrid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadFace {
    /// Indices into [`SampleGrid::points`], counter-clockwise in `(u, v)`.
    pub vertices: [usize; 4],
    /// Parametric centre `(u, v)` of the cell.
    pub center: Point2,
}

/// A regular `n_u x n_v` sampling of a surface over its whole domain.
///
/// Samples are stored `u`-major: the sample at `(iu, iv)` lives at index
/// `iu * n_v + iv`. Grid lines are evenly spaced and include both ends of
/// each parameter range.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    us: Vec<f64>,
    vs: Vec<f64>,
    points: Vec<Point3>,
}

impl SampleGrid {
    /// Samples `surface` on an `n_u x n_v` grid.
    ///
    /// # Errors
    ///
    /// Returns an error if either count is below 2, the surface domain is
    /// unbounded, or evaluation fails.
    pub fn new<S: Surface + ?Sized>(surface: &S, n_u: usize, n_v: usize) -> Result<Self> {
        if n_u < 2 || n_v < 2 {
            return Err(OperationError::InvalidInput(format!(
                "sample grid needs at least 2x2 samples, got {n_u}x{n_v}"
            ))
            .into());
        }
        let domain = surface.domain().bounded()?;
        let us = linspace(domain.u_min, domain.u_max, n_u);
        let vs = linspace(domain.v_min, domain.v_max, n_v);

        let mut flat_us = Vec::with_capacity(n_u * n_v);
        let mut flat_vs = Vec::with_capacity(n_u * n_v);
        for &u in &us {
            for &v in &vs {
                flat_us.push(u);
                flat_vs.push(v);
            }
        }
        let points = surface.evaluate_array(&flat_us, &flat_vs)?;

        Ok(Self { us, vs, points })
    }

    /// Number of samples along `u`.
    #[must_use]
    pub fn n_u(&self) -> usize {
        self.us.len()
    }

    /// Number of samples along `v`.
    #[must_use]
    pub fn n_v(&self) -> usize {
        self.vs.len()
    }

    /// All sampled points in `u`-major order.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Flat index of the sample at `(iu, iv)`.
    #[must_use]
    pub fn index(&self, iu: usize, iv: usize) -> usize {
        iu * self.vs.len() + iv
    }

    /// The `(u, v)` parameters of the sample at `(iu, iv)`.
    #[must_use]
    pub fn parameters(&self, iu: usize, iv: usize) -> Point2 {
        Point2::new(self.us[iu], self.vs[iv])
    }

    /// Connects the samples into `(n_u - 1) * (n_v - 1)` quadrilaterals.
    #[must_use]
    pub fn quads(&self) -> Vec<QuadFace> {
        let (n_u, n_v) = (self.n_u(), self.n_v());
        let mut faces = Vec::with_capacity((n_u - 1) * (n_v - 1));
        for iu in 0..n_u - 1 {
            for iv in 0..n_v - 1 {
                let p0 = self.parameters(iu, iv);
                let p2 = self.parameters(iu + 1, iv + 1);
                faces.push(QuadFace {
                    vertices: [
                        self.index(iu, iv),
                        self.index(iu + 1, iv),
                        self.index(iu + 1, iv + 1),
                        self.index(iu, iv + 1),
                    ],
                    center: nalgebra::center(&p0, &p2),
                });
            }
        }
        faces
    }
}
