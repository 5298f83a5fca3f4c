mod bvh;

use tracing::{debug, trace};

use crate::error::{GeometryError, ParaqueryError, RaycastError, Result};
use crate::geometry::surface::Surface;
use crate::math::root_system::{NonlinearSystem, SolverMethod, SystemSolver};
use crate::math::{Matrix3, Point2, Point3, Vector3, TOLERANCE};
use crate::tessellation::{QuadFace, SampleGrid};

use bvh::{ray_triangle, Aabb, Bvh};

/// A half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Point3,
    /// Direction; normalized by the raycaster before use.
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }
}

/// What to do with a ray whose coarse mesh query misses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitFailPolicy {
    /// Leave the ray out of the hits.
    #[default]
    Skip,
    /// Fail the whole batch with [`RaycastError::NoInitialGuess`].
    Fail,
    /// Abandon the batch and return `Ok(None)`.
    ReturnNone,
}

/// Options for [`SurfaceRaycaster::raycast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaycastOptions {
    /// Refine coarse hits with a nonlinear solve.
    pub precise: bool,
    /// Solver used for refinement.
    pub method: SolverMethod,
    /// Handling of rays that miss the coarse mesh.
    pub on_init_fail: InitFailPolicy,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            precise: true,
            method: SolverMethod::default(),
            on_init_fail: InitFailPolicy::default(),
        }
    }
}

impl RaycastOptions {
    /// Sets the init-fail policy.
    #[must_use]
    pub fn with_on_init_fail(mut self, policy: InitFailPolicy) -> Self {
        self.on_init_fail = policy;
        self
    }

    /// Enables or disables refinement.
    #[must_use]
    pub fn with_precise(mut self, precise: bool) -> Self {
        self.precise = precise;
        self
    }

    /// Sets the refinement solver.
    #[must_use]
    pub fn with_method(mut self, method: SolverMethod) -> Self {
        self.method = method;
        self
    }
}

/// Coarse hit of a ray on the sampled mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastGuess {
    /// `u` at the centre of the face that was hit.
    pub u: f64,
    /// `v` at the centre of the face that was hit.
    pub v: f64,
    /// Distance along the normalized ray.
    pub t: f64,
    /// Hit point on the mesh.
    pub point: Point3,
}

/// Final hit of one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Index of the ray in the input batch.
    pub ray_index: usize,
    /// The coarse hit the result started from.
    pub guess: RaycastGuess,
    /// Surface `u` parameter.
    pub u: f64,
    /// Surface `v` parameter.
    pub v: f64,
    /// Distance along the normalized ray.
    pub t: f64,
    /// Hit point on the surface.
    pub point: Point3,
}

/// Result of a raycast batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaycastResult {
    /// Coarse hit per input ray; `None` where the mesh was missed.
    pub guesses: Vec<Option<RaycastGuess>>,
    /// Hits in input order. Skipped rays are absent.
    pub hits: Vec<RaycastHit>,
}

#[derive(Debug, Clone)]
struct RaycastState {
    grid: SampleGrid,
    quads: Vec<QuadFace>,
    bvh: Bvh,
}

/// Casts rays onto a surface.
///
/// A coarse hit comes from a BVH over a quad mesh sampled from the surface.
/// The exact parameters then come from solving
/// `surface(u, v) - (origin + t * direction) = 0` for `(u, v, t)`.
///
/// Construct with [`SurfaceRaycaster::new`], sample the surface once with
/// [`SurfaceRaycaster::init`], then cast any number of batches.
#[derive(Debug)]
pub struct SurfaceRaycaster<'a, S: ?Sized> {
    surface: &'a S,
    state: Option<RaycastState>,
}

impl<'a, S: Surface + ?Sized> SurfaceRaycaster<'a, S> {
    /// Creates an uninitialized raycaster.
    #[must_use]
    pub fn new(surface: &'a S) -> Self {
        Self {
            surface,
            state: None,
        }
    }

    /// Creates a raycaster and initializes it with `samples x samples` grid.
    ///
    /// # Errors
    ///
    /// See [`SurfaceRaycaster::init`].
    pub fn build(surface: &'a S, samples: usize) -> Result<Self> {
        let mut raycaster = Self::new(surface);
        raycaster.init(samples)?;
        Ok(raycaster)
    }

    /// Samples the surface on a `samples x samples` grid and builds the BVH
    /// over its quads, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns an error if `samples < 2`, the domain is unbounded, or the
    /// surface cannot be evaluated.
    pub fn init(&mut self, samples: usize) -> Result<()> {
        let grid = SampleGrid::new(self.surface, samples, samples)?;
        let quads = grid.quads();
        let bboxes = quads
            .iter()
            .map(|q| Aabb::from_points(&q.vertices.map(|i| grid.points()[i])))
            .collect::<Option<Vec<_>>>();
        let bvh = bboxes
            .as_deref()
            .and_then(Bvh::build)
            .ok_or_else(|| GeometryError::Degenerate("raycast mesh has no faces".into()))?;
        debug!(samples, faces = quads.len(), "Built raycast BVH");
        self.state = Some(RaycastState { grid, quads, bvh });
        Ok(())
    }

    /// Returns whether [`SurfaceRaycaster::init`] has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Grid resolution of the current state.
    #[must_use]
    pub fn samples(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.grid.n_u())
    }

    /// Parameters `(u, v)` of the grid sample nearest to `point`, or `None`
    /// before `init`.
    #[must_use]
    pub fn nearest_sample(&self, point: &Point3) -> Option<Point2> {
        let state = self.state.as_ref()?;
        let grid = &state.grid;
        let (index, _) = grid
            .points()
            .iter()
            .map(|p| (p - point).norm_squared())
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(grid.parameters(index / grid.n_v(), index % grid.n_v()))
    }

    /// Casts a batch of rays.
    ///
    /// Returns `Ok(None)` only under [`InitFailPolicy::ReturnNone`] when some
    /// ray misses the coarse mesh.
    ///
    /// # Errors
    ///
    /// Returns [`RaycastError::NotInitialized`] before `init`,
    /// [`GeometryError::ZeroVector`] for a ray without direction,
    /// [`RaycastError::NoInitialGuess`] under [`InitFailPolicy::Fail`], and
    /// [`RaycastError::RefinementFailure`] when the solver does not converge.
    pub fn raycast(&self, rays: &[Ray], options: &RaycastOptions) -> Result<Option<RaycastResult>> {
        let state = self.state.as_ref().ok_or(RaycastError::NotInitialized)?;

        let unit_rays = rays
            .iter()
            .map(|ray| {
                let len = ray.direction.norm();
                if len < TOLERANCE {
                    Err(GeometryError::ZeroVector.into())
                } else {
                    Ok(Ray::new(ray.origin, ray.direction / len))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let guesses: Vec<Option<RaycastGuess>> =
            unit_rays.iter().map(|ray| coarse_hit(state, ray)).collect();

        let mut hits = Vec::with_capacity(rays.len());
        for (ray_index, (ray, guess)) in unit_rays.iter().zip(&guesses).enumerate() {
            let Some(guess) = *guess else {
                match options.on_init_fail {
                    InitFailPolicy::Skip => {
                        trace!(ray_index, "Skipping ray without initial guess");
                        continue;
                    }
                    InitFailPolicy::Fail => {
                        return Err(RaycastError::NoInitialGuess { origin: ray.origin }.into());
                    }
                    InitFailPolicy::ReturnNone => return Ok(None),
                }
            };

            let hit = if options.precise {
                let (u, v, t) = self.refine(ray, &guess, options.method)?;
                RaycastHit {
                    ray_index,
                    guess,
                    u,
                    v,
                    t,
                    point: self.surface.evaluate(u, v)?,
                }
            } else {
                RaycastHit {
                    ray_index,
                    guess,
                    u: guess.u,
                    v: guess.v,
                    t: guess.t,
                    point: guess.point,
                }
            };
            hits.push(hit);
        }

        Ok(Some(RaycastResult { guesses, hits }))
    }

    fn refine(
        &self,
        ray: &Ray,
        guess: &RaycastGuess,
        method: SolverMethod,
    ) -> Result<(f64, f64, f64)> {
        let goal = RayGoal {
            surface: self.surface,
            ray,
        };
        let x0 = Vector3::new(guess.u, guess.v, guess.t);
        match SystemSolver::new(method).solve(&goal, x0) {
            Ok(solution) => Ok((solution.x[0], solution.x[1], solution.x[2])),
            Err(ParaqueryError::Solver(err)) => Err(RaycastError::RefinementFailure {
                origin: ray.origin,
                message: err.to_string(),
            }
            .into()),
            Err(err) => Err(err),
        }
    }
}

/// Nearest mesh hit of a unit-direction ray, reported at the face centre.
fn coarse_hit(state: &RaycastState, ray: &Ray) -> Option<RaycastGuess> {
    let points = state.grid.points();
    let (face, t) = state.bvh.nearest_hit(&ray.origin, &ray.direction, |i| {
        let [a, b, c, d] = state.quads[i].vertices.map(|k| &points[k]);
        let first = ray_triangle(&ray.origin, &ray.direction, a, b, c);
        let second = ray_triangle(&ray.origin, &ray.direction, a, c, d);
        match (first, second) {
            (Some(t0), Some(t1)) => Some(t0.min(t1)),
            (t0, t1) => t0.or(t1),
        }
    })?;
    let center = state.quads[face].center;
    Some(RaycastGuess {
        u: center.x,
        v: center.y,
        t,
        point: ray.origin + ray.direction * t,
    })
}

/// `F(u, v, t) = surface(u, v) - (origin + t * direction)`.
struct RayGoal<'s, S: ?Sized> {
    surface: &'s S,
    ray: &'s Ray,
}

impl<S: Surface + ?Sized> NonlinearSystem for RayGoal<'_, S> {
    fn residual(&self, x: &Vector3) -> Result<Vector3> {
        let on_surface = self.surface.evaluate(x[0], x[1])?;
        let on_ray = self.ray.origin + self.ray.direction * x[2];
        Ok(on_surface - on_ray)
    }

    fn jacobian(&self, x: &Vector3) -> Result<Matrix3> {
        let (su, sv) = self.surface.derivatives(x[0], x[1])?;
        Ok(Matrix3::from_columns(&[su, sv, -self.ray.direction]))
    }
}
