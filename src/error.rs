use thiserror::Error;

use crate::math::{Point3, Vector3};

/// Top-level error type for the paraquery kernel.
#[derive(Debug, Error)]
pub enum ParaqueryError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Raycast(#[from] RaycastError),

    #[error(transparent)]
    Intersection(#[from] IntersectionError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("parameter domain is unbounded")]
    UnboundedDomain,

    #[error("parameter arrays differ in length: {us} u values, {vs} v values")]
    MismatchedLengths { us: usize, vs: usize },
}

/// Errors related to invalid query setup.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors reported by the numeric root finders.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("f(a) and f(b) must have different signs (a = {a}, b = {b})")]
    InvalidBracket { a: f64, b: f64 },

    #[error("solver did not converge after {iterations} iterations: {message}")]
    NotConverged { iterations: usize, message: String },
}

/// Errors related to orthogonal projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("no orthogonal projection of {point} found at the given sample density")]
    NoProjectionFound { point: Point3 },

    #[error("projection did not converge after {iterations} iterations (last step {step})")]
    ConvergenceFailure { iterations: usize, step: f64 },
}

/// Errors related to surface raycasting.
#[derive(Debug, Error)]
pub enum RaycastError {
    #[error("raycaster is not initialized; call init() first")]
    NotInitialized,

    #[error("no initial guess for the ray from {origin}")]
    NoInitialGuess { origin: Point3 },

    #[error("cannot refine the ray hit from {origin}: {message}")]
    RefinementFailure { origin: Point3, message: String },
}

/// Errors related to curve and surface intersection.
#[derive(Debug, Error)]
pub enum IntersectionError {
    #[error("no initial raycast point found for the curve-surface intersection")]
    NoInitialGuess,

    #[error("no initial point found for the crossing in [{t_start}, {t_end}]")]
    NoInitialPoint { t_start: f64, t_end: f64 },

    #[error("maximum number of iterations exceeded; last step {previous} - {last} = {step}")]
    MaxIterationsExceeded {
        previous: Point3,
        last: Point3,
        step: f64,
    },

    #[error("raycast from {point} along {direction} missed the surface")]
    RaycastMissed { point: Point3, direction: Vector3 },

    #[error("tangent line at t = {parameter} is parallel to the plane")]
    TangentParallelToPlane { parameter: f64 },
}

/// Convenience type alias for results using [`ParaqueryError`].
pub type Result<T> = std::result::Result<T, ParaqueryError>;
