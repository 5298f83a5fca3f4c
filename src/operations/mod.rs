pub mod intersect;
pub mod projection;
pub mod raycast;

pub use intersect::{
    Contour, CurvePlaneIntersect, CurveSurfaceIntersect, IntersectionParams, SurfacePlaneContours,
    SurfacePlaneIsoCurves,
};
pub use projection::{CurveProjection, ProjectPointOnCurve, ProjectPointOnSurface, SurfacePoint};
pub use raycast::{
    InitFailPolicy, Ray, RaycastGuess, RaycastHit, RaycastOptions, RaycastResult, SurfaceRaycaster,
};
