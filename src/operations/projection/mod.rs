mod curve;
mod surface;

pub use curve::{CurveProjection, ProjectPointOnCurve};
pub use surface::{ProjectPointOnSurface, SurfacePoint};
