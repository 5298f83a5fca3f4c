pub mod curve;
pub mod plane;
pub mod surface;

pub use curve::{Circle, Curve, CurveDomain, IsoAxis, IsoCurve, Line};
pub use plane::{Plane, Side};
pub use surface::{Cylinder, HeightField, PlanarPatch, Sphere, Surface, SurfaceDomain};

use crate::error::{GeometryError, Result};
use crate::math::{Vector3, TOLERANCE};

/// Normalizes an axis and a reference direction perpendicular to it.
///
/// `what` names the shape in the error message.
pub(crate) fn unit_frame(
    axis: Vector3,
    ref_dir: Vector3,
    what: &str,
) -> Result<(Vector3, Vector3)> {
    let axis_len = axis.norm();
    let ref_len = ref_dir.norm();
    if axis_len < TOLERANCE || ref_len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    let axis = axis / axis_len;
    let ref_dir = ref_dir / ref_len;
    if axis.dot(&ref_dir).abs() > TOLERANCE {
        return Err(GeometryError::Degenerate(format!(
            "{what} reference direction must be perpendicular to its axis"
        ))
        .into());
    }
    Ok((axis, ref_dir))
}

/// Rejects radii that are not strictly positive.
pub(crate) fn positive_radius(radius: f64, what: &str) -> Result<()> {
    if radius < TOLERANCE {
        return Err(GeometryError::Degenerate(format!("{what} radius must be positive")).into());
    }
    Ok(())
}
