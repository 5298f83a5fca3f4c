use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::curve::Line;

/// Which side of a [`Plane`] a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Opposite the normal.
    Negative,
    /// On the plane (within tolerance).
    On,
    /// In the direction of the normal.
    Positive,
}

impl Side {
    /// Returns whether `self` and `other` lie strictly on opposite sides.
    #[must_use]
    pub fn is_opposite(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Negative, Self::Positive) | (Self::Positive, Self::Negative)
        )
    }
}

/// An infinite cutting plane `normal . p + d = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3,
    d: f64,
}

impl Plane {
    /// Creates the plane `normal . p + d = 0`.
    ///
    /// The normal is normalized and `d` rescaled accordingly, so
    /// [`Plane::signed_distance`] is a true distance.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn new(normal: Vector3, d: f64) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            normal: normal / len,
            d: d / len,
        })
    }

    /// Creates the plane through `point` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn from_point_normal(point: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            d: -normal.dot(&point.coords),
        })
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the offset `d`.
    #[must_use]
    pub fn d(&self) -> f64 {
        self.d
    }

    /// Signed distance from `point`. Positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) + self.d
    }

    /// Classifies a point relative to the plane.
    #[must_use]
    pub fn side_of_point(&self, point: &Point3) -> Side {
        let dist = self.signed_distance(point);
        if dist > TOLERANCE {
            Side::Positive
        } else if dist < -TOLERANCE {
            Side::Negative
        } else {
            Side::On
        }
    }

    /// Classifies every point in `points`.
    #[must_use]
    pub fn side_of_points(&self, points: &[Point3]) -> Vec<Side> {
        points.iter().map(|p| self.side_of_point(p)).collect()
    }

    /// Intersects the plane with the infinite extension of `line`.
    ///
    /// Returns `None` when the line is parallel to the plane.
    #[must_use]
    pub fn intersect_with_line(&self, line: &Line) -> Option<Point3> {
        let denom = self.normal.dot(line.direction());
        if denom.abs() < TOLERANCE {
            return None;
        }
        let t = -self.signed_distance(line.origin()) / denom;
        Some(line.origin() + line.direction() * t)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_normalizes_and_rescales() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 2.0), -4.0).unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::z());
        assert_relative_eq!(plane.d(), -2.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(5.0, 1.0, 3.0)), 1.0);
    }

    #[test]
    fn from_point_normal_passes_through_point() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let plane = Plane::from_point_normal(p, Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(plane.signed_distance(&p), 0.0, epsilon = 1e-12);
        assert!(Plane::from_point_normal(p, Vector3::zeros()).is_err());
    }

    #[test]
    fn classifies_points() {
        let plane = Plane::new(Vector3::y(), 0.0).unwrap();
        let sides = plane.side_of_points(&[
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(3.0, 0.0, 1.0),
            Point3::new(0.0, 0.5, 0.0),
        ]);
        assert_eq!(sides, vec![Side::Negative, Side::On, Side::Positive]);
        assert!(Side::Negative.is_opposite(Side::Positive));
        assert!(!Side::On.is_opposite(Side::Positive));
    }

    #[test]
    fn intersects_line() {
        let plane = Plane::new(Vector3::z(), -1.0).unwrap();
        let line = Line::new(Point3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 1.0)).unwrap();
        let hit = plane.intersect_with_line(&line).unwrap();
        assert_relative_eq!(hit, Point3::new(2.0, 1.0, 1.0), epsilon = 1e-12);

        let parallel = Line::new(Point3::origin(), Vector3::x()).unwrap();
        assert!(plane.intersect_with_line(&parallel).is_none());
    }
}
