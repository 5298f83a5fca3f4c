pub mod root_scalar;
pub mod root_system;

/// 2D point type, used for `(u, v)` parameter-space coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `num` evenly spaced values over the closed interval `[start, end]`.
///
/// The last value is exactly `end`. `num == 1` yields `[start]` and
/// `num == 0` yields an empty vector.
#[must_use]
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = (end - start) / (num - 1) as f64;
            (0..num)
                .map(|i| {
                    if i == num - 1 {
                        end
                    } else {
                        #[allow(clippy::cast_precision_loss)]
                        let offset = step * i as f64;
                        start + offset
                    }
                })
                .collect()
        }
    }
}
