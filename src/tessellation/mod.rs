pub mod contour;
pub mod grid;

pub use contour::find_contours;
pub use grid::{QuadFace, SampleGrid};
