use crate::math::{Point3, Vector3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing all `points`, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |bbox, p| Self {
                min: bbox.min.inf(p),
                max: bbox.max.sup(p),
            },
        ))
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Slab test of the ray `origin + t * dir` for `t` in `[0, t_max]`.
    #[must_use]
    pub fn hit_by(&self, origin: &Point3, dir: &Vector3, t_max: f64) -> bool {
        let mut t_near = 0.0_f64;
        let mut t_far = t_max;
        for axis in 0..3 {
            let (o, d) = (origin[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() <= f64::EPSILON {
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_far < t_near {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: Aabb,
    left: usize,
    right: usize,
    start: usize,
    count: usize,
}

impl BvhNode {
    fn is_leaf(&self) -> bool {
        self.count != 0
    }
}

/// Bounding volume hierarchy over arbitrary primitives, built by median
/// split along the axis of largest centroid spread.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<usize>,
}

impl Bvh {
    const LEAF_SIZE: usize = 4;

    /// Builds a hierarchy over the primitives bounded by `bboxes`.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn build(bboxes: &[Aabb]) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }
        let mut bvh = Self {
            nodes: Vec::with_capacity(bboxes.len() * 2),
            prim_indices: (0..bboxes.len()).collect(),
        };
        bvh.build_node(bboxes, 0, bboxes.len());
        Some(bvh)
    }

    fn build_node(&mut self, bboxes: &[Aabb], start: usize, end: usize) -> usize {
        let node_index = self.nodes.len();
        let bbox = self.prim_indices[start + 1..end]
            .iter()
            .fold(bboxes[self.prim_indices[start]], |acc, &i| acc.union(&bboxes[i]));
        self.nodes.push(BvhNode {
            bbox,
            left: 0,
            right: 0,
            start,
            count: end - start,
        });

        if end - start <= Self::LEAF_SIZE {
            return node_index;
        }

        let axis = Self::split_axis(bboxes, &self.prim_indices[start..end]);
        let mid = start + (end - start) / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            bboxes[a].center()[axis].total_cmp(&bboxes[b].center()[axis])
        });

        let left = self.build_node(bboxes, start, mid);
        let right = self.build_node(bboxes, mid, end);
        let node = &mut self.nodes[node_index];
        node.left = left;
        node.right = right;
        node.count = 0;
        node_index
    }

    fn split_axis(bboxes: &[Aabb], prims: &[usize]) -> usize {
        let centers: Vec<Point3> = prims.iter().map(|&i| bboxes[i].center()).collect();
        let Some(spread) = Aabb::from_points(&centers) else {
            return 0;
        };
        let extent = spread.max - spread.min;
        extent.imax()
    }

    /// Finds the primitive with the smallest ray parameter.
    ///
    /// `hit` returns the parameter `t >= 0` at which the ray meets a
    /// primitive, or `None`. Subtrees farther than the best hit so far are
    /// skipped.
    pub fn nearest_hit<F>(
        &self,
        origin: &Point3,
        dir: &Vector3,
        mut hit: F,
    ) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best: Option<(usize, f64)> = None;
        let mut stack = vec![0];

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            let t_max = best.map_or(f64::INFINITY, |(_, t)| t);
            if !node.bbox.hit_by(origin, dir, t_max) {
                continue;
            }
            if node.is_leaf() {
                for &prim in &self.prim_indices[node.start..node.start + node.count] {
                    if let Some(t) = hit(prim) {
                        if t < best.map_or(f64::INFINITY, |(_, b)| b) {
                            best = Some((prim, t));
                        }
                    }
                }
                continue;
            }
            stack.push(node.left);
            stack.push(node.right);
        }

        best
    }
}

/// Ray-triangle intersection (Moller-Trumbore).
///
/// Returns the ray parameter of the hit if it is non-negative. Barycentric
/// bounds are widened slightly so rays through a shared edge are not lost
/// between the two triangles.
#[must_use]
pub fn ray_triangle(
    origin: &Point3,
    dir: &Vector3,
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
) -> Option<f64> {
    const PARALLEL: f64 = 1e-14;
    const SLACK: f64 = 1e-9;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(&h);
    if !(-SLACK..=1.0 + SLACK).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < -SLACK || u + v > 1.0 + SLACK {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box(offset: f64) -> Aabb {
        Aabb {
            min: Point3::new(offset, 0.0, 0.0),
            max: Point3::new(offset + 1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn slab_test() {
        let bbox = unit_box(0.0);
        let dir = Vector3::new(1.0, 0.0, 0.0);
        assert!(bbox.hit_by(&Point3::new(-1.0, 0.5, 0.5), &dir, f64::INFINITY));
        assert!(!bbox.hit_by(&Point3::new(-1.0, 0.5, 0.5), &dir, 0.5));
        assert!(!bbox.hit_by(&Point3::new(-1.0, 2.0, 0.5), &dir, f64::INFINITY));
        // Behind the origin.
        assert!(!bbox.hit_by(&Point3::new(2.0, 0.5, 0.5), &dir, f64::INFINITY));
    }

    #[test]
    fn flat_box_is_hit_head_on() {
        let bbox =
            Aabb::from_points(&[Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0)]).unwrap();
        assert!(bbox.hit_by(&Point3::new(0.0, 0.0, 5.0), &-Vector3::z(), f64::INFINITY));
    }

    #[test]
    fn triangle_hit_and_miss() {
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let down = -Vector3::z();
        let t = ray_triangle(&Point3::new(0.25, 0.25, 2.0), &down, &a, &b, &c).unwrap();
        assert_relative_eq!(t, 2.0);
        assert!(ray_triangle(&Point3::new(0.75, 0.75, 2.0), &down, &a, &b, &c).is_none());
        assert!(ray_triangle(&Point3::new(0.25, 0.25, 2.0), &Vector3::z(), &a, &b, &c).is_none());
    }

    #[test]
    fn nearest_hit_picks_closest_primitive() {
        let boxes: Vec<Aabb> = (0..20).map(|i| unit_box(f64::from(i) * 2.0)).collect();
        let bvh = Bvh::build(&boxes).unwrap();

        let origin = Point3::new(100.0, 0.5, 0.5);
        let dir = -Vector3::x();
        let (prim, t) = bvh
            .nearest_hit(&origin, &dir, |i| Some(origin.x - (boxes[i].max.x)))
            .unwrap();
        assert_eq!(prim, 19);
        assert_relative_eq!(t, 61.0);

        assert!(bvh.nearest_hit(&origin, &Vector3::x(), |_| Some(1.0)).is_none());
        assert!(Bvh::build(&[]).is_none());
    }
}
