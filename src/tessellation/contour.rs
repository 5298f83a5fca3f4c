use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::error::{OperationError, Result};
use crate::math::Point2;

/// Where a contour vertex sits on the grid: exactly on a sample, or strictly
/// inside the edge between two samples (lower index first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Crossing {
    Vertex(usize),
    Edge(usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    keys: [Crossing; 2],
    points: [Point2; 2],
}

/// Extracts the iso-lines `field == level` of a regular scalar grid.
///
/// `field` holds `rows * cols` values, row-major. Returned polylines are in
/// fractional index coordinates `(row, col)`. A sample counts as above the
/// level only when strictly greater, so a field equal to `level` everywhere
/// has no contours. Ambiguous saddle cells are resolved with the average of
/// their four corners. Closed loops repeat their first vertex at the end.
///
/// # Errors
///
/// Returns an error if `field.len() != rows * cols`.
pub fn find_contours(
    field: &[f64],
    rows: usize,
    cols: usize,
    level: f64,
) -> Result<Vec<Vec<Point2>>> {
    if field.len() != rows * cols {
        return Err(OperationError::InvalidInput(format!(
            "field has {} values, expected {rows}x{cols}",
            field.len()
        ))
        .into());
    }

    let mut segments = Vec::new();
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols.saturating_sub(1) {
            march_cell(field, cols, r, c, level, &mut segments);
        }
    }

    let contours = chain(&segments);
    trace!(
        segments = segments.len(),
        contours = contours.len(),
        "Traced contours"
    );
    Ok(contours)
}

#[allow(clippy::cast_precision_loss)]
fn grid_point(index: usize, cols: usize) -> Point2 {
    Point2::new((index / cols) as f64, (index % cols) as f64)
}

/// Linear crossing of `level` on the edge between samples `a` and `b`.
///
/// Always interpolates from the lower index so neighbouring cells produce
/// bit-identical points for a shared edge.
fn crossing(field: &[f64], cols: usize, a: usize, b: usize, level: f64) -> (Crossing, Point2) {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let t = (level - field[lo]) / (field[hi] - field[lo]);
    if t <= 0.0 {
        (Crossing::Vertex(lo), grid_point(lo, cols))
    } else if t >= 1.0 {
        (Crossing::Vertex(hi), grid_point(hi, cols))
    } else {
        let p0 = grid_point(lo, cols);
        let p1 = grid_point(hi, cols);
        (Crossing::Edge(lo, hi), p0 + (p1 - p0) * t)
    }
}

fn march_cell(field: &[f64], cols: usize, r: usize, c: usize, level: f64, out: &mut Vec<Segment>) {
    // Corners counter-clockwise; edge k joins corner k and corner k + 1.
    let corners = [
        r * cols + c,
        r * cols + c + 1,
        (r + 1) * cols + c + 1,
        (r + 1) * cols + c,
    ];
    let above = corners.map(|i| field[i] > level);

    let cut: Vec<usize> = (0..4).filter(|&k| above[k] != above[(k + 1) % 4]).collect();
    let mut push = |e0: usize, e1: usize| {
        let a = crossing(field, cols, corners[e0], corners[(e0 + 1) % 4], level);
        let b = crossing(field, cols, corners[e1], corners[(e1 + 1) % 4], level);
        if a.0 != b.0 {
            out.push(Segment {
                keys: [a.0, b.0],
                points: [a.1, b.1],
            });
        }
    };

    match cut.as_slice() {
        [e0, e1] => push(*e0, *e1),
        [_, _, _, _] => {
            let mean = corners.iter().map(|&i| field[i]).sum::<f64>() / 4.0;
            if (mean > level) == above[0] {
                // Corners 0 and 2 connect through the centre.
                push(0, 1);
                push(2, 3);
            } else {
                push(3, 0);
                push(1, 2);
            }
        }
        _ => {}
    }
}

/// Joins segments sharing a crossing into polylines.
fn chain(segments: &[Segment]) -> Vec<Vec<Point2>> {
    let mut by_key: HashMap<Crossing, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        for key in seg.keys {
            by_key.entry(key).or_default().push(i);
        }
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let seg = &segments[first];
        let start_key = seg.keys[0];
        let mut end_key = seg.keys[1];
        let mut points: VecDeque<Point2> = VecDeque::from(seg.points);

        while let Some((key, point)) = next_link(segments, &by_key, &mut used, end_key) {
            points.push_back(point);
            end_key = key;
            if key == start_key {
                break;
            }
        }

        if end_key != start_key {
            let mut front_key = start_key;
            while let Some((key, point)) = next_link(segments, &by_key, &mut used, front_key) {
                points.push_front(point);
                front_key = key;
            }
        }

        lines.push(points.into_iter().collect());
    }

    lines
}

fn next_link(
    segments: &[Segment],
    by_key: &HashMap<Crossing, Vec<usize>>,
    used: &mut [bool],
    key: Crossing,
) -> Option<(Crossing, Point2)> {
    let &i = by_key.get(&key)?.iter().find(|&&i| !used[i])?;
    used[i] = true;
    let seg = &segments[i];
    Some(if seg.keys[0] == key {
        (seg.keys[1], seg.points[1])
    } else {
        (seg.keys[0], seg.points[0])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Values of `f` on a `rows x cols` grid of unit spacing.
    fn sample(rows: usize, cols: usize, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let mut field = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                #[allow(clippy::cast_precision_loss)]
                field.push(f(r as f64, c as f64));
            }
        }
        field
    }

    #[test]
    fn straight_level_line_is_one_open_polyline() {
        let field = sample(4, 5, |_, c| c - 1.5);
        let contours = find_contours(&field, 4, 5, 0.0).unwrap();
        assert_eq!(contours.len(), 1);
        let line = &contours[0];
        assert_eq!(line.len(), 4);
        for p in line {
            assert_relative_eq!(p.y, 1.5);
        }
        let rows: Vec<f64> = line.iter().map(|p| p.x).collect();
        assert!(rows == vec![0.0, 1.0, 2.0, 3.0] || rows == vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn circle_is_a_closed_loop() {
        let field = sample(11, 11, |r, c| (r - 5.0).powi(2) + (c - 5.0).powi(2) - 9.0);
        let contours = find_contours(&field, 11, 11, 0.0).unwrap();
        assert_eq!(contours.len(), 1);
        let ring = &contours[0];
        assert!(ring.len() > 8);
        assert_eq!(ring.first(), ring.last());
        for p in ring {
            let radius = ((p.x - 5.0).powi(2) + (p.y - 5.0).powi(2)).sqrt();
            assert!((radius - 3.0).abs() < 0.2, "radius {radius}");
        }
    }

    #[test]
    fn flat_field_has_no_contours() {
        let field = vec![0.0; 9];
        assert!(find_contours(&field, 3, 3, 0.0).unwrap().is_empty());
        let field = vec![1.0; 9];
        assert!(find_contours(&field, 3, 3, 0.0).unwrap().is_empty());
    }

    #[test]
    fn saddle_uses_cell_average() {
        // Diagonal corners high, centre average above the level: the two
        // high corners stay connected and the low corners are cut off.
        let field = [1.0, -0.5, -0.5, 1.0];
        let contours = find_contours(&field, 2, 2, 0.0).unwrap();
        assert_eq!(contours.len(), 2);
        for line in &contours {
            assert_eq!(line.len(), 2);
        }
        // Segment cutting off the low corner (0, 1).
        let first = &contours[0];
        assert_relative_eq!(first[0], Point2::new(0.0, 2.0 / 3.0));
        assert_relative_eq!(first[1], Point2::new(1.0 / 3.0, 1.0));
    }

    #[test]
    fn mismatched_field_is_rejected() {
        assert!(find_contours(&[0.0; 5], 2, 3, 0.0).is_err());
    }
}
