//! # Triangulation
//!
//! Ear-clipping triangulation for simple polygons, with hole bridging for
//! polygon sets. Used for polyhedron faces, extrusion caps, and split
//! caps.

use crate::polygon_set::PolygonSet;
use cadova_math::SimplePolygon;
use config::constants::EPSILON;
use glam::DVec2;

/// Triangulates a counter-clockwise simple polygon.
///
/// Returns index triples into `points`. Degenerate inputs yield an empty
/// list.
pub fn triangulate_polygon(points: &[DVec2]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let count = remaining.len();
        let mut clipped = false;
        for i in 0..count {
            let prev = remaining[(i + count - 1) % count];
            let here = remaining[i];
            let next = remaining[(i + 1) % count];
            if !is_ear(points, &remaining, prev, here, next) {
                continue;
            }
            triangles.push([prev, here, next]);
            remaining.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // Numerically stuck polygon: clip the widest corner to
            // guarantee termination.
            let count = remaining.len();
            let mut best = 0;
            let mut best_cross = f64::NEG_INFINITY;
            for i in 0..count {
                let prev = points[remaining[(i + count - 1) % count]];
                let here = points[remaining[i]];
                let next = points[remaining[(i + 1) % count]];
                let cross = (here - prev).perp_dot(next - here);
                if cross > best_cross {
                    best_cross = cross;
                    best = i;
                }
            }
            let prev = remaining[(best + count - 1) % count];
            let here = remaining[best];
            let next = remaining[(best + 1) % count];
            triangles.push([prev, here, next]);
            remaining.remove(best);
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

fn is_ear(points: &[DVec2], remaining: &[usize], prev: usize, here: usize, next: usize) -> bool {
    let a = points[prev];
    let b = points[here];
    let c = points[next];
    // Reflex corners cannot be ears.
    if (b - a).perp_dot(c - b) <= EPSILON {
        return false;
    }
    for &other in remaining {
        if other == prev || other == here || other == next {
            continue;
        }
        let p = points[other];
        // Bridged hole loops duplicate vertices by position; a coincident
        // point is not an obstruction.
        if (p - a).length_squared() < EPSILON
            || (p - b).length_squared() < EPSILON
            || (p - c).length_squared() < EPSILON
        {
            continue;
        }
        if point_in_triangle(p, a, b, c) {
            return false;
        }
    }
    true
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < -EPSILON || d2 < -EPSILON || d3 < -EPSILON;
    let has_pos = d1 > EPSILON || d2 > EPSILON || d3 > EPSILON;
    !(has_neg && has_pos)
}

/// Triangulates a polygon set, resolving holes by bridging them into
/// their containing outer contour.
///
/// Returns triangles as point triples in counter-clockwise order.
pub fn triangulate_set(set: &PolygonSet) -> Vec<[DVec2; 3]> {
    let mut outers: Vec<Vec<DVec2>> = Vec::new();
    let mut holes: Vec<&SimplePolygon> = Vec::new();
    for contour in set.contours() {
        if contour.is_counter_clockwise() {
            outers.push(contour.points().to_vec());
        } else {
            holes.push(contour);
        }
    }

    // Attach each hole to the smallest outer contour containing it.
    let mut assigned: Vec<Vec<&SimplePolygon>> = vec![Vec::new(); outers.len()];
    for hole in holes {
        let probe = hole.points()[0];
        let mut best: Option<(usize, f64)> = None;
        for (index, outer) in outers.iter().enumerate() {
            let polygon = SimplePolygon::new(outer.clone());
            if polygon.contains(probe) {
                let area = polygon.area();
                if best.map_or(true, |(_, a)| area < a) {
                    best = Some((index, area));
                }
            }
        }
        if let Some((index, _)) = best {
            assigned[index].push(hole);
        }
    }

    let mut triangles = Vec::new();
    for (outer, outer_holes) in outers.into_iter().zip(assigned) {
        let mut loop_points = outer;
        for hole in outer_holes {
            loop_points = bridge_hole(loop_points, hole.points());
        }
        for [a, b, c] in triangulate_polygon(&loop_points) {
            triangles.push([loop_points[a], loop_points[b], loop_points[c]]);
        }
    }
    triangles
}

/// Splices a clockwise hole loop into an outer loop through a bridge edge
/// between mutually visible vertices.
fn bridge_hole(outer: Vec<DVec2>, hole: &[DVec2]) -> Vec<DVec2> {
    // Rightmost hole vertex is guaranteed to see the outer boundary.
    let hole_index = hole
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.x.total_cmp(&b.1.x))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let hole_point = hole[hole_index];

    // Nearest outer vertex with an unobstructed bridge segment.
    let mut candidates: Vec<usize> = (0..outer.len()).collect();
    candidates.sort_by(|&a, &b| {
        (outer[a] - hole_point)
            .length_squared()
            .total_cmp(&(outer[b] - hole_point).length_squared())
    });
    let outer_index = candidates
        .iter()
        .copied()
        .find(|&candidate| {
            bridge_is_clear(&outer, hole, hole_point, outer[candidate])
        })
        .unwrap_or(candidates[0]);

    let mut spliced = Vec::with_capacity(outer.len() + hole.len() + 2);
    spliced.extend_from_slice(&outer[..=outer_index]);
    for offset in 0..=hole.len() {
        spliced.push(hole[(hole_index + offset) % hole.len()]);
    }
    spliced.extend_from_slice(&outer[outer_index..]);
    spliced
}

fn bridge_is_clear(outer: &[DVec2], hole: &[DVec2], from: DVec2, to: DVec2) -> bool {
    let loops: [&[DVec2]; 2] = [outer, hole];
    for loop_points in loops {
        let n = loop_points.len();
        for i in 0..n {
            let a = loop_points[i];
            let b = loop_points[(i + 1) % n];
            if segments_cross(from, to, a, b) {
                return false;
            }
        }
    }
    true
}

/// Proper crossing test, excluding shared endpoints.
fn segments_cross(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    for shared in [q1, q2] {
        if (shared - p1).length_squared() < EPSILON || (shared - p2).length_squared() < EPSILON {
            return false;
        }
    }
    let d1 = (p2 - p1).perp_dot(q1 - p1);
    let d2 = (p2 - p1).perp_dot(q2 - p1);
    let d3 = (q2 - q1).perp_dot(p1 - q1);
    let d4 = (q2 - q1).perp_dot(p2 - q1);
    (d1 * d2 < -EPSILON) && (d3 * d4 < -EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_splits_into_two_triangles() {
        let square = vec![
            DVec2::ZERO,
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        let triangles = triangulate_polygon(&square);
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn test_concave_polygon() {
        let l_shape = vec![
            DVec2::ZERO,
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        let triangles = triangulate_polygon(&l_shape);
        assert_eq!(triangles.len(), 4);
        let area: f64 = triangles
            .iter()
            .map(|&[a, b, c]| {
                (l_shape[b] - l_shape[a]).perp_dot(l_shape[c] - l_shape[a]) / 2.0
            })
            .sum();
        assert!((area - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_annulus_triangulation_area() {
        let outer = SimplePolygon::new(vec![
            DVec2::new(-2.0, -2.0),
            DVec2::new(2.0, -2.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(-2.0, 2.0),
        ]);
        let hole = SimplePolygon::new(vec![
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ])
        .reversed();
        let set = PolygonSet::from_contours(vec![outer, hole]);
        let triangles = triangulate_set(&set);
        let area: f64 = triangles
            .iter()
            .map(|[a, b, c]| (*b - *a).perp_dot(*c - *a) / 2.0)
            .sum();
        assert!((area - 12.0).abs() < 1e-9, "area was {area}");
    }
}
