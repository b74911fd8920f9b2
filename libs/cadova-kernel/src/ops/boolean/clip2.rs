//! 2D boolean operations on polygon sets.
//!
//! The same BSP construction as the 3D case, one dimension down: contours
//! decompose into directed edges (interior on the left), edges are
//! classified and split against lines, and the surviving edges are chained
//! back into contours.

use crate::polygon_set::PolygonSet;
use cadova_math::SimplePolygon;
use config::constants::{PLANE_EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec2;
use std::collections::HashMap;

/// A directed boundary edge with the interior on its left.
#[derive(Debug, Clone, Copy)]
struct Edge2 {
    start: DVec2,
    end: DVec2,
}

impl Edge2 {
    fn line(&self) -> Option<SplitLine> {
        let direction = self.end - self.start;
        if direction.length_squared() < PLANE_EPSILON * PLANE_EPSILON {
            return None;
        }
        // Outward normal: interior is on the left of the direction.
        let normal = DVec2::new(direction.y, -direction.x).normalize();
        Some(SplitLine {
            normal,
            w: normal.dot(self.start),
        })
    }

    fn flip(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }
}

/// A line in implicit form `normal . p == w`.
#[derive(Debug, Clone, Copy)]
struct SplitLine {
    normal: DVec2,
    w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Coplanar,
    Front,
    Back,
}

impl SplitLine {
    fn signed_distance(&self, point: DVec2) -> f64 {
        self.normal.dot(point) - self.w
    }

    fn classify(&self, point: DVec2) -> Side {
        let distance = self.signed_distance(point);
        if distance > PLANE_EPSILON {
            Side::Front
        } else if distance < -PLANE_EPSILON {
            Side::Back
        } else {
            Side::Coplanar
        }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }
}

fn split_edge(
    edge: Edge2,
    line: &SplitLine,
    coplanar_front: &mut Vec<Edge2>,
    coplanar_back: &mut Vec<Edge2>,
    front: &mut Vec<Edge2>,
    back: &mut Vec<Edge2>,
) {
    let start_side = line.classify(edge.start);
    let end_side = line.classify(edge.end);

    match (start_side, end_side) {
        (Side::Coplanar, Side::Coplanar) => {
            let own = match edge.line() {
                Some(own) => own,
                None => return,
            };
            if own.normal.dot(line.normal) > 0.0 {
                coplanar_front.push(edge);
            } else {
                coplanar_back.push(edge);
            }
        }
        (s, e) if s != Side::Back && e != Side::Back => front.push(edge),
        (s, e) if s != Side::Front && e != Side::Front => back.push(edge),
        _ => {
            let t = line.signed_distance(edge.start)
                / (line.signed_distance(edge.start) - line.signed_distance(edge.end));
            let cut = edge.start.lerp(edge.end, t);
            let first = Edge2 {
                start: edge.start,
                end: cut,
            };
            let second = Edge2 {
                start: cut,
                end: edge.end,
            };
            if start_side == Side::Front {
                front.push(first);
                back.push(second);
            } else {
                back.push(first);
                front.push(second);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Bsp2Node {
    line: Option<SplitLine>,
    edges: Vec<Edge2>,
    front: Option<Box<Bsp2Node>>,
    back: Option<Box<Bsp2Node>>,
}

impl Bsp2Node {
    fn new(edges: Vec<Edge2>) -> Self {
        let mut node = Self::default();
        if !edges.is_empty() {
            node.build(edges);
        }
        node
    }

    fn build(&mut self, edges: Vec<Edge2>) {
        if edges.is_empty() {
            return;
        }
        let line = match self.line {
            Some(line) => line,
            None => {
                let line = match edges.iter().find_map(Edge2::line) {
                    Some(line) => line,
                    None => return,
                };
                self.line = Some(line);
                line
            }
        };
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for edge in edges {
            split_edge(
                edge,
                &line,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.edges.extend(coplanar_front);
        self.edges.extend(coplanar_back);
        if !front.is_empty() {
            self.front
                .get_or_insert_with(|| Box::new(Bsp2Node::default()))
                .build(front);
        }
        if !back.is_empty() {
            self.back
                .get_or_insert_with(|| Box::new(Bsp2Node::default()))
                .build(back);
        }
    }

    fn invert(&mut self) {
        for edge in &mut self.edges {
            edge.flip();
        }
        if let Some(line) = &mut self.line {
            line.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    fn clip_edges(&self, edges: Vec<Edge2>) -> Vec<Edge2> {
        let line = match self.line {
            Some(line) => line,
            None => return edges,
        };
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for edge in edges {
            split_edge(
                edge,
                &line,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        front.extend(coplanar_front);
        back.extend(coplanar_back);
        let mut front = match &self.front {
            Some(node) => node.clip_edges(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_edges(back),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    fn clip_to(&mut self, other: &Bsp2Node) {
        self.edges = other.clip_edges(std::mem::take(&mut self.edges));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    fn all_edges(&self) -> Vec<Edge2> {
        let mut out = self.edges.clone();
        if let Some(front) = &self.front {
            out.extend(front.all_edges());
        }
        if let Some(back) = &self.back {
            out.extend(back.all_edges());
        }
        out
    }
}

fn set_to_edges(set: &PolygonSet) -> Vec<Edge2> {
    let mut edges = Vec::new();
    for contour in set.contours() {
        let points = contour.points();
        let n = points.len();
        for i in 0..n {
            edges.push(Edge2 {
                start: points[i],
                end: points[(i + 1) % n],
            });
        }
    }
    edges
}

fn quantize(point: DVec2) -> (i64, i64) {
    (
        (point.x / VERTEX_MERGE_EPSILON).round() as i64,
        (point.y / VERTEX_MERGE_EPSILON).round() as i64,
    )
}

/// Chains loose edges back into closed contours.
fn edges_to_set(edges: Vec<Edge2>) -> PolygonSet {
    let mut by_start: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (index, edge) in edges.iter().enumerate() {
        by_start.entry(quantize(edge.start)).or_default().push(index);
    }
    let mut used = vec![false; edges.len()];
    let mut contours = Vec::new();

    for seed in 0..edges.len() {
        if used[seed] {
            continue;
        }
        let mut loop_points = Vec::new();
        let mut current = seed;
        loop {
            used[current] = true;
            loop_points.push(edges[current].start);
            let key = quantize(edges[current].end);
            let next = by_start
                .get(&key)
                .and_then(|candidates| candidates.iter().find(|&&i| !used[i]).copied());
            match next {
                Some(index) => current = index,
                None => break,
            }
        }
        // Closed loop check: the last edge must return to the seed start.
        let closes = quantize(edges[current].end) == quantize(edges[seed].start);
        if closes && loop_points.len() >= 3 {
            let contour = SimplePolygon::new(loop_points);
            if contour.area() > VERTEX_MERGE_EPSILON {
                contours.push(contour.simplified(PLANE_EPSILON));
            }
        }
    }
    PolygonSet::from_contours(contours)
}

/// Which pairwise combination to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Union,
    Intersection,
    Difference,
}

fn combine(a: &PolygonSet, b: &PolygonSet, op: Combine) -> PolygonSet {
    let mut a_tree = Bsp2Node::new(set_to_edges(a));
    let mut b_tree = Bsp2Node::new(set_to_edges(b));
    match op {
        Combine::Union => {
            a_tree.clip_to(&b_tree);
            b_tree.clip_to(&a_tree);
            b_tree.invert();
            b_tree.clip_to(&a_tree);
            b_tree.invert();
            a_tree.build(b_tree.all_edges());
            edges_to_set(a_tree.all_edges())
        }
        Combine::Difference => {
            a_tree.invert();
            a_tree.clip_to(&b_tree);
            b_tree.clip_to(&a_tree);
            b_tree.invert();
            b_tree.clip_to(&a_tree);
            b_tree.invert();
            a_tree.build(b_tree.all_edges());
            a_tree.invert();
            edges_to_set(a_tree.all_edges())
        }
        Combine::Intersection => {
            a_tree.invert();
            b_tree.clip_to(&a_tree);
            b_tree.invert();
            a_tree.clip_to(&b_tree);
            b_tree.clip_to(&a_tree);
            a_tree.build(b_tree.all_edges());
            a_tree.invert();
            edges_to_set(a_tree.all_edges())
        }
    }
}

/// Union of two polygon sets.
pub fn union_2d(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }
    combine(a, b, Combine::Union)
}

/// Intersection of two polygon sets.
pub fn intersection_2d(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() || b.is_empty() {
        return PolygonSet::new();
    }
    combine(a, b, Combine::Intersection)
}

/// `a` minus `b`.
pub fn difference_2d(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() {
        return PolygonSet::new();
    }
    if b.is_empty() {
        return a.clone();
    }
    combine(a, b, Combine::Difference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::rectangle;
    use cadova_math::Transform2;

    fn square(size: f64) -> PolygonSet {
        rectangle(DVec2::splat(size)).unwrap()
    }

    fn shifted(set: &PolygonSet, offset: DVec2) -> PolygonSet {
        set.transformed(&Transform2::translation(offset))
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let a = square(2.0);
        let b = shifted(&square(2.0), DVec2::new(1.0, 0.0));
        let result = union_2d(&a, &b);
        assert!((result.area() - 6.0).abs() < 1e-6, "area {}", result.area());
    }

    #[test]
    fn test_intersection_of_overlapping_squares() {
        let a = square(2.0);
        let b = shifted(&square(2.0), DVec2::new(1.0, 1.0));
        let result = intersection_2d(&a, &b);
        assert!((result.area() - 1.0).abs() < 1e-6, "area {}", result.area());
    }

    #[test]
    fn test_difference_produces_hole() {
        let outer = square(4.0);
        let inner = shifted(&square(2.0), DVec2::new(1.0, 1.0));
        let result = difference_2d(&outer, &inner);
        assert!((result.area() - 12.0).abs() < 1e-6, "area {}", result.area());
        assert_eq!(result.contour_count(), 2);
        assert!(result.contains(DVec2::new(0.5, 0.5)));
        assert!(!result.contains(DVec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = square(1.0);
        let b = shifted(&square(1.0), DVec2::new(5.0, 5.0));
        assert!(intersection_2d(&a, &b).is_empty());
    }
}
