//! Rectangular Bezier patches.

use crate::error::InvalidGeometry;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A rectangular Bezier patch over a grid of 3D control points.
///
/// Rows share the `u` direction; columns share `v`. Each row and column
/// must hold 2 to 4 points (degree 1 to 3 in each direction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BezierPatch {
    rows: Vec<Vec<DVec3>>,
}

impl BezierPatch {
    /// A patch from a rectangular control grid.
    pub fn new(rows: Vec<Vec<DVec3>>) -> Result<Self, InvalidGeometry> {
        if rows.len() < 2 || rows.len() > 4 {
            return Err(InvalidGeometry::new("bezier patch needs 2 to 4 rows"));
        }
        let width = rows[0].len();
        if width < 2 || width > 4 {
            return Err(InvalidGeometry::new("bezier patch needs 2 to 4 columns"));
        }
        if rows.iter().any(|r| r.len() != width) {
            return Err(InvalidGeometry::new("bezier patch rows differ in length"));
        }
        Ok(Self { rows })
    }

    /// The control grid.
    pub fn control_rows(&self) -> &[Vec<DVec3>] {
        &self.rows
    }

    /// Evaluates the patch at `(u, v)`, each in `0..=1`.
    ///
    /// De Casteljau across rows first, then down the resulting column.
    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        let column: Vec<DVec3> = self
            .rows
            .iter()
            .map(|row| de_casteljau(row, u))
            .collect();
        de_casteljau(&column, v)
    }

    /// Samples the patch into a `(rows + 1) x (columns + 1)` point grid.
    pub fn grid(&self, segments_u: u32, segments_v: u32) -> Vec<Vec<DVec3>> {
        let nu = segments_u.max(1);
        let nv = segments_v.max(1);
        (0..=nv)
            .map(|j| {
                let v = j as f64 / nv as f64;
                (0..=nu)
                    .map(|i| self.point(i as f64 / nu as f64, v))
                    .collect()
            })
            .collect()
    }

}

fn de_casteljau(points: &[DVec3], t: f64) -> DVec3 {
    let mut work = points.to_vec();
    let mut n = work.len();
    while n > 1 {
        for i in 0..n - 1 {
            work[i] = work[i].lerp(work[i + 1], t);
        }
        n -= 1;
    }
    work[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_patch() -> BezierPatch {
        BezierPatch::new(vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
            vec![DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
        ])
        .unwrap()
    }

    #[test]
    fn test_corners() {
        let p = flat_patch();
        assert_eq!(p.point(0.0, 0.0), DVec3::ZERO);
        assert_eq!(p.point(1.0, 1.0), DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_bilinear_center() {
        let p = flat_patch();
        let c = p.point(0.5, 0.5);
        assert!((c - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_grid_dimensions() {
        let p = flat_patch();
        let g = p.grid(4, 3);
        assert_eq!(g.len(), 4);
        assert_eq!(g[0].len(), 5);
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let result = BezierPatch::new(vec![
            vec![DVec3::ZERO, DVec3::X],
            vec![DVec3::Y],
        ]);
        assert!(result.is_err());
    }
}
