//! Static figure tables drawn by the paths chapter.
//!
//! Coordinates are unit-sized and planar; [`Figure::place`] maps them into
//! world space around an anchor.

use crate::geom::{Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    Shape,
    Constellation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub name: &'static str,
    pub kind: FigureKind,
    pub points: &'static [[f64; 2]],
    pub closed: bool,
}

pub const SHAPES: [Figure; 3] = [
    Figure {
        name: "triangle",
        kind: FigureKind::Shape,
        points: &[[0.0, 1.0], [-0.866, -0.5], [0.866, -0.5]],
        closed: true,
    },
    Figure {
        name: "square",
        kind: FigureKind::Shape,
        points: &[[-0.707, -0.707], [0.707, -0.707], [0.707, 0.707], [-0.707, 0.707]],
        closed: true,
    },
    Figure {
        name: "pentagon",
        kind: FigureKind::Shape,
        points: &[
            [0.0, 1.0],
            [-0.951, 0.309],
            [-0.588, -0.809],
            [0.588, -0.809],
            [0.951, 0.309],
        ],
        closed: true,
    },
];

pub const CONSTELLATIONS: [Figure; 2] = [
    Figure {
        name: "big dipper",
        kind: FigureKind::Constellation,
        points: &[
            [-1.0, 0.35],
            [-0.62, 0.28],
            [-0.3, 0.12],
            [0.05, 0.0],
            [0.12, -0.4],
            [0.68, -0.48],
            [0.72, -0.05],
            [0.05, 0.0],
        ],
        closed: false,
    },
    Figure {
        name: "cassiopeia",
        kind: FigureKind::Constellation,
        points: &[[-1.0, 0.3], [-0.5, -0.35], [0.0, 0.1], [0.5, -0.4], [1.0, 0.25]],
        closed: false,
    },
];

impl Figure {
    /// Number of drawable segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Figure vertices in the plane spanned by `right` and `up` around `anchor`.
    #[must_use]
    pub fn place(&self, anchor: Point3, right: Vec3, up: Vec3, scale: f64) -> Vec<Point3> {
        self.points
            .iter()
            .map(|[u, v]| anchor + right * (u * scale) + up * (v * scale))
            .collect()
    }

    /// The first `count` segments as endpoint pairs.
    #[must_use]
    pub fn segments(&self, placed: &[Point3], count: usize) -> Vec<(Point3, Point3)> {
        let n = placed.len();
        (0..self.segment_count().min(count))
            .map(|i| (placed[i], placed[(i + 1) % n]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_tagged_by_kind() {
        assert!(SHAPES.iter().all(|f| f.kind == FigureKind::Shape && f.closed));
        assert!(CONSTELLATIONS.iter().all(|f| f.kind == FigureKind::Constellation && !f.closed));
        let names: Vec<&str> = SHAPES.iter().map(|f| f.name).collect();
        assert_eq!(names, ["triangle", "square", "pentagon"]);
    }

    #[test]
    fn closed_figures_wrap() {
        let tri = &SHAPES[0];
        assert_eq!(tri.segment_count(), 3);
        let placed = tri.place(Point3::ORIGIN, Vec3::X, Vec3::Y, 2.0);
        let segs = tri.segments(&placed, 10);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2].1, placed[0]);
        assert_eq!(CONSTELLATIONS[1].segment_count(), 4);
    }
}
