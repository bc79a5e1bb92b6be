//! Morph between a straight closed polyline and a smooth closed curve.
//!
//! The curve is first aligned to the polyline: its start is moved to the
//! sample closest to the polyline's first corner and its direction is flipped
//! when it runs against the polyline's first edge. Sample `i` of `m` is then
//! `lerp(polyline(i/m), curve(aligned(i/m)), t)`.

use super::curve::{ClosedCardinalSpline, closed_catmull_rom, sample_closed_by_index};
use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::GeomMesh;
use super::pipe::{PipeError, PipeOptions, pipe_rail};
use super::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphOptions {
    /// Samples per polyline corner; `m = samples_per_corner * n`.
    pub samples_per_corner: usize,
    /// Curve samples inspected when searching for the start offset.
    pub alignment_samples: usize,
    /// Tube spline tension reached at `t = 1`.
    pub max_tension: f64,
    /// Spline subdivisions between consecutive morph samples in the tube rail.
    pub rail_subdivisions: usize,
    pub pipe: PipeOptions,
}

impl Default for MorphOptions {
    fn default() -> Self {
        Self {
            samples_per_corner: 16,
            alignment_samples: 101,
            max_tension: ClosedCardinalSpline::CATMULL_ROM,
            rail_subdivisions: 2,
            pipe: PipeOptions::default(),
        }
    }
}

/// Start offset and direction that map polyline parameters onto a closed curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveAlignment {
    /// Curve parameter that corresponds to the polyline's first corner.
    pub offset: f64,
    pub reversed: bool,
}

impl Default for CurveAlignment {
    fn default() -> Self {
        Self {
            offset: 0.0,
            reversed: false,
        }
    }
}

impl CurveAlignment {
    /// Curve parameter for polyline parameter `s`, wrapped into `[0, 1)`.
    #[must_use]
    pub fn map(&self, s: f64) -> f64 {
        let t = if self.reversed { self.offset - s } else { self.offset + s };
        t.rem_euclid(1.0)
    }
}

/// Align closed `curve` samples to closed `polyline`.
#[must_use]
pub fn align_curve(polyline: &[Point3], curve: &[Point3], alignment_samples: usize) -> CurveAlignment {
    if polyline.is_empty() || curve.len() < 2 {
        return CurveAlignment::default();
    }

    let samples = alignment_samples.max(2);
    let steps = (samples - 1) as f64;
    let start = polyline[0];

    let mut best = (0.0, f64::INFINITY);
    for k in 0..samples {
        let s = k as f64 / steps;
        let d = sample_closed_by_index(curve, s).distance_squared_to(start);
        if d < best.1 {
            best = (s, d);
        }
    }
    let offset = best.0.rem_euclid(1.0);

    let Some(second) = polyline.get(1).copied() else {
        return CurveAlignment {
            offset,
            reversed: false,
        };
    };

    let step = 1.0 / steps;
    let here = sample_closed_by_index(curve, offset);
    let ahead = sample_closed_by_index(curve, offset + step);
    let reversed = (ahead - here).dot(second - start) < 0.0;

    CurveAlignment { offset, reversed }
}

/// Morph samples at progress `t`: `samples_per_corner * n` points, where `n`
/// is the polyline corner count. The polyline is walked by vertex index.
#[must_use]
pub fn morph_samples(polyline: &[Point3], curve: &[Point3], t: f64, options: &MorphOptions) -> Vec<Point3> {
    let n = polyline.len();
    if n == 0 {
        return Vec::new();
    }
    let m = n * options.samples_per_corner.max(1);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    let fallback;
    let curve = if curve.len() >= 2 {
        curve
    } else {
        fallback = closed_catmull_rom(polyline, options.samples_per_corner, ClosedCardinalSpline::CATMULL_ROM);
        &fallback
    };
    let alignment = align_curve(polyline, curve, options.alignment_samples);

    (0..m)
        .map(|i| {
            let s = i as f64 / m as f64;
            let straight = sample_closed_by_index(polyline, s);
            let curved = sample_closed_by_index(curve, alignment.map(s));
            straight.lerp(curved, t)
        })
        .collect()
}

/// Tube along the morph samples. The rail is a cardinal spline whose tension
/// grows with `t`, so the tube reads angular at 0 and smooth at 1.
pub fn morph_tube(
    polyline: &[Point3],
    curve: &[Point3],
    t: f64,
    radius: f64,
    options: &MorphOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), PipeError> {
    let samples = morph_samples(polyline, curve, t, options);
    let tension = options.max_tension * t.clamp(0.0, 1.0);
    let rail = closed_catmull_rom(&samples, options.rail_subdivisions, tension);
    pipe_rail(&rail, radius, true, options.pipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Vec<Point3> {
        vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ]
    }

    #[test]
    fn alignment_map_wraps() {
        let forward = CurveAlignment {
            offset: 0.75,
            reversed: false,
        };
        assert!((forward.map(0.5) - 0.25).abs() < 1e-12);
        let backward = CurveAlignment {
            offset: 0.25,
            reversed: true,
        };
        assert!((backward.map(0.5) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn reversed_curve_is_detected() {
        let poly = diamond();
        let mut curve = closed_catmull_rom(&poly, 8, 0.5);
        curve.reverse();
        let alignment = align_curve(&poly, &curve, 101);
        assert!(alignment.reversed);
        let start = sample_closed_by_index(&curve, alignment.offset);
        assert!(start.distance_to(poly[0]) < 0.1);
    }

    #[test]
    fn missing_curve_falls_back_to_spline() {
        let poly = diamond();
        let samples = morph_samples(&poly, &[], 1.0, &MorphOptions::default());
        assert_eq!(samples.len(), 64);
        assert!(samples.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn tube_is_built_at_both_ends() {
        let poly = diamond();
        let curve = closed_catmull_rom(&poly, 16, 0.5);
        for t in [0.0, 1.0] {
            let (mesh, _) = morph_tube(&poly, &curve, t, 0.05, &MorphOptions::default()).unwrap();
            assert!(mesh.triangle_count() > 0);
            assert!(!mesh.has_invalid_vertices());
        }
    }
}
