//! Constant-radius tube meshes along a polyline rail.
//!
//! Used for the structure path tube, the morphing curve tube and the
//! growing/revealed star paths. Frames are propagated by parallel transport so
//! the tube does not twist along gentle bends.

use std::f64::consts::TAU;

use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::{GeomMesh, finalize_mesh, stitch_rings};
use super::{Point3, Tolerance, Vec3};

/// A dot product below this (~75°) between consecutive tangents counts as a sharp turn.
const CUSP_DOT_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeOptions {
    /// Number of segments around the circular cross-section.
    pub radial_segments: usize,
    pub compute_normals: bool,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            radial_segments: 16,
            compute_normals: true,
        }
    }
}

impl PipeOptions {
    #[must_use]
    pub fn with_radial_segments(radial_segments: usize) -> Self {
        Self {
            radial_segments,
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PipeError {
    #[error("rail requires at least 2 distinct points")]
    RailTooShort,
    #[error("rail must have finite points")]
    NonFiniteRail,
    #[error("radius must be finite and >= 0, got {0}")]
    InvalidRadius(f64),
    #[error("pipe requires at least 3 radial segments")]
    NotEnoughRadialSegments,
}

#[derive(Debug, Clone, Copy)]
struct RailFrame {
    tangent: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

impl RailFrame {
    fn from_tangent(tangent: Vec3) -> Option<Self> {
        let tangent = tangent.normalized()?;
        let normal = tangent.any_perpendicular();
        let binormal = tangent.cross(normal).normalized()?;
        Some(Self {
            tangent,
            normal,
            binormal,
        })
    }

    fn fallback() -> Self {
        Self {
            tangent: Vec3::Z,
            normal: Vec3::X,
            binormal: Vec3::Y,
        }
    }
}

/// Drop consecutive duplicates and, for closed rails, a repeated closing point.
fn clean_rail(points: &[Point3], closed: bool, tol: Tolerance) -> Result<Vec<Point3>, PipeError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(PipeError::NonFiniteRail);
    }

    let mut cleaned: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points.iter().copied() {
        if cleaned
            .last()
            .is_some_and(|prev| tol.approx_eq_point3(*prev, p))
        {
            continue;
        }
        cleaned.push(p);
    }

    if closed && cleaned.len() > 2 {
        let first = cleaned[0];
        if cleaned
            .last()
            .is_some_and(|last| tol.approx_eq_point3(*last, first))
        {
            cleaned.pop();
        }
    }

    if cleaned.len() < 2 {
        return Err(PipeError::RailTooShort);
    }
    Ok(cleaned)
}

/// Sweep a circle of `radius` along `rail`.
///
/// Closed rails connect the last ring back to the first; open rails are left
/// uncapped. A zero radius is accepted and yields a collapsed tube, which
/// is how growing tubes start.
pub fn pipe_rail(
    rail: &[Point3],
    radius: f64,
    closed: bool,
    options: PipeOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), PipeError> {
    pipe_rail_with_tolerance(rail, radius, closed, options, Tolerance::default_geom())
}

pub fn pipe_rail_with_tolerance(
    rail: &[Point3],
    radius: f64,
    closed: bool,
    options: PipeOptions,
    tol: Tolerance,
) -> Result<(GeomMesh, GeomMeshDiagnostics), PipeError> {
    if options.radial_segments < 3 {
        return Err(PipeError::NotEnoughRadialSegments);
    }
    if !radius.is_finite() || radius < 0.0 {
        return Err(PipeError::InvalidRadius(radius));
    }

    let points = clean_rail(rail, closed, tol)?;
    let closed = closed && points.len() > 2;
    let (frames, warnings) = compute_rail_frames(&points, closed, tol);

    let arc_lengths = compute_arc_lengths(&points);
    let total_length = arc_lengths.last().copied().unwrap_or(0.0).max(tol.eps);

    let radial = options.radial_segments;
    let mut vertices = Vec::with_capacity(points.len() * radial);
    let mut uvs = Vec::with_capacity(points.len() * radial);

    for ((origin, frame), arc) in points.iter().zip(&frames).zip(&arc_lengths) {
        let v = arc / total_length;
        for seg in 0..radial {
            let u = seg as f64 / radial as f64;
            let (sin, cos) = (TAU * u).sin_cos();
            vertices.push(*origin + frame.normal * (radius * cos) + frame.binormal * (radius * sin));
            uvs.push([u, v]);
        }
    }

    let indices = stitch_rings(points.len(), radial, closed);
    let (mesh, mut diagnostics) =
        finalize_mesh(vertices, Some(uvs), indices, options.compute_normals, tol);
    diagnostics.extend_warnings(warnings);
    Ok((mesh, diagnostics))
}

fn compute_arc_lengths(points: &[Point3]) -> Vec<f64> {
    let mut cumulative = 0.0;
    let mut arc_lengths = Vec::with_capacity(points.len());
    arc_lengths.push(0.0);
    for pair in points.windows(2) {
        cumulative += pair[0].distance_to(pair[1]);
        arc_lengths.push(cumulative);
    }
    arc_lengths
}

fn compute_rail_frames(rail: &[Point3], closed: bool, tol: Tolerance) -> (Vec<RailFrame>, Vec<String>) {
    let mut warnings = Vec::new();
    let n = rail.len();

    let tangent_at = |i: usize| -> Vec3 {
        let (prev, next) = if closed {
            ((i + n - 1) % n, (i + 1) % n)
        } else {
            (i.saturating_sub(1), (i + 1).min(n - 1))
        };
        let forward = rail[next] - rail[i];
        let backward = rail[i] - rail[prev];
        forward.normalized_or(Vec3::ZERO) + backward.normalized_or(Vec3::ZERO)
    };

    let first = RailFrame::from_tangent(tangent_at(0))
        .or_else(|| RailFrame::from_tangent(rail[1] - rail[0]))
        .unwrap_or_else(|| {
            warnings.push("rail has degenerate initial tangent; using default frame".to_string());
            RailFrame::fallback()
        });

    let mut frames = Vec::with_capacity(n);
    frames.push(first);

    let mut sharp_turns = 0usize;
    for i in 1..n {
        let prev = frames[i - 1];
        let tangent = match tangent_at(i).normalized() {
            Some(t) => t,
            None => {
                warnings.push(format!("rail point {i} has a degenerate tangent; reusing previous"));
                prev.tangent
            }
        };
        if prev.tangent.dot(tangent) < CUSP_DOT_THRESHOLD {
            sharp_turns += 1;
        }
        frames.push(parallel_transport(prev, tangent, tol));
    }

    if sharp_turns > 0 {
        warnings.push(format!("rail continuity warning: {sharp_turns} sharp tangent changes"));
    }

    (frames, warnings)
}

fn parallel_transport(prev: RailFrame, tangent: Vec3, tol: Tolerance) -> RailFrame {
    let axis = prev.tangent.cross(tangent);
    if axis.length_squared() < tol.eps_squared() {
        let flip = if prev.tangent.dot(tangent) < 0.0 { -1.0 } else { 1.0 };
        return RailFrame {
            tangent,
            normal: prev.normal * flip,
            binormal: prev.binormal * flip,
        };
    }

    let axis = axis.normalized_or(Vec3::Z);
    let angle = prev.tangent.dot(tangent).clamp(-1.0, 1.0).acos();
    let normal = rotate_vector(prev.normal, axis, angle)
        .normalized()
        .unwrap_or(prev.normal);
    let binormal = tangent.cross(normal).normalized().unwrap_or(prev.binormal);

    RailFrame {
        tangent,
        normal,
        binormal,
    }
}

/// Rodrigues rotation of `v` about the unit `axis`.
fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}
