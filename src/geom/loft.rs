//! Loft surface generation from ordered cross-sections.
//!
//! Every section is a closed vertex loop. Sections are resampled to a common
//! vertex count, stacked as rings and stitched two triangles per quad. On top
//! of the base topology three continuous deformations are applied per section:
//!
//! - `scale`: vertices are pulled toward the section centroid
//! - `straighten`: the whole section slides toward the nearest point on the
//!   piecewise-linear path
//! - `circle_blend`: the profile morphs into a regular polygon of the
//!   section's mean radius, oriented by the local spine tangent
//!
//! Degenerate input never fails: missing sections produce an empty mesh and
//! degenerate tangents fall back to [`DEFAULT_UP`]. Only non-finite input is
//! rejected.

use std::f64::consts::TAU;

use super::curve::{Polyline3, sample_closed_by_index};
use super::diagnostics::GeomMeshDiagnostics;
use super::mesh::{GeomMesh, finalize_mesh, stitch_rings};
use super::{Point3, Tolerance, Vec3};

/// Fallback spine direction for sections whose tangent cannot be computed.
pub const DEFAULT_UP: Vec3 = Vec3::Y;

// ============================================================================
// Types and Options
// ============================================================================

/// Options controlling loft surface generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoftOptions {
    /// Append the first section as a virtual last ring so the surface wraps.
    pub closed: bool,
    /// Lower bound for the per-section vertex count after resampling.
    pub min_vertex_count: usize,
    /// Pull toward the section centroid; 1 keeps the original profile.
    pub scale: f64,
    /// Move each section toward its projection on the path.
    pub straighten: f64,
    /// Blend toward a regular polygon profile.
    pub circle_blend: f64,
    /// `circle_blend` only applies once `scale` is at or below this value.
    pub circle_blend_threshold: f64,
    /// Side count of the blend polygon.
    pub circle_sides: usize,
    pub compute_normals: bool,
}

impl Default for LoftOptions {
    fn default() -> Self {
        Self {
            closed: false,
            min_vertex_count: 32,
            scale: 1.0,
            straighten: 0.0,
            circle_blend: 0.0,
            circle_blend_threshold: 0.95,
            circle_sides: 32,
            compute_normals: true,
        }
    }
}

impl LoftOptions {
    /// Options for a closed loft (the last section connects back to the first).
    #[must_use]
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Default::default()
        }
    }

    /// Open strip, as used for progressive growth.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    fn circle_blend_active(&self) -> bool {
        self.circle_blend > 0.0 && self.scale <= self.circle_blend_threshold
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LoftError {
    #[error("section {section} contains non-finite coordinates at point {point}")]
    NonFinitePoint { section: usize, point: usize },
    #[error("path contains non-finite coordinates at point {0}")]
    NonFinitePath(usize),
    #[error("loft parameter `{name}` must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
}

/// Mesh plus the layout it was built with.
#[derive(Debug, Clone, Default)]
pub struct LoftResult {
    pub mesh: GeomMesh,
    pub diagnostics: GeomMeshDiagnostics,
    /// Ring count, including the virtual closing ring of a closed loft.
    pub ring_count: usize,
    /// Vertices per ring after resampling.
    pub points_per_section: usize,
}

impl LoftResult {
    fn empty(warning: impl Into<String>) -> Self {
        let mut diagnostics = GeomMeshDiagnostics::new();
        diagnostics.add_warning(warning);
        Self {
            diagnostics,
            ..Default::default()
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a loft mesh from ordered sections, an optional spine path and
/// optional per-section scale factors.
#[derive(Debug, Clone)]
pub struct LoftMeshBuilder<'a> {
    sections: &'a [Vec<Point3>],
    path: &'a [Point3],
    section_scales: Option<&'a [f64]>,
    options: LoftOptions,
    tol: Tolerance,
}

impl<'a> LoftMeshBuilder<'a> {
    #[must_use]
    pub fn new(sections: &'a [Vec<Point3>], options: LoftOptions) -> Self {
        Self {
            sections,
            path: &[],
            section_scales: None,
            options,
            tol: Tolerance::default_geom(),
        }
    }

    /// Closed piecewise-linear path used by `straighten`.
    #[must_use]
    pub fn with_path(mut self, path: &'a [Point3]) -> Self {
        self.path = path;
        self
    }

    /// Extra scale per input section, multiplied with `options.scale`.
    /// Missing entries count as 1.
    #[must_use]
    pub fn with_section_scales(mut self, scales: &'a [f64]) -> Self {
        self.section_scales = Some(scales);
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tol: Tolerance) -> Self {
        self.tol = tol;
        self
    }

    pub fn build(self) -> Result<LoftResult, LoftError> {
        self.validate()?;
        let options = self.clamped_options();

        let mut diagnostics = GeomMeshDiagnostics::new();

        // (input index, points) for every usable section
        let mut rings: Vec<(usize, &[Point3])> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(index, section)| {
                if section.is_empty() {
                    diagnostics.add_warning(format!("section {index} is empty; skipped"));
                    false
                } else {
                    true
                }
            })
            .map(|(index, section)| (index, section.as_slice()))
            .collect();

        if rings.is_empty() {
            return Ok(LoftResult::empty("loft has no sections; produced empty mesh"));
        }
        if options.closed {
            rings.push(rings[0]);
        }
        if rings.len() < 2 {
            return Ok(LoftResult::empty("loft needs at least 2 sections; produced empty mesh"));
        }

        let max_count = rings.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
        let vps = max_count.max(options.min_vertex_count).max(3);

        let resampled: Vec<Vec<Point3>> = rings.iter().map(|(_, s)| resample_closed(s, vps)).collect();
        let centroids: Vec<Point3> = resampled.iter().map(|ring| Point3::centroid(ring)).collect();

        let path = self.spine_path(&mut diagnostics);
        let tangents = ring_tangents(&centroids, options.closed, self.tol);

        let ring_count = resampled.len();
        let mut vertices = Vec::with_capacity(ring_count * vps);
        let mut uvs = Vec::with_capacity(ring_count * vps);

        for (r, ring) in resampled.iter().enumerate() {
            let (input_index, original) = rings[r];
            let centroid = centroids[r];
            let scale = options.scale * self.section_scale(input_index);

            let tangent = if original.len() < 3 {
                diagnostics.add_warning(format!(
                    "section {input_index} has fewer than 3 vertices; using default up-vector"
                ));
                DEFAULT_UP
            } else {
                tangents[r].unwrap_or_else(|| {
                    diagnostics.add_warning(format!(
                        "section {input_index} has a degenerate tangent; using default up-vector"
                    ));
                    DEFAULT_UP
                })
            };

            let circle = options.circle_blend_active().then(|| {
                let radius = mean_radius(ring, centroid);
                regular_polygon(centroid, tangent, ring[0], radius, options.circle_sides)
            });

            let offset = match &path {
                Some(path) if options.straighten > 0.0 => {
                    let (target, _) = path.closest_point(centroid);
                    (target - centroid) * options.straighten
                }
                _ => Vec3::ZERO,
            };

            let v = r as f64 / (ring_count - 1) as f64;
            for (j, vertex) in ring.iter().enumerate() {
                let u = j as f64 / vps as f64;
                let mut p = centroid.lerp(*vertex, scale);
                if let Some(circle) = &circle {
                    p = p.lerp(sample_closed_by_index(circle, u), options.circle_blend);
                }
                vertices.push(p + offset);
                uvs.push([u, v]);
            }
        }

        let indices = stitch_rings(ring_count, vps, false);
        let (mesh, mut mesh_diag) =
            finalize_mesh(vertices, Some(uvs), indices, options.compute_normals, self.tol);
        mesh_diag.extend_warnings(diagnostics.warnings);

        Ok(LoftResult {
            mesh,
            diagnostics: mesh_diag,
            ring_count,
            points_per_section: vps,
        })
    }

    fn validate(&self) -> Result<(), LoftError> {
        for (section, points) in self.sections.iter().enumerate() {
            if let Some(point) = points.iter().position(|p| !p.is_finite()) {
                return Err(LoftError::NonFinitePoint { section, point });
            }
        }
        if let Some(index) = self.path.iter().position(|p| !p.is_finite()) {
            return Err(LoftError::NonFinitePath(index));
        }
        let params = [
            ("scale", self.options.scale),
            ("straighten", self.options.straighten),
            ("circle_blend", self.options.circle_blend),
        ];
        for (name, value) in params {
            if !value.is_finite() {
                return Err(LoftError::NonFiniteParameter { name, value });
            }
        }
        if let Some(value) = self.section_scales.and_then(|s| s.iter().copied().find(|v| !v.is_finite())) {
            return Err(LoftError::NonFiniteParameter {
                name: "section_scale",
                value,
            });
        }
        Ok(())
    }

    fn clamped_options(&self) -> LoftOptions {
        LoftOptions {
            scale: self.options.scale.clamp(0.0, 1.0),
            straighten: self.options.straighten.clamp(0.0, 1.0),
            circle_blend: self.options.circle_blend.clamp(0.0, 1.0),
            circle_sides: self.options.circle_sides.max(3),
            ..self.options
        }
    }

    fn section_scale(&self, index: usize) -> f64 {
        self.section_scales
            .and_then(|scales| scales.get(index).copied())
            .map_or(1.0, |s| s.clamp(0.0, 1.0))
    }

    fn spine_path(&self, diagnostics: &mut GeomMeshDiagnostics) -> Option<Polyline3> {
        if self.options.straighten <= 0.0 {
            return None;
        }
        if self.path.is_empty() {
            diagnostics.add_warning("straighten requested without a path; ignored");
            return None;
        }
        Polyline3::new(self.path.to_vec(), true).ok()
    }
}

/// Loft `sections` with the given options; see [`LoftMeshBuilder`].
pub fn loft_sections(
    sections: &[Vec<Point3>],
    path: &[Point3],
    options: LoftOptions,
) -> Result<LoftResult, LoftError> {
    LoftMeshBuilder::new(sections, options).with_path(path).build()
}

// ============================================================================
// Helpers
// ============================================================================

/// Resample a closed loop to `count` vertices by fractional index, wrapping
/// the last vertex back to the first.
pub(crate) fn resample_closed(points: &[Point3], count: usize) -> Vec<Point3> {
    (0..count)
        .map(|j| sample_closed_by_index(points, j as f64 / count as f64))
        .collect()
}

/// Spine tangent per ring from the neighbouring centroids.
fn ring_tangents(centroids: &[Point3], closed: bool, tol: Tolerance) -> Vec<Option<Vec3>> {
    let n = centroids.len();
    // In a closed loft the last ring duplicates the first.
    let unique = if closed { n - 1 } else { n };

    (0..n)
        .map(|r| {
            let (prev, next) = if closed && unique > 1 {
                let r = r % unique;
                ((r + unique - 1) % unique, (r + 1) % unique)
            } else {
                (r.saturating_sub(1), (r + 1).min(n - 1))
            };
            let d = centroids[next] - centroids[prev];
            if d.length() <= tol.eps { None } else { d.normalized() }
        })
        .collect()
}

fn mean_radius(ring: &[Point3], centroid: Point3) -> f64 {
    if ring.is_empty() {
        return 0.0;
    }
    ring.iter().map(|p| p.distance_to(centroid)).sum::<f64>() / ring.len() as f64
}

/// Regular polygon around `center` in the plane normal to `tangent`. The first
/// corner points toward `start` so the blend does not twist the seam.
fn regular_polygon(center: Point3, tangent: Vec3, start: Point3, radius: f64, sides: usize) -> Vec<Point3> {
    let toward_start = start - center;
    let in_plane = toward_start - tangent * toward_start.dot(tangent);
    let u = in_plane.normalized().unwrap_or_else(|| tangent.any_perpendicular());
    let w = tangent.cross(u).normalized_or(tangent.any_perpendicular());

    (0..sides)
        .map(|k| {
            let (sin, cos) = (TAU * k as f64 / sides as f64).sin_cos();
            center + u * (radius * cos) + w * (radius * sin)
        })
        .collect()
}
