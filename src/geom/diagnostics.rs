//! Mesh diagnostics for generated sculpture geometry.
//!
//! Every builder in `geom` returns diagnostics next to its mesh. Geometry
//! builders never fail on degenerate input; instead they fall back to a safe
//! default and record what happened in `warnings`, so the caller can log it
//! and keep rendering.
//!
//! # Example
//!
//! ```ignore
//! use sculpture_engine::geom::{LoftOptions, loft_sections};
//!
//! let result = loft_sections(&sections, &path, LoftOptions::closed())?;
//! if !result.diagnostics.is_watertight() {
//!     log::debug!("loft has {} open edges", result.diagnostics.open_edge_count);
//! }
//! for warning in &result.diagnostics.warnings {
//!     log::warn!("{warning}");
//! }
//! ```

use std::fmt;

/// Topology counts and fallback warnings for a generated mesh.
///
/// - `open_edge_count`: edges with exactly one adjacent triangle
/// - `non_manifold_edge_count`: edges with more than two adjacent triangles
/// - `degenerate_triangle_count`: triangles with a repeated index or zero area
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Triangles whose three corners are coincident or collinear.
    ///
    /// They are kept in the index buffer so that triangle counts stay
    /// predictable for a given section layout; collapsed sections produce them
    /// on purpose (scale = 0).
    pub degenerate_triangle_count: usize,

    /// Number of open (boundary) edges.
    pub open_edge_count: usize,

    /// Number of non-manifold edges.
    pub non_manifold_edge_count: usize,

    /// Human-readable notes about fallbacks taken while building.
    ///
    /// Examples:
    /// - "section 3 has fewer than 3 vertices; using default up-vector"
    /// - "loft needs at least 2 sections; produced empty mesh"
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mesh has no open edges.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Merge warnings collected by a nested build step.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vertices, {} triangles, {} open edges, {} non-manifold edges, {} degenerate",
            self.vertex_count,
            self.triangle_count,
            self.open_edge_count,
            self.non_manifold_edge_count,
            self.degenerate_triangle_count,
        )?;
        if !self.warnings.is_empty() {
            write!(f, " ({} warnings)", self.warnings.len())?;
        }
        Ok(())
    }
}
