use std::collections::HashMap;

use super::diagnostics::GeomMeshDiagnostics;
use super::{Point3, Tolerance};

/// Indexed triangle mesh in render-ready buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Option<Vec<[f64; 2]>>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            uvs: None,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        let n = self.positions.len();
        let attributes_match = self.uvs.as_ref().is_none_or(|uvs| uvs.len() == n)
            && self.normals.as_ref().is_none_or(|normals| normals.len() == n);
        if !attributes_match {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }

    /// Packed `[x0, y0, z0, x1, ...]` copy of the positions for JS typed arrays.
    #[must_use]
    pub fn positions_flat(&self) -> Vec<f32> {
        flatten(&self.positions)
    }

    #[must_use]
    pub fn normals_flat(&self) -> Option<Vec<f32>> {
        self.normals.as_deref().map(flatten)
    }

    #[must_use]
    pub fn uvs_flat(&self) -> Option<Vec<f32>> {
        self.uvs.as_deref().map(flatten)
    }
}

fn flatten<const N: usize>(data: &[[f64; N]]) -> Vec<f32> {
    data.iter().flat_map(|item| item.iter().map(|v| *v as f32)).collect()
}

/// Disjoint line segments: `positions[2i]..positions[2i + 1]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSegments {
    pub positions: Vec<[f64; 3]>,
}

impl LineSegments {
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }

    pub fn push(&mut self, a: Point3, b: Point3) {
        self.positions.push(a.to_array());
        self.positions.push(b.to_array());
    }

    /// Append the edges of a polyline, optionally closing it.
    pub fn push_polyline(&mut self, points: &[Point3], closed: bool) {
        for pair in points.windows(2) {
            self.push(pair[0], pair[1]);
        }
        if closed && points.len() > 2 {
            self.push(points[points.len() - 1], points[0]);
        }
    }
}

/// Instanced points (stars, lattice spheres) with per-instance size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    pub positions: Vec<[f64; 3]>,
    pub sizes: Vec<f64>,
}

impl PointSet {
    pub fn push(&mut self, position: Point3, size: f64) {
        self.positions.push(position.to_array());
        self.sizes.push(size);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Triangulate a stack of equally sized vertex rings laid out row-major.
///
/// Each ring wraps its own vertices (last connects to 0). When `wrap_rings`
/// is set the last ring also connects back to the first.
#[must_use]
pub(crate) fn stitch_rings(ring_count: usize, ring_size: usize, wrap_rings: bool) -> Vec<u32> {
    if ring_count < 2 || ring_size < 2 {
        return Vec::new();
    }
    let pairs = if wrap_rings { ring_count } else { ring_count - 1 };
    let mut indices = Vec::with_capacity(pairs * ring_size * 6);

    for r in 0..pairs {
        let r_next = (r + 1) % ring_count;
        for j in 0..ring_size {
            let j_next = (j + 1) % ring_size;

            let i0 = (r * ring_size + j) as u32;
            let i1 = (r * ring_size + j_next) as u32;
            let i2 = (r_next * ring_size + j_next) as u32;
            let i3 = (r_next * ring_size + j) as u32;

            indices.extend_from_slice(&[i0, i1, i2]);
            indices.extend_from_slice(&[i0, i2, i3]);
        }
    }

    indices
}

/// Assemble a mesh and its diagnostics. Unlike a repair pass this never welds
/// or drops triangles: ring layouts must keep their predictable index counts.
pub(crate) fn finalize_mesh(
    points: Vec<Point3>,
    uvs: Option<Vec<[f64; 2]>>,
    indices: Vec<u32>,
    compute_normals: bool,
    tol: Tolerance,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let degenerate_triangle_count = count_degenerate_triangles(&points, &indices, tol);
    let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&indices);

    let normals = compute_normals.then(|| compute_smooth_normals(&points, &indices));

    let mesh = GeomMesh {
        positions: points.into_iter().map(Point3::to_array).collect(),
        indices,
        uvs,
        normals,
    };

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        warnings: Vec::new(),
    };

    (mesh, diagnostics)
}

fn count_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> usize {
    indices
        .chunks_exact(3)
        .filter(|tri| {
            let (Some(a), Some(b), Some(c)) = (
                points.get(tri[0] as usize),
                points.get(tri[1] as usize),
                points.get(tri[2] as usize),
            ) else {
                return true;
            };
            (*b - *a).cross(*c - *a).length() <= tol.eps
        })
        .count()
}

fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }
        for (ea, eb) in [(i0, i1), (i1, i2), (i2, i0)] {
            let key = if ea <= eb { (ea, eb) } else { (eb, ea) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    edge_counts
        .values()
        .fold((0, 0), |(open, non_manifold), &count| match count {
            1 => (open + 1, non_manifold),
            c if c > 2 => (open, non_manifold + 1),
            _ => (open, non_manifold),
        })
}

/// Area-weighted vertex normals. Vertices without a non-degenerate adjacent
/// triangle get `+Z` instead of NaN.
pub(crate) fn compute_smooth_normals(points: &[Point3], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut normals = vec![[0.0, 0.0, 0.0]; points.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(a), Some(b), Some(c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let n = (*b - *a).cross(*c - *a);
        if !n.is_finite() {
            continue;
        }
        for i in [i0, i1, i2] {
            normals[i][0] += n.x;
            normals[i][1] += n.y;
            normals[i][2] += n.z;
        }
    }

    for n in &mut normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len.is_finite() && len > 0.0 {
            n[0] /= len;
            n[1] /= len;
            n[2] /= len;
        } else {
            *n = [0.0, 0.0, 1.0];
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stitch_open_rings_counts_quads() {
        let indices = stitch_rings(3, 4, false);
        assert_eq!(indices.len() / 3, 2 * 4 * 2);
        assert!(indices.iter().all(|&i| i < 12));
    }

    #[test]
    fn stitch_wrapped_rings_references_first_ring() {
        let indices = stitch_rings(3, 4, true);
        assert_eq!(indices.len() / 3, 3 * 4 * 2);
        // last ring pair wraps back to ring 0
        let last_quad = &indices[indices.len() - 6..];
        assert!(last_quad.iter().any(|&i| i < 4));
        assert!(last_quad.iter().any(|&i| i >= 8));
    }

    #[test]
    fn stitch_rejects_too_few_rings() {
        assert!(stitch_rings(1, 8, true).is_empty());
        assert!(stitch_rings(4, 1, false).is_empty());
    }

    #[test]
    fn finalize_counts_open_edges_of_a_square() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        let (mesh, diag) = finalize_mesh(points, None, indices, true, Tolerance::default_geom());

        assert_eq!(diag.triangle_count, 2);
        assert_eq!(diag.open_edge_count, 4);
        assert_eq!(diag.degenerate_triangle_count, 0);
        let normals = mesh.normals.as_ref().unwrap();
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-12);
        }
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn collapsed_triangles_get_default_normals() {
        let points = vec![Point3::ORIGIN; 3];
        let (mesh, diag) =
            finalize_mesh(points, None, vec![0, 1, 2], true, Tolerance::default_geom());
        assert_eq!(diag.degenerate_triangle_count, 1);
        assert_eq!(mesh.normals.unwrap()[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn line_segments_close_polylines() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let mut open = LineSegments::default();
        open.push_polyline(&pts, false);
        assert_eq!(open.segment_count(), 2);

        let mut closed = LineSegments::default();
        closed.push_polyline(&pts, true);
        assert_eq!(closed.segment_count(), 3);
        assert_eq!(closed.positions[5], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn flat_buffers_follow_vertex_order() {
        let mesh = GeomMesh::new(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], Vec::new());
        assert_eq!(mesh.positions_flat(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(mesh.normals_flat().is_none());
    }
}
