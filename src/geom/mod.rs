mod core;
mod curve;
mod diagnostics;
mod grow;
mod lattice;
mod loft;
mod mesh;
mod morph;
mod pipe;
mod point_cloud;
mod spatial_hash;

pub use core::{BBox, Point3, Tolerance, Vec3, lerp_f64, remap_unit, smoothstep};
pub use curve::{
    ClosedCardinalSpline, Polyline3, closed_catmull_rom, sample_closed_by_index,
};
pub use diagnostics::GeomMeshDiagnostics;
pub use grow::{
    GrowOptions, grow_loft, grow_loft_along, included_section_count, section_scale, section_scales,
};
pub use lattice::{
    COPLANAR_DOT_THRESHOLD, LatticeAnalysis, LatticeDescriptor, LatticeType, PARALLEL_DOT_THRESHOLD,
    analyze_lattice, derive_basis_vectors, generate_lattice_points,
};
pub use loft::{DEFAULT_UP, LoftError, LoftMeshBuilder, LoftOptions, LoftResult, loft_sections};
pub use mesh::{GeomMesh, LineSegments, PointSet};
pub use morph::{CurveAlignment, MorphOptions, align_curve, morph_samples, morph_tube};
pub use pipe::{PipeError, PipeOptions, pipe_rail, pipe_rail_with_tolerance};
pub use point_cloud::{
    PointCloudPair, cosmic_count, pair_nearest_unclaimed, random_points_in_sphere,
};
pub use spatial_hash::{Bond, BondSearchOptions, SpatialHash, find_bonds, find_bonds_brute_force};

#[cfg(test)]
mod tests;
