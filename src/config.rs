//! Engine tunables supplied by the page.

use serde::Deserialize;

use crate::geom::{
    BondSearchOptions, GrowOptions, LoftOptions, MorphOptions, PipeOptions,
};

/// Seconds needed by `play_chapter` to ramp each chapter from 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChapterDurations {
    pub points: f64,
    pub paths: f64,
    pub structure: f64,
    pub curved: f64,
    pub profiled: f64,
}

impl Default for ChapterDurations {
    fn default() -> Self {
        Self {
            points: 6.0,
            paths: 24.0,
            structure: 12.0,
            curved: 10.0,
            profiled: 14.0,
        }
    }
}

/// Every field is optional on the JS side; missing fields keep their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Radius of the random star field. `None` derives it from the sculpture.
    pub galaxy_radius: Option<f64>,
    pub seed: u64,
    pub neighbor_k: usize,
    /// Spatial hash cell size as a multiple of the lattice constant.
    pub cell_size_factor: f64,
    /// Bond length cut-off as a multiple of the lattice constant.
    pub max_distance_factor: f64,
    pub durations: ChapterDurations,
    pub max_frame_delta: f64,
    pub loft_min_vertex_count: usize,
    pub circle_sides: usize,
    pub circle_blend_threshold: f64,
    pub tip_ahead: f64,
    pub taper: f64,
    /// Loft profile deformation applied to the grown sculpture body.
    pub profile_scale: f64,
    pub profile_straighten: f64,
    pub profile_circle_blend: f64,
    pub morph_samples_per_corner: usize,
    pub radial_segments: usize,
    /// Viewpoints per second during camera traversal.
    pub camera_speed: f64,
    /// Star size as a multiple of the lattice constant.
    pub star_size_factor: f64,
    /// Final lattice sphere radius as a multiple of the lattice constant.
    pub sphere_radius_factor: f64,
    /// Path tube radius as a multiple of the lattice constant.
    pub tube_radius_factor: f64,
    pub star_color: [f64; 3],
    pub line_color: [f64; 3],
    pub debug_color: [f64; 3],
    pub material_color: [f64; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            galaxy_radius: None,
            seed: 7,
            neighbor_k: BondSearchOptions::DEFAULT_K,
            cell_size_factor: BondSearchOptions::CELL_FACTOR,
            max_distance_factor: BondSearchOptions::DISTANCE_FACTOR,
            durations: ChapterDurations::default(),
            max_frame_delta: 0.1,
            loft_min_vertex_count: 32,
            circle_sides: 32,
            circle_blend_threshold: 0.95,
            tip_ahead: 0.12,
            taper: 0.30,
            profile_scale: 1.0,
            profile_straighten: 0.0,
            profile_circle_blend: 0.0,
            morph_samples_per_corner: 16,
            radial_segments: 16,
            camera_speed: 0.1,
            star_size_factor: 0.08,
            sphere_radius_factor: 0.15,
            tube_radius_factor: 0.06,
            star_color: [1.0, 1.0, 1.0],
            line_color: [0.55, 0.75, 1.0],
            debug_color: [1.0, 0.0, 0.0],
            material_color: [0.86, 0.84, 0.8],
        }
    }
}

impl EngineConfig {
    /// Star field radius for a sculpture of `sculpture_radius` built on a
    /// lattice of `constant`.
    #[must_use]
    pub fn resolved_galaxy_radius(&self, sculpture_radius: f64, constant: f64) -> f64 {
        match self.galaxy_radius {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => (sculpture_radius * 2.5).max(constant * 4.0),
        }
    }

    #[must_use]
    pub fn bond_options(&self, constant: f64) -> BondSearchOptions {
        BondSearchOptions {
            cell_size: constant * self.cell_size_factor,
            max_distance: constant * self.max_distance_factor,
            k: self.neighbor_k,
        }
        .normalized()
    }

    #[must_use]
    pub fn pipe_options(&self) -> PipeOptions {
        PipeOptions::with_radial_segments(self.radial_segments)
    }

    #[must_use]
    pub fn morph_options(&self) -> MorphOptions {
        MorphOptions {
            samples_per_corner: self.morph_samples_per_corner.max(1),
            pipe: self.pipe_options(),
            ..MorphOptions::default()
        }
    }

    #[must_use]
    pub fn loft_options(&self, closed: bool) -> LoftOptions {
        let base = if closed { LoftOptions::closed() } else { LoftOptions::open() };
        LoftOptions {
            scale: self.profile_scale,
            straighten: self.profile_straighten,
            circle_blend: self.profile_circle_blend,
            min_vertex_count: self.loft_min_vertex_count,
            circle_sides: self.circle_sides,
            circle_blend_threshold: self.circle_blend_threshold,
            ..base
        }
    }

    #[must_use]
    pub fn grow_options(&self) -> GrowOptions {
        GrowOptions {
            tip_ahead: self.tip_ahead,
            taper: self.taper,
            loft: self.loft_options(false),
        }
    }

    /// Play duration for chapter slot `index` in story order.
    #[must_use]
    pub fn duration(&self, index: usize) -> f64 {
        let d = &self.durations;
        [d.points, d.paths, d.structure, d.curved, d.profiled]
            .get(index)
            .copied()
            .unwrap_or(0.0)
    }
}
