//! The five chapters of the animated experience.
//!
//! A chapter owns its slider value and any animation state it explicitly
//! retains (random pools, reveal counters). [`Chapter::build`] is a pure
//! function of that state and the shared [`ChapterContext`]: calling it twice
//! without an intervening [`Chapter::set_value`] or [`Chapter::advance`]
//! yields identical geometry.

pub mod curved;
pub mod paths;
pub mod phase;
pub mod points;
pub mod profiled;
pub mod story;
pub mod structure;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::geom::{GeomMesh, LineSegments, LoftError, PipeError, PointCloudPair, PointSet};
use crate::scene::SculptureData;

pub use curved::CurvedChapter;
pub use paths::PathsChapter;
pub use points::PointsChapter;
pub use profiled::ProfiledChapter;
pub use story::{StoryState, story_state};
pub use structure::StructureChapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterKind {
    Points,
    Paths,
    Structure,
    Curved,
    Profiled,
}

impl ChapterKind {
    /// Story order.
    pub const ALL: [Self; 5] = [
        Self::Points,
        Self::Paths,
        Self::Structure,
        Self::Curved,
        Self::Profiled,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Paths => "paths",
            Self::Structure => "structure",
            Self::Curved => "curved",
            Self::Profiled => "profiled",
        }
    }
}

impl fmt::Display for ChapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChapterKind {
    type Err = ChapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ChapterError::UnknownChapter(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("onbekend hoofdstuk `{0}`")]
    UnknownChapter(String),
    #[error(transparent)]
    Loft(#[from] LoftError),
    #[error(transparent)]
    Pipe(#[from] PipeError),
}

/// Stable id of one visual element, owned by the orchestration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualHandle {
    pub chapter: ChapterKind,
    pub slot: u16,
}

impl VisualHandle {
    #[must_use]
    pub const fn new(chapter: ChapterKind, slot: u16) -> Self {
        Self { chapter, slot }
    }

    /// Numeric id exported to the page.
    #[must_use]
    pub fn id(self) -> u32 {
        ((self.chapter.index() as u32) << 16) | u32::from(self.slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualGeometry {
    Mesh(GeomMesh),
    Lines(LineSegments),
    Points(PointSet),
}

impl VisualGeometry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Mesh(mesh) => mesh.is_empty(),
            Self::Lines(lines) => lines.segment_count() == 0,
            Self::Points(points) => points.is_empty(),
        }
    }
}

/// Per-draw render parameters. Nothing is shared between visuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: [f64; 3],
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub geometry: VisualGeometry,
    pub style: DrawStyle,
}

impl Visual {
    #[must_use]
    pub fn new(geometry: VisualGeometry, color: [f64; 3], opacity: f64) -> Self {
        Self {
            geometry,
            style: DrawStyle {
                color,
                opacity: opacity.clamp(0.0, 1.0),
            },
        }
    }
}

/// Visuals produced by one chapter build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChapterOutput {
    visuals: Vec<(VisualHandle, Visual)>,
}

impl ChapterOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visual unless it has no geometry or is fully transparent.
    pub fn push(&mut self, handle: VisualHandle, visual: Visual) {
        if visual.geometry.is_empty() || visual.style.opacity <= 0.0 {
            return;
        }
        self.visuals.push((handle, visual));
    }

    #[must_use]
    pub fn visuals(&self) -> &[(VisualHandle, Visual)] {
        &self.visuals
    }

    #[must_use]
    pub fn get(&self, handle: VisualHandle) -> Option<&Visual> {
        self.visuals.iter().find(|(h, _)| *h == handle).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }
}

/// Shared, read-only inputs of a chapter build.
#[derive(Debug, Clone, Copy)]
pub struct ChapterContext<'a> {
    pub sculpture: &'a SculptureData,
    pub stars: &'a PointCloudPair,
    pub config: &'a EngineConfig,
    pub galaxy_radius: f64,
}

impl ChapterContext<'_> {
    #[must_use]
    pub fn lattice_constant(&self) -> f64 {
        self.sculpture.lattice().constant
    }

    #[must_use]
    pub fn star_size(&self) -> f64 {
        self.lattice_constant() * self.config.star_size_factor
    }

    #[must_use]
    pub fn sphere_radius(&self) -> f64 {
        self.lattice_constant() * self.config.sphere_radius_factor
    }

    #[must_use]
    pub fn tube_radius(&self) -> f64 {
        self.lattice_constant() * self.config.tube_radius_factor
    }
}

pub trait Chapter {
    fn kind(&self) -> ChapterKind;

    fn value(&self) -> f64;

    /// Store a new slider value, clamped to `[0, 100]`.
    fn set_value(&mut self, value: f64);

    fn build(&self, ctx: &ChapterContext<'_>) -> Result<ChapterOutput, ChapterError>;

    /// Advance time-driven animation by `dt` seconds. Returns whether the
    /// next build differs from the previous one.
    fn advance(&mut self, _dt: f64, _ctx: &ChapterContext<'_>) -> bool {
        false
    }

    /// Back to value 0 with fresh animation state.
    fn reset(&mut self);
}

/// One chapter instance per kind, in story order.
#[must_use]
pub fn create_chapters(seed: u64) -> Vec<Box<dyn Chapter>> {
    vec![
        Box::new(PointsChapter::new()),
        Box::new(PathsChapter::new(seed)),
        Box::new(StructureChapter::new()),
        Box::new(CurvedChapter::new()),
        Box::new(ProfiledChapter::new()),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::scene::SculptureAsset;

    /// Closed right-angle staircase of unit steps with three cross-sections.
    pub fn sculpture() -> SculptureData {
        let path = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 0.0, 1.0],
        ];
        let mut cross_sections = std::collections::BTreeMap::new();
        for (i, x) in [0.2, 0.5, 0.8].into_iter().enumerate() {
            cross_sections.insert(
                format!("section {i}"),
                vec![[x, -0.1, -0.1], [x, 0.1, -0.1], [x, 0.1, 0.1], [x, -0.1, 0.1]],
            );
        }
        SculptureData::from_asset(SculptureAsset {
            path,
            curve: None,
            cross_sections,
        })
        .expect("fixture sculpture is valid")
    }

    pub fn stars(sculpture: &SculptureData, radius: f64) -> PointCloudPair {
        let lattice = sculpture
            .lattice()
            .points_in_sphere(sculpture.center(), sculpture.radius() + 1.0);
        PointCloudPair::build(&lattice, sculpture.corners().len(), sculpture.center(), radius, 11)
    }
}
