//! Curved chapter: the lattice dissolves and the path tube relaxes into the
//! smooth sculpture curve.
//!
//! Spheres and bonds shrink and fade over 0–50. Over 50–100 the tube morphs
//! from the straight path to the aligned curve.

use super::phase::clamp_slider;
use super::structure::{bond_lines, sphere_set};
use super::{Chapter, ChapterContext, ChapterError, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle};
use crate::geom::{morph_tube, remap_unit};

pub const TUBE: VisualHandle = VisualHandle::new(ChapterKind::Curved, 0);
pub const SPHERES: VisualHandle = VisualHandle::new(ChapterKind::Curved, 1);
pub const BONDS: VisualHandle = VisualHandle::new(ChapterKind::Curved, 2);

/// Remaining share of the lattice spheres and bonds.
#[must_use]
pub fn dissolve(value: f64) -> f64 {
    1.0 - remap_unit(value, 0.0, 50.0)
}

/// Morph progress from straight path to smooth curve.
#[must_use]
pub fn curve_progress(value: f64) -> f64 {
    ((value - 50.0) / 50.0).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Default)]
pub struct CurvedChapter {
    value: f64,
}

impl CurvedChapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chapter for CurvedChapter {
    fn kind(&self) -> ChapterKind {
        ChapterKind::Curved
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn set_value(&mut self, value: f64) {
        self.value = clamp_slider(value);
    }

    fn build(&self, ctx: &ChapterContext<'_>) -> Result<ChapterOutput, ChapterError> {
        let v = self.value;
        let config = ctx.config;
        let mut output = ChapterOutput::new();

        let remaining = dissolve(v);
        if remaining > 0.0 {
            let sites = ctx.stars.lattice();
            output.push(
                SPHERES,
                Visual::new(
                    VisualGeometry::Points(sphere_set(sites, ctx.sphere_radius() * remaining)),
                    config.material_color,
                    remaining,
                ),
            );
            output.push(
                BONDS,
                Visual::new(VisualGeometry::Lines(bond_lines(ctx, sites)), config.line_color, remaining),
            );
        }

        let corners = ctx.sculpture.corners();
        if corners.len() >= 2 {
            let (mesh, _) = morph_tube(
                corners,
                ctx.sculpture.curve(),
                curve_progress(v),
                ctx.tube_radius(),
                &config.morph_options(),
            )?;
            output.push(TUBE, Visual::new(VisualGeometry::Mesh(mesh), config.line_color, 1.0));
        }

        Ok(output)
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::test_support;
    use crate::config::EngineConfig;

    #[test]
    fn curve_progress_starts_halfway() {
        assert_eq!(curve_progress(25.0), 0.0);
        assert_eq!(curve_progress(75.0), 0.5);
        assert_eq!(curve_progress(100.0), 1.0);
        assert_eq!(dissolve(25.0), 0.5);
        assert_eq!(dissolve(60.0), 0.0);
    }

    #[test]
    fn lattice_is_gone_after_dissolve() {
        let sculpture = test_support::sculpture();
        let stars = test_support::stars(&sculpture, 6.0);
        let config = EngineConfig::default();
        let ctx = ChapterContext {
            sculpture: &sculpture,
            stars: &stars,
            config: &config,
            galaxy_radius: 6.0,
        };
        let mut chapter = CurvedChapter::new();
        chapter.set_value(10.0);
        let early = chapter.build(&ctx).unwrap();
        assert!(early.get(SPHERES).is_some());

        chapter.set_value(80.0);
        let late = chapter.build(&ctx).unwrap();
        assert!(late.get(SPHERES).is_none());
        assert!(late.get(BONDS).is_none());
        let Some(VisualGeometry::Mesh(mesh)) = late.get(TUBE).map(|v| &v.geometry) else {
            panic!("expected tube mesh");
        };
        assert!(!mesh.has_invalid_vertices());
    }
}
