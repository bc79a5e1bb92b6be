//! Profiled chapter: the sculpture body is lofted through its cross-sections.
//!
//! Over 0–25 the finished curve tube shifts from the debug color to the
//! material color. Over 25–100 the loft grows section by section along the
//! path while the tube fades.

use super::phase::clamp_slider;
use super::{Chapter, ChapterContext, ChapterError, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle};
use crate::geom::{grow_loft_along, lerp_f64, morph_tube, remap_unit};

pub const TUBE: VisualHandle = VisualHandle::new(ChapterKind::Profiled, 0);
pub const BODY: VisualHandle = VisualHandle::new(ChapterKind::Profiled, 1);

/// Blend from debug color to material color.
#[must_use]
pub fn color_blend(value: f64) -> f64 {
    remap_unit(value, 0.0, 25.0)
}

/// Travel fraction of the progressive loft.
#[must_use]
pub fn sweep_progress(value: f64) -> f64 {
    remap_unit(value, 25.0, 100.0)
}

fn blend_color(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [lerp_f64(a[0], b[0], t), lerp_f64(a[1], b[1], t), lerp_f64(a[2], b[2], t)]
}

#[derive(Debug, Clone, Default)]
pub struct ProfiledChapter {
    value: f64,
}

impl ProfiledChapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chapter for ProfiledChapter {
    fn kind(&self) -> ChapterKind {
        ChapterKind::Profiled
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
        let color = blend_color(config.debug_color, config.material_color, color_blend(v));
        let sweep = sweep_progress(v);
        let mut output = ChapterOutput::new();

        let corners = ctx.sculpture.corners();
        if corners.len() >= 2 {
            let (mesh, _) = morph_tube(
                corners,
                ctx.sculpture.curve(),
                1.0,
                ctx.tube_radius(),
                &config.morph_options(),
            )?;
            output.push(TUBE, Visual::new(VisualGeometry::Mesh(mesh), color, 1.0 - sweep));
        }

        if sweep > 0.0 {
            let sections = ctx.sculpture.section_loops_by_intersection();
            let grown = grow_loft_along(&sections, corners, sweep, &config.grow_options())?;
            if grown.diagnostics.has_warnings() {
                log::debug!("profiled loft: {}", grown.diagnostics);
            }
            output.push(BODY, Visual::new(VisualGeometry::Mesh(grown.mesh), color, 1.0));
        }

        Ok(output)
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}
