//! Points chapter: the cosmic star field fades in.

use super::phase::clamp_slider;
use super::{Chapter, ChapterContext, ChapterError, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle};
use crate::geom::{PointSet, lerp_f64, remap_unit};

pub const STARS: VisualHandle = VisualHandle::new(ChapterKind::Points, 0);

/// Golden-ratio stride; spreads the reveal order evenly over the field.
const REVEAL_STRIDE: f64 = 0.618_033_988_749_895;

/// Slider value at which each star appears, in `[0, 1)`.
#[must_use]
pub fn reveal_threshold(index: usize) -> f64 {
    (index as f64 * REVEAL_STRIDE).fract()
}

/// Stars whose reveal threshold is below `progress`, drawn at `size`.
#[must_use]
pub fn star_field(ctx: &ChapterContext<'_>, progress: f64, size: f64) -> PointSet {
    let mut points = PointSet::default();
    for (i, star) in ctx.stars.cosmic().iter().enumerate() {
        if reveal_threshold(i) < progress {
            points.push(*star, size);
        }
    }
    points
}

#[derive(Debug, Clone, Default)]
pub struct PointsChapter {
    value: f64,
}

impl PointsChapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chapter for PointsChapter {
    fn kind(&self) -> ChapterKind {
        ChapterKind::Points
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn set_value(&mut self, value: f64) {
        self.value = clamp_slider(value);
    }

    fn build(&self, ctx: &ChapterContext<'_>) -> Result<ChapterOutput, ChapterError> {
        let v = self.value;
        let reveal = remap_unit(v, 0.0, 60.0);
        let size = ctx.star_size() * lerp_f64(0.5, 1.0, remap_unit(v, 40.0, 100.0));
        let opacity = remap_unit(v, 0.0, 30.0);

        let mut output = ChapterOutput::new();
        output.push(
            STARS,
            Visual::new(
                VisualGeometry::Points(star_field(ctx, reveal, size)),
                ctx.config.star_color,
                opacity,
            ),
        );
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
    fn stars_appear_gradually() {
        let sculpture = test_support::sculpture();
        let stars = test_support::stars(&sculpture, 6.0);
        let config = EngineConfig::default();
        let ctx = ChapterContext {
            sculpture: &sculpture,
            stars: &stars,
            config: &config,
            galaxy_radius: 6.0,
        };

        let mut chapter = PointsChapter::new();
        assert!(chapter.build(&ctx).unwrap().is_empty());

        let mut counts = Vec::new();
        for v in [15.0, 30.0, 60.0, 100.0] {
            chapter.set_value(v);
            let output = chapter.build(&ctx).unwrap();
            match &output.get(STARS).unwrap().geometry {
                VisualGeometry::Points(points) => counts.push(points.len()),
                other => panic!("expected points, got {other:?}"),
            }
        }
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(counts[3], stars.len());
    }

    #[test]
    fn thresholds_stay_in_unit_range() {
        assert_eq!(reveal_threshold(0), 0.0);
        assert!((0..1000).map(reveal_threshold).all(|t| (0.0..1.0).contains(&t)));
    }
}
