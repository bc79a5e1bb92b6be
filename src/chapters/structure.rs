//! Structure chapter: stars condense onto the lattice.
//!
//! | range  | content                                                     |
//! |--------|-------------------------------------------------------------|
//! | 0–25   | tube along the sculpture path grows to full radius          |
//! | 25–50  | lattice spheres fade in up to 30% of their final radius     |
//! | 50–90  | selected stars pulled onto their lattice sites, eased in    |
//! | 90–100 | hold                                                        |
//!
//! Stars without a lattice partner fade out over 0–80. Bonds are found on the
//! lattice targets and drawn between the stars' current positions.

use super::phase::{clamp_slider, ease_in_quad};
use super::{Chapter, ChapterContext, ChapterError, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle};
use crate::geom::{LineSegments, Point3, PointSet, find_bonds, pipe_rail, remap_unit};

pub const TUBE: VisualHandle = VisualHandle::new(ChapterKind::Structure, 0);
pub const SPHERES: VisualHandle = VisualHandle::new(ChapterKind::Structure, 1);
pub const SELECTED_STARS: VisualHandle = VisualHandle::new(ChapterKind::Structure, 2);
pub const OTHER_STARS: VisualHandle = VisualHandle::new(ChapterKind::Structure, 3);
pub const BONDS: VisualHandle = VisualHandle::new(ChapterKind::Structure, 4);

/// Sphere radius fraction reached at the end of the fade-in.
pub const SPHERE_FADE_SCALE: f64 = 0.3;

/// Radius of the path tube as a fraction of its final radius.
#[must_use]
pub fn tube_factor(value: f64) -> f64 {
    remap_unit(value, 0.0, 25.0)
}

/// Lattice sphere radius as a fraction of its final radius.
#[must_use]
pub fn sphere_scale(value: f64) -> f64 {
    if value < 50.0 {
        SPHERE_FADE_SCALE * remap_unit(value, 25.0, 50.0)
    } else {
        SPHERE_FADE_SCALE + (1.0 - SPHERE_FADE_SCALE) * remap_unit(value, 50.0, 90.0)
    }
}

/// Blend from cosmic to lattice position of the selected stars.
#[must_use]
pub fn pull(value: f64) -> f64 {
    ease_in_quad(remap_unit(value, 50.0, 90.0))
}

/// Opacity of the stars without a lattice partner.
#[must_use]
pub fn other_star_opacity(value: f64) -> f64 {
    1.0 - remap_unit(value, 0.0, 80.0)
}

/// Bonds between lattice neighbours, drawn at `positions`.
pub(crate) fn bond_lines(ctx: &ChapterContext<'_>, positions: &[Point3]) -> LineSegments {
    let lattice = ctx.stars.lattice();
    let bonds = find_bonds(lattice, ctx.config.bond_options(ctx.lattice_constant()));
    let mut lines = LineSegments::default();
    for bond in bonds {
        if let (Some(a), Some(b)) = (positions.get(bond.a), positions.get(bond.b)) {
            lines.push(*a, *b);
        }
    }
    lines
}

pub(crate) fn sphere_set(positions: &[Point3], radius: f64) -> PointSet {
    let mut spheres = PointSet::default();
    for p in positions {
        spheres.push(*p, radius);
    }
    spheres
}

#[derive(Debug, Clone, Default)]
pub struct StructureChapter {
    value: f64,
}

impl StructureChapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Chapter for StructureChapter {
    fn kind(&self) -> ChapterKind {
        ChapterKind::Structure
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

        let factor = tube_factor(v);
        let corners = ctx.sculpture.corners();
        if factor > 0.0 && corners.len() >= 2 {
            let (mesh, _) = pipe_rail(corners, ctx.tube_radius() * factor, true, config.pipe_options())?;
            output.push(TUBE, Visual::new(VisualGeometry::Mesh(mesh), config.line_color, 1.0));
        }

        let blend = pull(v);
        let current: Vec<Point3> = (0..ctx.stars.paired_count())
            .filter_map(|i| ctx.stars.position(i, blend))
            .collect();

        let sphere_opacity = remap_unit(v, 25.0, 50.0);
        let scale = sphere_scale(v);
        if scale > 0.0 {
            output.push(
                SPHERES,
                Visual::new(
                    VisualGeometry::Points(sphere_set(&current, ctx.sphere_radius() * scale)),
                    config.material_color,
                    sphere_opacity,
                ),
            );
        }

        output.push(
            SELECTED_STARS,
            Visual::new(
                VisualGeometry::Points(sphere_set(&current, ctx.star_size())),
                config.star_color,
                1.0 - sphere_opacity,
            ),
        );
        output.push(
            OTHER_STARS,
            Visual::new(
                VisualGeometry::Points(sphere_set(ctx.stars.unpaired(), ctx.star_size())),
                config.star_color,
                other_star_opacity(v),
            ),
        );

        let bond_opacity = remap_unit(v, 50.0, 90.0);
        if bond_opacity > 0.0 {
            output.push(
                BONDS,
                Visual::new(
                    VisualGeometry::Lines(bond_lines(ctx, &current)),
                    config.line_color,
                    bond_opacity,
                ),
            );
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
    fn phase_curves_hit_their_breakpoints() {
        assert_eq!(tube_factor(12.5), 0.5);
        assert_eq!(sphere_scale(25.0), 0.0);
        assert!((sphere_scale(50.0) - 0.3).abs() < 1e-12);
        assert_eq!(sphere_scale(90.0), 1.0);
        assert_eq!(pull(70.0), 0.25);
        assert_eq!(other_star_opacity(80.0), 0.0);
        assert_eq!(other_star_opacity(100.0), 0.0);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let sculpture = test_support::sculpture();
        let stars = test_support::stars(&sculpture, 6.0);
        let config = EngineConfig::default();
        let ctx = ChapterContext {
            sculpture: &sculpture,
            stars: &stars,
            config: &config,
            galaxy_radius: 6.0,
        };
        let mut chapter = StructureChapter::new();
        chapter.set_value(72.5);
        let a = chapter.build(&ctx).unwrap();
        let b = chapter.build(&ctx).unwrap();
        assert_eq!(a, b);
        assert!(a.get(TUBE).is_some());
        assert!(a.get(BONDS).is_some());
    }

    #[test]
    fn bonds_follow_the_moving_stars() {
        let sculpture = test_support::sculpture();
        let stars = test_support::stars(&sculpture, 6.0);
        let config = EngineConfig::default();
        let ctx = ChapterContext {
            sculpture: &sculpture,
            stars: &stars,
            config: &config,
            galaxy_radius: 6.0,
        };
        let mut chapter = StructureChapter::new();
        chapter.set_value(100.0);
        let output = chapter.build(&ctx).unwrap();
        let Some(VisualGeometry::Lines(lines)) = output.get(BONDS).map(|v| &v.geometry) else {
            panic!("expected bond lines");
        };
        let constant = sculpture.lattice().constant;
        for pair in lines.positions.chunks(2) {
            let d = Point3::from(pair[0]).distance_to(Point3::from(pair[1]));
            assert!(d <= constant * 1.1 + 1e-9);
        }
        assert!(output.get(OTHER_STARS).is_none());
    }
}
