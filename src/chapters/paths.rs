//! Paths chapter: lines drawn between stars.
//!
//! Sub-phases over the slider:
//!
//! | range  | content                                              |
//! |--------|------------------------------------------------------|
//! | 0–20   | shooting stars, 1 to 9 at once                       |
//! | 20–40  | random-walk paths between nearby stars               |
//! | 40–55  | triangle, square and pentagon, revealed per segment  |
//! | 55–70  | two constellations, the second one staggered         |
//! | 70–100 | the sculpture path, revealed in three cycles         |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::phase::{Breakpoints, clamp_slider, cyclic_reveal};
use super::points::star_field;
use super::{Chapter, ChapterContext, ChapterError, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle};
use crate::geom::{LineSegments, Point3, Vec3};
use crate::scene::figures::{CONSTELLATIONS, Figure, FigureKind, SHAPES};

pub const STARS: VisualHandle = VisualHandle::new(ChapterKind::Paths, 0);
pub const SHOOTING_STARS: VisualHandle = VisualHandle::new(ChapterKind::Paths, 1);
pub const GROWING_PATHS: VisualHandle = VisualHandle::new(ChapterKind::Paths, 2);
pub const SHAPES_VISUAL: VisualHandle = VisualHandle::new(ChapterKind::Paths, 3);
pub const CONSTELLATIONS_VISUAL: VisualHandle = VisualHandle::new(ChapterKind::Paths, 4);
pub const SCULPTURE_PATH: VisualHandle = VisualHandle::new(ChapterKind::Paths, 5);

const BREAKPOINTS: Breakpoints<6> = Breakpoints::new([0.0, 20.0, 40.0, 55.0, 70.0, 100.0]);

pub const MAX_SHOOTING_STARS: usize = 9;
pub const MAX_GROWING_PATHS: usize = 5;
pub const MIN_PATH_SEGMENTS: usize = 2;
pub const MAX_PATH_SEGMENTS: usize = 10;
/// Seconds between two revealed figure segments.
pub const REVEAL_INTERVAL: f64 = 0.08;
/// Local progress at which the second constellation starts.
pub const CONSTELLATION_STAGGER: f64 = 0.5;
pub const PATH_REVEAL_CYCLES: u32 = 3;

const SHOOTING_LENGTH: f64 = 0.2;
const SHOOTING_TAIL: f64 = 0.25;
const SHAPE_SCALE: f64 = 0.08;
const CONSTELLATION_SCALE: f64 = 0.15;

const WALK_SALT: u64 = 0x5741_4c4b;
const FIGURE_SALT: u64 = 0x4649_4755;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathsPhase {
    ShootingStars,
    GrowingPaths,
    Shapes,
    Constellations,
    PathReveal,
}

impl PathsPhase {
    #[must_use]
    pub fn locate(value: f64) -> (Self, f64) {
        let (index, progress) = BREAKPOINTS.locate(value);
        let phase = match index {
            0 => Self::ShootingStars,
            1 => Self::GrowingPaths,
            2 => Self::Shapes,
            3 => Self::Constellations,
            _ => Self::PathReveal,
        };
        (phase, progress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ShootingStar {
    /// Reduced modulo the star count at build time.
    origin: u64,
    direction: Vec3,
    speed: f64,
    progress: f64,
}

impl ShootingStar {
    fn spawn(rng: &mut StdRng) -> Self {
        let direction = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        )
        .normalized_or(Vec3::X);
        Self {
            origin: rng.random(),
            direction,
            speed: rng.random_range(0.3..0.8),
            progress: rng.random_range(0.0..1.0),
        }
    }

    fn segment(&self, stars: &[Point3], length: f64) -> Option<(Point3, Point3)> {
        if stars.is_empty() {
            return None;
        }
        let origin = stars[(self.origin % stars.len() as u64) as usize];
        let head = origin + self.direction * (length * self.progress);
        let tail = origin + self.direction * (length * (self.progress - SHOOTING_TAIL).max(0.0));
        Some((tail, head))
    }
}

/// Number of shooting stars at local progress `g`.
#[must_use]
pub fn shooting_star_count(g: f64) -> usize {
    ((g.clamp(0.0, 1.0) * MAX_SHOOTING_STARS as f64).ceil() as usize).min(MAX_SHOOTING_STARS)
}

/// `(paths, segments per path)` at local progress `g`.
#[must_use]
pub fn growing_path_layout(g: f64) -> (usize, usize) {
    let g = g.clamp(0.0, 1.0);
    let paths = ((g * MAX_GROWING_PATHS as f64).ceil() as usize).clamp(1, MAX_GROWING_PATHS);
    let extra = (g * (MAX_PATH_SEGMENTS - MIN_PATH_SEGMENTS) as f64).round() as usize;
    (paths, MIN_PATH_SEGMENTS + extra)
}

/// Visible figures of the shapes and constellations sub-phases.
fn visible_figures(phase: PathsPhase, g: f64) -> usize {
    match phase {
        PathsPhase::Shapes => ((g * SHAPES.len() as f64).floor() as usize + 1).min(SHAPES.len()),
        PathsPhase::Constellations if g >= CONSTELLATION_STAGGER => 2,
        PathsPhase::Constellations => 1,
        _ => 0,
    }
}

fn figures_for(phase: PathsPhase) -> &'static [Figure] {
    match phase {
        PathsPhase::Shapes => &SHAPES,
        PathsPhase::Constellations => &CONSTELLATIONS,
        _ => &[],
    }
}

/// Random walks over the star field: each hop moves to the nearest star not
/// yet on the walk. Deterministic for a given seed.
#[must_use]
pub fn random_walks(stars: &[Point3], seed: u64, walks: usize, hops: usize) -> Vec<Vec<Point3>> {
    if stars.len() < 2 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed ^ WALK_SALT);
    (0..walks)
        .map(|_| {
            let mut visited = vec![rng.random_range(0..stars.len())];
            for _ in 0..hops {
                let Some(&current) = visited.last() else { break };
                let next = stars
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| !visited.contains(j))
                    .map(|(j, p)| (j, p.distance_squared_to(stars[current])))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                match next {
                    Some((j, _)) => visited.push(j),
                    None => break,
                }
            }
            visited.into_iter().map(|j| stars[j]).collect()
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PathsChapter {
    value: f64,
    seed: u64,
    rng: StdRng,
    shooters: Vec<ShootingStar>,
    revealed: [usize; 3],
    reveal_clock: f64,
    phase: PathsPhase,
}

impl PathsChapter {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let shooters = (0..MAX_SHOOTING_STARS).map(|_| ShootingStar::spawn(&mut rng)).collect();
        Self {
            value: 0.0,
            seed,
            rng,
            shooters,
            revealed: [0; 3],
            reveal_clock: 0.0,
            phase: PathsPhase::ShootingStars,
        }
    }

    /// Segments revealed so far for figure slot `i` of the current sub-phase.
    #[must_use]
    pub fn revealed_segments(&self, i: usize) -> usize {
        self.revealed.get(i).copied().unwrap_or(0)
    }

    fn reset_reveal(&mut self) {
        self.revealed = [0; 3];
        self.reveal_clock = 0.0;
    }

    fn advance_shooters(&mut self, dt: f64) -> bool {
        let (_, g) = PathsPhase::locate(self.value);
        let count = shooting_star_count(g);
        for shooter in self.shooters.iter_mut().take(count) {
            shooter.progress += shooter.speed * dt;
            if shooter.progress >= 1.0 {
                *shooter = ShootingStar {
                    progress: 0.0,
                    ..ShootingStar::spawn(&mut self.rng)
                };
            }
        }
        count > 0 && dt > 0.0
    }

    fn advance_reveal(&mut self, dt: f64) -> bool {
        let (phase, g) = PathsPhase::locate(self.value);
        let figures = figures_for(phase);
        let visible = visible_figures(phase, g);
        let pending = |revealed: &[usize; 3]| {
            figures
                .iter()
                .take(visible)
                .enumerate()
                .any(|(i, f)| revealed[i] < f.segment_count())
        };
        if !pending(&self.revealed) {
            return false;
        }

        self.reveal_clock += dt;
        let mut changed = false;
        while self.reveal_clock >= REVEAL_INTERVAL && pending(&self.revealed) {
            self.reveal_clock -= REVEAL_INTERVAL;
            for (i, figure) in figures.iter().take(visible).enumerate() {
                if self.revealed[i] < figure.segment_count() {
                    self.revealed[i] += 1;
                    changed = true;
                }
            }
        }
        changed
    }

    fn shooting_lines(&self, ctx: &ChapterContext<'_>, g: f64) -> LineSegments {
        let length = ctx.galaxy_radius * SHOOTING_LENGTH;
        let mut lines = LineSegments::default();
        for shooter in self.shooters.iter().take(shooting_star_count(g)) {
            if let Some((tail, head)) = shooter.segment(ctx.stars.cosmic(), length) {
                lines.push(tail, head);
            }
        }
        lines
    }

    fn growing_lines(&self, ctx: &ChapterContext<'_>, g: f64) -> LineSegments {
        let (paths, segments) = growing_path_layout(g);
        let mut lines = LineSegments::default();
        for walk in random_walks(ctx.stars.cosmic(), self.seed, paths, segments) {
            lines.push_polyline(&walk, false);
        }
        lines
    }

    fn figure_lines(&self, ctx: &ChapterContext<'_>, phase: PathsPhase, g: f64) -> LineSegments {
        let figures = figures_for(phase);
        let stars = ctx.stars.cosmic();
        let mut lines = LineSegments::default();
        if stars.is_empty() {
            return lines;
        }

        let mut rng = StdRng::seed_from_u64(self.seed ^ FIGURE_SALT ^ phase as u64);
        for (i, figure) in figures.iter().take(visible_figures(phase, g)).enumerate() {
            let anchor = stars[rng.random_range(0..stars.len())];
            let scale = ctx.galaxy_radius
                * match figure.kind {
                    FigureKind::Shape => SHAPE_SCALE,
                    FigureKind::Constellation => CONSTELLATION_SCALE,
                };
            let placed = figure.place(anchor, Vec3::X, Vec3::Y, scale);
            for (a, b) in figure.segments(&placed, self.revealed[i]) {
                lines.push(a, b);
            }
        }
        lines
    }

    fn path_lines(ctx: &ChapterContext<'_>, g: f64) -> LineSegments {
        let corners = ctx.sculpture.corners();
        let n = corners.len();
        let edges = match n {
            0 | 1 => 0,
            2 => 1,
            _ => n,
        };
        let mut lines = LineSegments::default();
        for i in 0..cyclic_reveal(g, PATH_REVEAL_CYCLES, edges) {
            lines.push(corners[i], corners[(i + 1) % n]);
        }
        lines
    }
}

impl Chapter for PathsChapter {
    fn kind(&self) -> ChapterKind {
        ChapterKind::Paths
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn set_value(&mut self, value: f64) {
        self.value = clamp_slider(value);
        let (phase, _) = PathsPhase::locate(self.value);
        if phase != self.phase {
            self.phase = phase;
            self.reset_reveal();
        }
    }

    fn build(&self, ctx: &ChapterContext<'_>) -> Result<ChapterOutput, ChapterError> {
        let (phase, g) = PathsPhase::locate(self.value);
        let color = ctx.config.line_color;

        let mut output = ChapterOutput::new();
        output.push(
            STARS,
            Visual::new(
                VisualGeometry::Points(star_field(ctx, 1.0, ctx.star_size())),
                ctx.config.star_color,
                1.0,
            ),
        );

        let (handle, lines) = match phase {
            PathsPhase::ShootingStars => (SHOOTING_STARS, self.shooting_lines(ctx, g)),
            PathsPhase::GrowingPaths => (GROWING_PATHS, self.growing_lines(ctx, g)),
            PathsPhase::Shapes => (SHAPES_VISUAL, self.figure_lines(ctx, phase, g)),
            PathsPhase::Constellations => (CONSTELLATIONS_VISUAL, self.figure_lines(ctx, phase, g)),
            PathsPhase::PathReveal => (SCULPTURE_PATH, Self::path_lines(ctx, g)),
        };
        output.push(handle, Visual::new(VisualGeometry::Lines(lines), color, 1.0));
        Ok(output)
    }

    fn advance(&mut self, dt: f64, _ctx: &ChapterContext<'_>) -> bool {
        match PathsPhase::locate(self.value).0 {
            PathsPhase::ShootingStars => self.advance_shooters(dt),
            PathsPhase::Shapes | PathsPhase::Constellations => self.advance_reveal(dt),
            PathsPhase::GrowingPaths | PathsPhase::PathReveal => false,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::test_support;
    use crate::config::EngineConfig;
    use crate::geom::PointCloudPair;
    use crate::scene::SculptureData;

    struct Fixture {
        sculpture: SculptureData,
        stars: PointCloudPair,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let sculpture = test_support::sculpture();
            let stars = test_support::stars(&sculpture, 6.0);
            Self {
                sculpture,
                stars,
                config: EngineConfig::default(),
            }
        }

        fn ctx(&self) -> ChapterContext<'_> {
            ChapterContext {
                sculpture: &self.sculpture,
                stars: &self.stars,
                config: &self.config,
                galaxy_radius: 6.0,
            }
        }
    }

    fn segment_count(output: &ChapterOutput, handle: VisualHandle) -> usize {
        match output.get(handle).map(|v| &v.geometry) {
            Some(VisualGeometry::Lines(lines)) => lines.segment_count(),
            _ => 0,
        }
    }

    #[test]
    fn sub_phases_follow_breakpoints() {
        assert_eq!(PathsPhase::locate(10.0).0, PathsPhase::ShootingStars);
        assert_eq!(PathsPhase::locate(20.0).0, PathsPhase::GrowingPaths);
        assert_eq!(PathsPhase::locate(54.9).0, PathsPhase::Shapes);
        assert_eq!(PathsPhase::locate(55.0).0, PathsPhase::Constellations);
        assert_eq!(PathsPhase::locate(100.0), (PathsPhase::PathReveal, 1.0));
    }

    #[test]
    fn shooting_stars_scale_with_progress() {
        assert_eq!(shooting_star_count(0.0), 0);
        assert_eq!(shooting_star_count(0.01), 1);
        assert_eq!(shooting_star_count(1.0), 9);

        let fixture = Fixture::new();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(19.9);
        assert_eq!(segment_count(&chapter.build(&fixture.ctx()).unwrap(), SHOOTING_STARS), 9);
    }

    #[test]
    fn shooting_stars_move_on_tick_only() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(10.0);
        let first = chapter.build(&ctx).unwrap();
        assert_eq!(chapter.build(&ctx).unwrap(), first);
        assert!(chapter.advance(0.05, &ctx));
        assert_ne!(chapter.build(&ctx).unwrap(), first);
    }

    #[test]
    fn growing_paths_get_longer() {
        assert_eq!(growing_path_layout(0.0), (1, 2));
        assert_eq!(growing_path_layout(1.0), (5, 10));

        let fixture = Fixture::new();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(21.0);
        let early = segment_count(&chapter.build(&fixture.ctx()).unwrap(), GROWING_PATHS);
        chapter.set_value(39.0);
        let late = segment_count(&chapter.build(&fixture.ctx()).unwrap(), GROWING_PATHS);
        assert!(early >= 2);
        assert!(late > early);
    }

    #[test]
    fn walks_never_revisit_a_star() {
        let stars: Vec<Point3> = (0..30).map(|i| Point3::new(f64::from(i), 0.0, 0.0)).collect();
        for walk in random_walks(&stars, 9, 4, 10) {
            assert_eq!(walk.len(), 11);
            for (i, p) in walk.iter().enumerate() {
                assert!(!walk[i + 1..].contains(p));
            }
        }
    }

    #[test]
    fn shapes_reveal_one_segment_per_interval() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(54.0);
        assert_eq!(segment_count(&chapter.build(&ctx).unwrap(), SHAPES_VISUAL), 0);

        assert!(chapter.advance(REVEAL_INTERVAL * 1.5, &ctx));
        assert_eq!(segment_count(&chapter.build(&ctx).unwrap(), SHAPES_VISUAL), 3);

        for _ in 0..20 {
            chapter.advance(REVEAL_INTERVAL, &ctx);
        }
        assert_eq!(segment_count(&chapter.build(&ctx).unwrap(), SHAPES_VISUAL), 3 + 4 + 5);
        assert!(!chapter.advance(REVEAL_INTERVAL, &ctx));
    }

    #[test]
    fn leaving_a_sub_phase_resets_the_reveal() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(45.0);
        chapter.advance(1.0, &ctx);
        assert!(chapter.revealed_segments(0) > 0);
        chapter.set_value(60.0);
        assert_eq!(chapter.revealed_segments(0), 0);
    }

    #[test]
    fn second_constellation_is_staggered() {
        assert_eq!(visible_figures(PathsPhase::Constellations, 0.2), 1);
        assert_eq!(visible_figures(PathsPhase::Constellations, 0.6), 2);
    }

    #[test]
    fn sculpture_path_ends_complete() {
        let fixture = Fixture::new();
        let mut chapter = PathsChapter::new(3);
        chapter.set_value(100.0);
        let output = chapter.build(&fixture.ctx()).unwrap();
        assert_eq!(segment_count(&output, SCULPTURE_PATH), fixture.sculpture.corners().len());
    }
}
