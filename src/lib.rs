#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chapters;
pub mod config;
pub mod geom;
pub mod scene;

use std::collections::BTreeMap;
use std::fmt;

use chapters::phase::{PlayRamp, clamp_slider};
use chapters::{
    Chapter, ChapterContext, ChapterKind, ChapterOutput, Visual, VisualGeometry, VisualHandle,
    create_chapters, story_state,
};
use config::EngineConfig;
use geom::PointCloudPair;
use scene::{CameraPath, CameraPose, SculptureAsset, SculptureData, SculptureError, Viewpoint};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    log::set_logger(&DEFAULT_LOGGER).expect("error initializing logger");
    log::set_max_level(LevelFilter::Debug);
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// One visual in render-ready flat buffers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualExport {
    Mesh {
        positions: Vec<f32>,
        indices: Vec<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        normals: Option<Vec<f32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        uvs: Option<Vec<f32>>,
        color: [f64; 3],
        opacity: f64,
    },
    Lines {
        positions: Vec<f32>,
        color: [f64; 3],
        opacity: f64,
    },
    Points {
        positions: Vec<f32>,
        sizes: Vec<f32>,
        color: [f64; 3],
        opacity: f64,
    },
}

impl From<&Visual> for VisualExport {
    fn from(visual: &Visual) -> Self {
        let color = visual.style.color;
        let opacity = visual.style.opacity;
        match &visual.geometry {
            VisualGeometry::Mesh(mesh) => VisualExport::Mesh {
                positions: mesh.positions_flat(),
                indices: mesh.indices.clone(),
                normals: mesh.normals_flat(),
                uvs: mesh.uvs_flat(),
                color,
                opacity,
            },
            VisualGeometry::Lines(lines) => VisualExport::Lines {
                positions: flat_positions(&lines.positions),
                color,
                opacity,
            },
            VisualGeometry::Points(points) => VisualExport::Points {
                positions: flat_positions(&points.positions),
                sizes: points.sizes.iter().map(|s| *s as f32).collect(),
                color,
                opacity,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryDiffItem {
    pub id: u32,
    pub chapter: ChapterKind,
    pub visual: VisualExport,
}

/// Changes since the previous `get_geometry` call, keyed by visual id.
#[derive(Debug, Default, Serialize)]
pub struct GeometryDiff {
    pub added: Vec<GeometryDiffItem>,
    pub updated: Vec<GeometryDiffItem>,
    pub removed: Vec<u32>,
}

impl GeometryDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterState {
    pub name: ChapterKind,
    pub value: f64,
    pub active: bool,
    pub playing: bool,
    /// Whether this chapter's geometry is currently on screen.
    pub rendered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_value: Option<f64>,
    pub chapters: Vec<ChapterState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattice_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lattice_constant: Option<f64>,
    pub star_count: usize,
    pub galaxy_radius: f64,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    config: EngineConfig,
    sculpture: Option<SculptureData>,
    stars: PointCloudPair,
    galaxy_radius: f64,
    chapters: Vec<Box<dyn Chapter>>,
    active: [bool; 5],
    ramps: [Option<PlayRamp>; 5],
    story_value: Option<f64>,
    camera: CameraPath,
    outputs: BTreeMap<ChapterKind, ChapterOutput>,
    geometry_map: BTreeMap<VisualHandle, Visual>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        let config = EngineConfig::default();
        Engine {
            initialized: true,
            chapters: create_chapters(config.seed),
            camera: CameraPath::new(Vec::new(), config.camera_speed),
            config,
            sculpture: None,
            stars: PointCloudPair::default(),
            galaxy_radius: 0.0,
            active: [false; 5],
            ramps: [None; 5],
            story_value: None,
            outputs: BTreeMap::new(),
            geometry_map: BTreeMap::new(),
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Laad de sculptuurdata `{ path, curve, crossSections }`.
    #[wasm_bindgen]
    pub fn load_sculpture(&mut self, asset: JsValue) -> Result<(), JsValue> {
        let asset: SculptureAsset = serde_wasm_bindgen::from_value(asset).map_err(to_js_error)?;
        self.load_sculpture_asset(asset).map_err(to_js_error)
    }

    /// Pas instellingen toe; ontbrekende velden houden hun standaardwaarde.
    #[wasm_bindgen]
    pub fn configure(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: EngineConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        self.apply_config(config);
        Ok(())
    }

    /// Stel de lijst met camerastandpunten in.
    #[wasm_bindgen]
    pub fn set_viewpoints(&mut self, viewpoints: JsValue) -> Result<(), JsValue> {
        let viewpoints: Vec<Viewpoint> = serde_wasm_bindgen::from_value(viewpoints).map_err(to_js_error)?;
        self.set_viewpoint_list(viewpoints);
        Ok(())
    }

    /// Spring naar een camerastandpunt en stop de camerarit.
    #[wasm_bindgen]
    pub fn jump_to_viewpoint(&mut self, index: usize) -> Result<(), JsValue> {
        self.camera
            .jump_to(index)
            .map(|_| ())
            .ok_or_else(|| js_error("onbekend camerastandpunt"))
    }

    #[wasm_bindgen]
    pub fn start_camera(&mut self) {
        self.camera.start();
    }

    #[wasm_bindgen]
    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Activeer een hoofdstuk; andere actieve hoofdstukken worden opgeruimd.
    #[wasm_bindgen]
    pub fn activate_chapter(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = parse_chapter(name)?;
        self.switch_to(kind);
        Ok(())
    }

    /// Zet een hoofdstuk terug op 0 en verwijder zijn geometrie.
    #[wasm_bindgen]
    pub fn deactivate_chapter(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = parse_chapter(name)?;
        self.teardown(kind);
        Ok(())
    }

    /// Stel de sliderwaarde van een hoofdstuk in (0..100).
    #[wasm_bindgen]
    pub fn set_chapter_value(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        if !value.is_finite() {
            return Err(js_error("hoofdstukwaarde moet een eindig getal zijn"));
        }
        let kind = parse_chapter(name)?;
        if !self.active[kind.index()] || self.story_value.is_some() {
            self.switch_to(kind);
        }
        self.ramps[kind.index()] = None;
        self.chapters[kind.index()].set_value(value);
        self.refresh(kind);
        Ok(())
    }

    /// Stel de verhaalslider in; die stuurt alle vijf hoofdstukken aan.
    #[wasm_bindgen]
    pub fn set_story_value(&mut self, value: f64) -> Result<(), JsValue> {
        if !value.is_finite() {
            return Err(js_error("verhaalwaarde moet een eindig getal zijn"));
        }
        let value = clamp_slider(value);
        let state = story_state(value);
        self.story_value = Some(value);
        self.ramps = [None; 5];

        for kind in ChapterKind::ALL {
            let i = kind.index();
            if !state.visible[i] {
                if self.active[i] {
                    self.teardown(kind);
                }
                continue;
            }
            let changed = !self.active[i] || self.chapters[i].value() != state.values[i];
            self.active[i] = true;
            if changed {
                self.chapters[i].set_value(state.values[i]);
                self.refresh(kind);
            }
        }
        Ok(())
    }

    /// Laat een hoofdstuk lineair naar 100 lopen in de ingestelde duur.
    #[wasm_bindgen]
    pub fn play_chapter(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = parse_chapter(name)?;
        if !self.active[kind.index()] || self.story_value.is_some() {
            self.switch_to(kind);
        }
        let i = kind.index();
        self.ramps[i] = Some(PlayRamp::new(self.chapters[i].value(), self.config.duration(i)));
        Ok(())
    }

    #[wasm_bindgen]
    pub fn stop_playing(&mut self) {
        self.ramps = [None; 5];
    }

    /// Verwerk een frame; `dt` in seconden. Geeft terug of er geometrie is gewijzigd.
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f64) -> Result<bool, JsValue> {
        if !dt.is_finite() {
            return Err(js_error("frametijd moet een eindig getal zijn"));
        }
        let dt = dt.clamp(0.0, self.config.max_frame_delta);
        let mut dirty = [false; 5];

        for (i, slot) in self.ramps.iter_mut().enumerate() {
            if let Some(ramp) = slot {
                let value = ramp.advance(dt);
                self.chapters[i].set_value(value);
                dirty[i] = true;
                if ramp.is_finished() {
                    *slot = None;
                }
            }
        }

        self.camera.tick(dt);

        if let Some(sculpture) = self.sculpture.as_ref() {
            let ctx = ChapterContext {
                sculpture,
                stars: &self.stars,
                config: &self.config,
                galaxy_radius: self.galaxy_radius,
            };
            for (i, chapter) in self.chapters.iter_mut().enumerate() {
                if self.active[i] && chapter.advance(dt, &ctx) {
                    dirty[i] = true;
                }
            }
        }

        for kind in ChapterKind::ALL {
            if dirty[kind.index()] {
                self.refresh(kind);
            }
        }
        Ok(dirty.iter().any(|d| *d))
    }

    /// Verander de straal van het sterrenveld en bouw het opnieuw op.
    #[wasm_bindgen]
    pub fn set_galaxy_radius(&mut self, radius: f64) -> Result<(), JsValue> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(js_error("straal moet een positief getal zijn"));
        }
        self.config.galaxy_radius = Some(radius);
        self.rebuild_stars();
        self.refresh_all();
        Ok(())
    }

    /// Vervorm het profiel van het sculptuurlichaam (schaal, rechttrekken, cirkel).
    #[wasm_bindgen]
    pub fn set_profile_deformation(
        &mut self,
        scale: f64,
        straighten: f64,
        circle_blend: f64,
    ) -> Result<(), JsValue> {
        if !(scale.is_finite() && straighten.is_finite() && circle_blend.is_finite()) {
            return Err(js_error("vervormingswaarden moeten eindige getallen zijn"));
        }
        self.config.profile_scale = scale.clamp(0.0, 1.0);
        self.config.profile_straighten = straighten.clamp(0.0, 1.0);
        self.config.profile_circle_blend = circle_blend.clamp(0.0, 1.0);
        self.refresh(ChapterKind::Profiled);
        Ok(())
    }

    /// Haalt de geometrie op in een "diff" formaat.
    #[wasm_bindgen]
    pub fn get_geometry(&mut self) -> Result<JsValue, JsValue> {
        let diff = self.geometry_diff();
        serde_wasm_bindgen::to_value(&diff).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Hoofdstukwaarden en zichtbaarheid.
    #[wasm_bindgen]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.state()).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Huidige camerastand `{ position, target }`, of `undefined` zonder standpunten.
    #[wasm_bindgen]
    pub fn get_camera(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.camera.pose()).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Engine {
    pub fn load_sculpture_asset(&mut self, asset: SculptureAsset) -> Result<(), SculptureError> {
        let sculpture = SculptureData::from_asset(asset)?;
        let lattice = sculpture.lattice();
        log::debug!(
            "sculptuur geladen: {} hoeken, rooster {} ({:.3})",
            sculpture.corners().len(),
            lattice.lattice_type.short_name(),
            lattice.constant
        );
        self.sculpture = Some(sculpture);
        self.rebuild_stars();
        self.refresh_all();
        Ok(())
    }

    pub fn apply_config(&mut self, config: EngineConfig) {
        let values: Vec<f64> = self.chapters.iter().map(|c| c.value()).collect();
        self.camera.set_speed(config.camera_speed);
        self.config = config;
        self.chapters = create_chapters(self.config.seed);
        for (chapter, value) in self.chapters.iter_mut().zip(values) {
            chapter.set_value(value);
        }
        self.rebuild_stars();
        self.refresh_all();
    }

    pub fn set_viewpoint_list(&mut self, viewpoints: Vec<Viewpoint>) {
        self.camera.set_viewpoints(viewpoints);
    }

    #[must_use]
    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.camera.pose()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn sculpture(&self) -> Option<&SculptureData> {
        self.sculpture.as_ref()
    }

    #[must_use]
    pub fn stars(&self) -> &PointCloudPair {
        &self.stars
    }

    /// Latest geometry of `kind`, if it is active and built.
    #[must_use]
    pub fn chapter_output(&self, kind: ChapterKind) -> Option<&ChapterOutput> {
        self.outputs.get(&kind)
    }

    #[must_use]
    pub fn chapter_values(&self) -> [f64; 5] {
        let mut values = [0.0; 5];
        for (slot, chapter) in values.iter_mut().zip(&self.chapters) {
            *slot = chapter.value();
        }
        values
    }

    /// The chapter whose geometry is on screen: the last active one in story order.
    #[must_use]
    pub fn rendered_chapter(&self) -> Option<ChapterKind> {
        ChapterKind::ALL.into_iter().rev().find(|kind| self.active[kind.index()])
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        let rendered = self.rendered_chapter();
        let chapters = ChapterKind::ALL
            .into_iter()
            .map(|kind| ChapterState {
                name: kind,
                value: self.chapters[kind.index()].value(),
                active: self.active[kind.index()],
                playing: self.ramps[kind.index()].is_some(),
                rendered: rendered == Some(kind),
            })
            .collect();
        let lattice = self.sculpture.as_ref().map(SculptureData::lattice);
        EngineState {
            loaded: self.sculpture.is_some(),
            story_value: self.story_value,
            chapters,
            lattice_type: lattice.map(|l| l.lattice_type.short_name()),
            lattice_constant: lattice.map(|l| l.constant),
            star_count: self.stars.len(),
            galaxy_radius: self.galaxy_radius,
        }
    }

    /// Diff of the rendered chapter's visuals against the previous call.
    pub fn geometry_diff(&mut self) -> GeometryDiff {
        let mut diff = GeometryDiff::default();
        let mut next_geometry_map = BTreeMap::new();

        let current = self
            .rendered_chapter()
            .and_then(|kind| self.outputs.get(&kind))
            .map(ChapterOutput::visuals)
            .unwrap_or_default();

        for (handle, visual) in current {
            let item = || GeometryDiffItem {
                id: handle.id(),
                chapter: handle.chapter,
                visual: VisualExport::from(visual),
            };
            match self.geometry_map.get(handle) {
                Some(existing) if existing == visual => {}
                Some(_) => diff.updated.push(item()),
                None => diff.added.push(item()),
            }
            next_geometry_map.insert(*handle, visual.clone());
        }

        for handle in self.geometry_map.keys() {
            if !next_geometry_map.contains_key(handle) {
                diff.removed.push(handle.id());
            }
        }

        self.geometry_map = next_geometry_map;
        diff
    }

    fn switch_to(&mut self, kind: ChapterKind) {
        self.story_value = None;
        for other in ChapterKind::ALL {
            if other != kind && self.active[other.index()] {
                self.teardown(other);
            }
        }
        self.active[kind.index()] = true;
        self.refresh(kind);
    }

    fn teardown(&mut self, kind: ChapterKind) {
        let i = kind.index();
        self.chapters[i].reset();
        self.active[i] = false;
        self.ramps[i] = None;
        self.outputs.remove(&kind);
    }

    fn rebuild_stars(&mut self) {
        let Some(sculpture) = self.sculpture.as_ref() else {
            return;
        };
        let lattice = sculpture.lattice();
        let center = sculpture.center();
        let sites = lattice.points_in_sphere(center, sculpture.radius() + lattice.constant);
        self.galaxy_radius = self
            .config
            .resolved_galaxy_radius(sculpture.radius(), lattice.constant);
        self.stars = PointCloudPair::build(
            &sites,
            sculpture.corners().len(),
            center,
            self.galaxy_radius,
            self.config.seed,
        );
        debug_log!(
            "sterrenveld: {} sterren, {} roosterpunten, straal {:.3}",
            self.stars.len(),
            self.stars.paired_count(),
            self.galaxy_radius
        );
    }

    fn refresh_all(&mut self) {
        for kind in ChapterKind::ALL {
            self.refresh(kind);
        }
    }

    fn refresh(&mut self, kind: ChapterKind) {
        if !self.active[kind.index()] {
            self.outputs.remove(&kind);
            return;
        }
        let Some(sculpture) = self.sculpture.as_ref() else {
            return;
        };
        let ctx = ChapterContext {
            sculpture,
            stars: &self.stars,
            config: &self.config,
            galaxy_radius: self.galaxy_radius,
        };
        match self.chapters[kind.index()].build(&ctx) {
            Ok(output) => {
                self.outputs.insert(kind, output);
            }
            Err(err) => {
                log::warn!("hoofdstuk `{kind}` overgeslagen: {err}");
                self.outputs.remove(&kind);
            }
        }
    }
}

fn parse_chapter(name: &str) -> Result<ChapterKind, JsValue> {
    name.parse::<ChapterKind>().map_err(to_js_error)
}

fn flat_positions(data: &[[f64; 3]]) -> Vec<f32> {
    data.iter().flat_map(|p| p.iter().map(|v| *v as f32)).collect()
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{LineSegments, PointSet};

    fn line_visual(x: f64) -> Visual {
        let mut lines = LineSegments::default();
        lines.push(geom::Point3::ORIGIN, geom::Point3::new(x, 0.0, 0.0));
        Visual::new(VisualGeometry::Lines(lines), [1.0, 1.0, 1.0], 0.5)
    }

    #[test]
    fn export_flattens_buffers() {
        let mut points = PointSet::default();
        points.push(geom::Point3::new(1.0, 2.0, 3.0), 0.25);
        let visual = Visual::new(VisualGeometry::Points(points), [0.0, 1.0, 0.0], 1.0);
        match VisualExport::from(&visual) {
            VisualExport::Points { positions, sizes, color, .. } => {
                assert_eq!(positions, vec![1.0, 2.0, 3.0]);
                assert_eq!(sizes, vec![0.25]);
                assert_eq!(color, [0.0, 1.0, 0.0]);
            }
            other => panic!("verwacht Points, kreeg {other:?}"),
        }
        match VisualExport::from(&line_visual(2.0)) {
            VisualExport::Lines { positions, opacity, .. } => {
                assert_eq!(positions.len(), 6);
                assert_eq!(opacity, 0.5);
            }
            other => panic!("verwacht Lines, kreeg {other:?}"),
        }
    }

    #[test]
    fn diff_reports_changes_once() {
        let mut engine = Engine::new();
        let handle = VisualHandle::new(ChapterKind::Points, 0);
        let mut output = ChapterOutput::new();
        output.push(handle, line_visual(1.0));
        engine.active[0] = true;
        engine.outputs.insert(ChapterKind::Points, output);

        let first = engine.geometry_diff();
        assert_eq!(first.added.len(), 1);
        assert!(engine.geometry_diff().is_empty());

        let mut changed = ChapterOutput::new();
        changed.push(handle, line_visual(3.0));
        engine.outputs.insert(ChapterKind::Points, changed);
        let second = engine.geometry_diff();
        assert_eq!(second.updated.len(), 1);

        engine.outputs.clear();
        let third = engine.geometry_diff();
        assert_eq!(third.removed, vec![handle.id()]);
    }
}
