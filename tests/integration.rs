use std::collections::BTreeMap;

use sculpture_engine::Engine;
use sculpture_engine::chapters::{ChapterKind, structure};
use sculpture_engine::config::EngineConfig;
use sculpture_engine::scene::{SculptureAsset, Viewpoint};

fn staircase() -> SculptureAsset {
    let path = vec![
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 2.0, 0.0],
        [2.0, 2.0, 2.0],
        [0.0, 2.0, 2.0],
        [0.0, 0.0, 2.0],
        [0.0, 0.0, 0.0],
    ];
    let mut cross_sections = BTreeMap::new();
    for (i, x) in [0.4, 1.0, 1.6].into_iter().enumerate() {
        cross_sections.insert(
            format!("Doorsnede {}", i + 1),
            vec![[x, -0.2, -0.2], [x, 0.2, -0.2], [x, 0.2, 0.2], [x, -0.2, 0.2]],
        );
    }
    SculptureAsset {
        path,
        curve: None,
        cross_sections,
    }
}

fn loaded_engine() -> Engine {
    let mut engine = Engine::new();
    engine.load_sculpture_asset(staircase()).expect("load sculpture");
    engine
}

#[test]
fn engine_initializes() {
    let engine = Engine::new();
    assert!(engine.is_initialized());
    assert!(!engine.state().loaded);
}

#[test]
fn staircase_is_simple_cubic() {
    let engine = loaded_engine();
    let state = engine.state();
    assert_eq!(state.lattice_type, Some("SC"));
    assert_eq!(state.lattice_constant, Some(2.0));
    assert!(state.star_count >= 6 * 50);
}

#[test]
fn story_unlocks_chapters_in_order() {
    let mut engine = loaded_engine();
    let mut previous = [0.0; 5];
    for step in 0..=100 {
        engine.set_story_value(f64::from(step)).expect("story value");
        let values = engine.chapter_values();
        for i in 0..5 {
            assert!(values[i] >= previous[i], "chapter {i} went back at {step}");
            if i > 0 && values[i] > 0.0 {
                assert_eq!(values[i - 1], 100.0);
            }
        }
        previous = values;
    }
    assert_eq!(previous, [100.0; 5]);
    assert_eq!(engine.rendered_chapter(), Some(ChapterKind::Profiled));
}

#[test]
fn structure_rebuild_is_idempotent() {
    let mut engine = loaded_engine();
    engine.set_chapter_value("structure", 64.0).expect("structure value");
    let first = engine.chapter_output(ChapterKind::Structure).cloned().expect("output");
    engine.set_chapter_value("structure", 64.0).expect("structure value");
    let second = engine.chapter_output(ChapterKind::Structure).cloned().expect("output");
    assert_eq!(first, second);
    assert!(first.get(structure::BONDS).is_some());
}

#[test]
fn deactivating_removes_geometry() {
    let mut engine = loaded_engine();
    engine.activate_chapter("points").expect("activate");
    engine.set_chapter_value("points", 100.0).expect("points value");
    let added = engine.geometry_diff();
    assert!(!added.added.is_empty());

    engine.deactivate_chapter("points").expect("deactivate");
    assert_eq!(engine.chapter_values()[0], 0.0);
    let removed = engine.geometry_diff();
    assert_eq!(removed.removed.len(), added.added.len());
    assert!(engine.geometry_diff().is_empty());
}

#[test]
fn switching_chapters_tears_down_the_previous_one() {
    let mut engine = loaded_engine();
    engine.set_chapter_value("paths", 50.0).expect("paths value");
    engine.activate_chapter("curved").expect("activate");
    let state = engine.state();
    assert!(!state.chapters[ChapterKind::Paths.index()].active);
    assert_eq!(state.chapters[ChapterKind::Paths.index()].value, 0.0);
    assert!(engine.chapter_output(ChapterKind::Paths).is_none());
    assert!(engine.chapter_output(ChapterKind::Curved).is_some());
}

#[test]
fn unknown_chapter_and_non_finite_values_are_rejected() {
    let mut engine = loaded_engine();
    assert!(engine.set_chapter_value("onbekend", 10.0).is_err());
    assert!(engine.set_chapter_value("points", f64::NAN).is_err());
    assert!(engine.set_story_value(f64::INFINITY).is_err());
    assert!(engine.tick(f64::NAN).is_err());
}

#[test]
fn play_ramp_reaches_hundred_with_clamped_frames() {
    let mut engine = loaded_engine();
    engine.apply_config(EngineConfig {
        durations: sculpture_engine::config::ChapterDurations {
            points: 1.0,
            ..Default::default()
        },
        ..EngineConfig::default()
    });
    engine.play_chapter("points").expect("play");
    // a stalled frame only advances by the clamp
    engine.tick(5.0).expect("tick");
    assert!((engine.chapter_values()[0] - 10.0).abs() < 1e-9);
    for _ in 0..20 {
        engine.tick(0.1).expect("tick");
    }
    assert_eq!(engine.chapter_values()[0], 100.0);
    assert!(!engine.state().chapters[0].playing);
}

#[test]
fn camera_follows_viewpoints() {
    let mut engine = Engine::new();
    assert!(engine.camera_pose().is_none());
    engine.set_viewpoint_list(vec![
        Viewpoint {
            position: [0.0, 0.0, 10.0],
            target: [0.0, 0.0, 0.0],
            label: "voor".to_string(),
            kind: "overview".to_string(),
        },
        Viewpoint {
            position: [10.0, 0.0, 0.0],
            target: [0.0, 0.0, 0.0],
            label: "zij".to_string(),
            kind: "detail".to_string(),
        },
    ]);
    engine.jump_to_viewpoint(1).expect("viewpoint");
    assert_eq!(engine.camera_pose().map(|p| p.position), Some([10.0, 0.0, 0.0]));
    assert!(engine.jump_to_viewpoint(5).is_err());
}

#[test]
fn galaxy_radius_rebuilds_the_star_field() {
    let mut engine = loaded_engine();
    engine.set_galaxy_radius(40.0).expect("radius");
    let center = engine.sculpture().expect("sculpture").center();
    assert_eq!(engine.state().galaxy_radius, 40.0);
    assert!(
        engine
            .stars()
            .unpaired()
            .iter()
            .all(|p| p.distance_to(center) <= 40.0 + 1e-9)
    );
    assert!(engine.set_galaxy_radius(-1.0).is_err());
}

#[test]
fn profiled_chapter_grows_a_body() {
    let mut engine = loaded_engine();
    engine.set_chapter_value("profiled", 100.0).expect("profiled value");
    let output = engine.chapter_output(ChapterKind::Profiled).expect("output");
    assert!(output.get(sculpture_engine::chapters::profiled::BODY).is_some());
    engine.set_profile_deformation(0.5, 1.0, 1.0).expect("deformation");
    assert!(engine.chapter_output(ChapterKind::Profiled).is_some());
}

#[test]
fn empty_path_falls_back_to_unit_lattice() {
    let mut engine = Engine::new();
    engine
        .load_sculpture_asset(SculptureAsset::default())
        .expect("empty path loads");
    let state = engine.state();
    assert!(state.loaded);
    assert_eq!(state.lattice_type, Some("SC"));
    assert_eq!(state.lattice_constant, Some(1.0));
    assert_eq!(engine.sculpture().map(|s| s.radius()), Some(0.0));

    engine.set_story_value(100.0).expect("story value");
    let output = engine.chapter_output(ChapterKind::Profiled).expect("output");
    assert!(output.get(sculpture_engine::chapters::profiled::BODY).is_none());

    let mut single = staircase();
    single.path.truncate(1);
    engine.load_sculpture_asset(single).expect("single corner loads");
    assert_eq!(engine.state().lattice_constant, Some(1.0));
}
