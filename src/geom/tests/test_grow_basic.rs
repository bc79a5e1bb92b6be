use crate::geom::{
    GrowOptions, Point3, grow_loft, included_section_count, section_scale, section_scales,
    smoothstep,
};

fn square_section(z: f64) -> Vec<Point3> {
    vec![
        Point3::new(-1.0, -1.0, z),
        Point3::new(1.0, -1.0, z),
        Point3::new(1.0, 1.0, z),
        Point3::new(-1.0, 1.0, z),
    ]
}

#[test]
fn progressive_taper_matches_closed_form() {
    let options = GrowOptions {
        tip_ahead: 0.12,
        taper: 0.30,
        ..GrowOptions::default()
    };
    let n = 10;
    let f = 0.5;

    let scales = section_scales(n, f, &options);
    assert_eq!(scales.len(), 5);
    assert_eq!(scales[0], 1.0);

    // index 9 is ahead of the travel position and therefore not included
    assert!(scales.get(9).is_none());

    for (i, scale) in scales.iter().enumerate() {
        let distance = f * n as f64 + 0.12 * n as f64 - i as f64;
        let expected = smoothstep((distance / (0.30 * n as f64)).clamp(0.0, 1.0));
        assert!((scale - expected).abs() < 1e-12);
    }

    // the newest included section is still growing
    let newest = scales[4];
    assert!(newest > 0.0 && newest < 1.0);
}

#[test]
fn section_nine_grows_once_included() {
    let options = GrowOptions::default();
    assert_eq!(included_section_count(10, 0.95), 10);
    let s = section_scale(9, 10, 0.95, &options);
    assert!(s > 0.0 && s < 1.0);
}

#[test]
fn grown_loft_is_an_open_strip() {
    let sections: Vec<Vec<Point3>> = (0..10).map(|i| square_section(i as f64)).collect();
    let result = grow_loft(&sections, 0.5, &GrowOptions::default()).unwrap();

    let vps = result.points_per_section;
    assert_eq!(result.ring_count, 5);
    assert_eq!(result.mesh.triangle_count(), 4 * vps * 2);
    assert_eq!(result.diagnostics.open_edge_count, 2 * vps);
}

#[test]
fn growth_rebuild_is_idempotent() {
    let sections: Vec<Vec<Point3>> = (0..6).map(|i| square_section(i as f64 * 0.5)).collect();
    let a = grow_loft(&sections, 0.7, &GrowOptions::default()).unwrap();
    let b = grow_loft(&sections, 0.7, &GrowOptions::default()).unwrap();
    assert_eq!(a.mesh, b.mesh);
}
