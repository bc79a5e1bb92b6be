use crate::geom::{
    MorphOptions, Point3, Tolerance, closed_catmull_rom, morph_samples, morph_tube,
};

fn square() -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ]
}

#[test]
fn morph_at_zero_reproduces_polyline() {
    let poly = square();
    let spline = closed_catmull_rom(&poly, 16, 0.5);
    let samples = morph_samples(&poly, &spline, 0.0, &MorphOptions::default());

    assert_eq!(samples.len(), 16 * poly.len());
    for (i, p) in samples.iter().enumerate() {
        let corner = i / 16;
        let frac = (i % 16) as f64 / 16.0;
        let expected = poly[corner].lerp(poly[(corner + 1) % poly.len()], frac);
        assert!(Tolerance::DEFAULT.approx_eq_point3(*p, expected), "sample {i}");
    }
}

#[test]
fn morph_at_one_reproduces_spline() {
    let poly = square();
    let spline = closed_catmull_rom(&poly, 16, 0.5);
    let samples = morph_samples(&poly, &spline, 1.0, &MorphOptions::default());

    assert_eq!(samples.len(), spline.len());
    for (i, (p, q)) in samples.iter().zip(&spline).enumerate() {
        assert!(Tolerance::DEFAULT.approx_eq_point3(*p, *q), "sample {i}");
    }
}

#[test]
fn morph_aligns_rotated_and_reversed_spline() {
    let poly = square();
    let mut spline = closed_catmull_rom(&poly, 16, 0.5);
    spline.rotate_left(21);
    spline.reverse();

    let samples = morph_samples(&poly, &spline, 1.0, &MorphOptions::default());
    // first sample lands near the first corner, second heads toward the next corner
    assert!(samples[0].distance_to(poly[0]) < 0.05);
    let heading = samples[4] - samples[0];
    assert!(heading.dot(poly[1] - poly[0]) > 0.0);
}

#[test]
fn midway_samples_lie_between_shapes() {
    let poly = square();
    let spline = closed_catmull_rom(&poly, 16, 0.5);
    let straight = morph_samples(&poly, &spline, 0.0, &MorphOptions::default());
    let curved = morph_samples(&poly, &spline, 1.0, &MorphOptions::default());
    let half = morph_samples(&poly, &spline, 0.5, &MorphOptions::default());
    for ((a, b), m) in straight.iter().zip(&curved).zip(&half) {
        assert!(Tolerance::LOOSE.approx_eq_point3(a.lerp(*b, 0.5), *m));
    }
}

#[test]
fn morph_tube_is_closed_and_finite() {
    let poly = square();
    let spline = closed_catmull_rom(&poly, 16, 0.5);
    let (mesh, diag) = morph_tube(&poly, &spline, 0.3, 0.05, &MorphOptions::default()).unwrap();
    assert!(!mesh.has_invalid_vertices());
    assert!(diag.is_watertight());
}
