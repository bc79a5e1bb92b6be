use crate::geom::{
    COPLANAR_DOT_THRESHOLD, LatticeType, PARALLEL_DOT_THRESHOLD, Point3, analyze_lattice,
    derive_basis_vectors, generate_lattice_points,
};

fn staircase(steps: usize, length: f64) -> Vec<Point3> {
    (0..=steps)
        .map(|i| {
            let x = ((i + 1) / 2) as f64 * length;
            let y = (i / 2) as f64 * length;
            Point3::new(x, y, 0.0)
        })
        .collect()
}

fn skewed_walk() -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.5, 1.5, 0.0),
        Point3::new(2.5, 2.0, 1.8),
        Point3::new(4.0, 2.2, 2.0),
        Point3::new(4.1, 3.9, 2.1),
    ]
}

#[test]
fn right_angle_zigzag_is_simple_cubic() {
    let length = 1.75;
    let analysis = analyze_lattice(&staircase(9, length));
    assert_eq!(analysis.lattice_type, LatticeType::SimpleCubic);
    assert!((analysis.constant - length).abs() < 1e-12);
}

#[test]
fn classification_is_deterministic() {
    let corners = skewed_walk();
    let first = analyze_lattice(&corners);
    for _ in 0..5 {
        assert_eq!(analyze_lattice(&corners), first);
    }
}

#[test]
fn generated_points_lie_inside_sphere() {
    let corners = skewed_walk();
    let analysis = analyze_lattice(&corners);
    let center = Point3::new(2.0, 2.0, 1.0);
    let radius = 6.5;
    let points = generate_lattice_points(analysis.constant, &corners, center, radius);
    assert!(!points.is_empty());
    for p in &points {
        assert!(p.distance_to(center) <= radius + 1e-6);
    }
}

#[test]
fn basis_vectors_are_pairwise_independent() {
    for corners in [skewed_walk(), staircase(6, 1.0), vec![Point3::ORIGIN, Point3::new(0.0, 0.0, 3.0)]] {
        let basis = derive_basis_vectors(1.3, &corners);
        for i in 0..3 {
            for j in (i + 1)..3 {
                let a = basis[i].normalized().unwrap();
                let b = basis[j].normalized().unwrap();
                assert!(a.dot(b).abs() <= PARALLEL_DOT_THRESHOLD);
            }
            assert!((basis[i].length() - 1.3).abs() < 1e-9);
        }
        let [a, b, c] = basis.map(|v| v.normalized().unwrap());
        let normal = a.cross(b).normalized().unwrap();
        assert!(normal.dot(c).abs() >= COPLANAR_DOT_THRESHOLD);
    }
}
