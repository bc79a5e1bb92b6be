//! Crystal lattice inference and generation from a sculpture path.
//!
//! The sculpture path is treated as a walk through a crystal: its corner
//! angles hint at the lattice type and its shortest segment is the
//! nearest-neighbour spacing. From the same walk we derive three basis vectors
//! and fill a spherical region with lattice sites.
//!
//! Classification is heuristic. Thresholds and tie-breaks are fixed:
//!
//! | band                 | signal |
//! |----------------------|--------|
//! | 90° ± 5°             | SC     |
//! | 109.47° ± 5°         | BCC    |
//! | 60° ± 5°, 120° ± 5°  | FCC    |
//!
//! FCC wins over BCC, BCC wins over SC, SC is the default.

use super::{Point3, Vec3};

const ANGLE_BAND_DEG: f64 = 5.0;
const SC_ANGLE_DEG: f64 = 90.0;
const BCC_ANGLE_DEG: f64 = 109.47;
const FCC_ANGLES_DEG: [f64; 2] = [60.0, 120.0];
/// Minimum fraction of corner angles a lattice type needs to be chosen.
const ANGLE_FRACTION_THRESHOLD: f64 = 0.3;

/// Pairwise distances up to this multiple of the constant take part in the
/// distance-ratio vote.
const SHORT_DISTANCE_FACTOR: f64 = 1.5;
const SC_RATIO_BAND: (f64, f64) = (0.95, 1.05);
const BCC_RATIO_BAND: (f64, f64) = (0.82, 0.92);
const FCC_RATIO_BAND: (f64, f64) = (0.67, 0.77);

/// Directions whose normalized dot product exceeds this are treated as parallel.
pub const PARALLEL_DOT_THRESHOLD: f64 = 0.99;

/// Upper bound on the integer range walked per basis vector. Keeps a tiny
/// constant from turning generation into a multi-minute loop.
const MAX_HALF_EXTENT: i64 = 96;

/// Minimum |normal · c| for a third basis direction to leave the plane of the
/// first two.
pub const COPLANAR_DOT_THRESHOLD: f64 = 0.01;

/// Cubic lattice families recognised by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatticeType {
    #[default]
    SimpleCubic,
    BodyCenteredCubic,
    FaceCenteredCubic,
}

impl LatticeType {
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::SimpleCubic => "SC",
            Self::BodyCenteredCubic => "BCC",
            Self::FaceCenteredCubic => "FCC",
        }
    }
}

/// Result of classifying a corner path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeAnalysis {
    pub lattice_type: LatticeType,
    /// Nearest-neighbour spacing.
    pub constant: f64,
}

impl Default for LatticeAnalysis {
    fn default() -> Self {
        Self {
            lattice_type: LatticeType::SimpleCubic,
            constant: 1.0,
        }
    }
}

/// Everything downstream needs to know about the lattice implied by a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeDescriptor {
    pub lattice_type: LatticeType,
    pub constant: f64,
    pub origin: Point3,
    pub basis: [Vec3; 3],
}

impl Default for LatticeDescriptor {
    fn default() -> Self {
        Self {
            lattice_type: LatticeType::SimpleCubic,
            constant: 1.0,
            origin: Point3::ORIGIN,
            basis: Vec3::AXES,
        }
    }
}

impl LatticeDescriptor {
    /// Classify the path and derive its basis in one go.
    #[must_use]
    pub fn derive(corners: &[Point3]) -> Self {
        let analysis = analyze_lattice(corners);
        Self {
            lattice_type: analysis.lattice_type,
            constant: analysis.constant,
            origin: corners.first().copied().unwrap_or(Point3::ORIGIN),
            basis: derive_basis_vectors(analysis.constant, corners),
        }
    }

    /// Lattice sites of this descriptor inside a sphere.
    #[must_use]
    pub fn points_in_sphere(&self, center: Point3, radius: f64) -> Vec<Point3> {
        lattice_points_from_basis(self.origin, self.basis, self.constant, center, radius)
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Detect lattice type and constant from an ordered corner list.
///
/// Fewer than two corners yields simple-cubic with constant 1.
#[must_use]
pub fn analyze_lattice(corners: &[Point3]) -> LatticeAnalysis {
    if corners.len() < 2 {
        return LatticeAnalysis::default();
    }

    let constant = corners
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .filter(|len| len.is_finite() && *len > 0.0)
        .fold(f64::INFINITY, f64::min);
    let constant = if constant.is_finite() { constant } else { 1.0 };

    let angles = corner_angles(corners);
    let mut lattice_type = classify_by_angles(&angles);

    if lattice_type == LatticeType::SimpleCubic {
        let distances = sorted_pairwise_distances(corners);
        lattice_type = classify_by_distance_ratios(&distances, constant);
    }

    LatticeAnalysis {
        lattice_type,
        constant,
    }
}

/// Turning angle at every interior corner, in degrees. Corners adjacent to a
/// zero-length segment are skipped.
fn corner_angles(corners: &[Point3]) -> Vec<f64> {
    corners
        .windows(3)
        .filter_map(|w| (w[1] - w[0]).angle_deg(w[2] - w[1]))
        .collect()
}

fn in_band(value: f64, center: f64, half_width: f64) -> bool {
    (value - center).abs() <= half_width
}

fn classify_by_angles(angles: &[f64]) -> LatticeType {
    if angles.is_empty() {
        return LatticeType::SimpleCubic;
    }

    let total = angles.len() as f64;
    let fraction = |pred: &dyn Fn(f64) -> bool| angles.iter().filter(|a| pred(**a)).count() as f64 / total;

    let sc = fraction(&|a| in_band(a, SC_ANGLE_DEG, ANGLE_BAND_DEG));
    let bcc = fraction(&|a| in_band(a, BCC_ANGLE_DEG, ANGLE_BAND_DEG));
    let fcc = fraction(&|a| FCC_ANGLES_DEG.iter().any(|c| in_band(a, *c, ANGLE_BAND_DEG)));

    if fcc > ANGLE_FRACTION_THRESHOLD && fcc > bcc && fcc > sc {
        LatticeType::FaceCenteredCubic
    } else if bcc > ANGLE_FRACTION_THRESHOLD && bcc > sc {
        LatticeType::BodyCenteredCubic
    } else {
        LatticeType::SimpleCubic
    }
}

fn sorted_pairwise_distances(corners: &[Point3]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(corners.len() * corners.len().saturating_sub(1) / 2);
    for (i, a) in corners.iter().enumerate() {
        for b in &corners[i + 1..] {
            let d = a.distance_to(*b);
            if d.is_finite() && d > 0.0 {
                distances.push(d);
            }
        }
    }
    distances.sort_by(f64::total_cmp);
    distances
}

/// Secondary vote used only when the angle pass settled on simple-cubic.
/// FCC or BCC override SC only when their count strictly exceeds the SC count.
fn classify_by_distance_ratios(sorted_distances: &[f64], constant: f64) -> LatticeType {
    let cutoff = constant * SHORT_DISTANCE_FACTOR;
    let short: Vec<f64> = sorted_distances
        .iter()
        .copied()
        .take_while(|d| *d <= cutoff)
        .collect();
    if short.is_empty() {
        return LatticeType::SimpleCubic;
    }

    let median = short[short.len() / 2];
    if median <= 0.0 {
        return LatticeType::SimpleCubic;
    }

    let count_in = |(lo, hi): (f64, f64)| {
        short
            .iter()
            .filter(|d| {
                let ratio = **d / median;
                ratio >= lo && ratio <= hi
            })
            .count()
    };
    let sc = count_in(SC_RATIO_BAND);
    let bcc = count_in(BCC_RATIO_BAND);
    let fcc = count_in(FCC_RATIO_BAND);

    if fcc > sc && fcc >= bcc {
        LatticeType::FaceCenteredCubic
    } else if bcc > sc {
        LatticeType::BodyCenteredCubic
    } else {
        LatticeType::SimpleCubic
    }
}

// ============================================================================
// Generator
// ============================================================================

fn is_independent(candidate: Vec3, accepted: &[Vec3]) -> bool {
    let pairwise = accepted.iter().all(|b| match b.normalized() {
        Some(b) => candidate.dot(b).abs() <= PARALLEL_DOT_THRESHOLD,
        None => true,
    });
    match accepted {
        [a, b] => pairwise && spans_volume(*a, *b, candidate),
        _ => pairwise,
    }
}

/// Whether `c` leaves the plane of `a` and `b` (unit vectors).
fn spans_volume(a: Vec3, b: Vec3, c: Vec3) -> bool {
    a.cross(b)
        .normalized()
        .is_some_and(|normal| normal.dot(c).abs() >= COPLANAR_DOT_THRESHOLD)
}

/// Three non-parallel, non-coplanar basis vectors of length `constant`.
///
/// Path segment directions are taken first, in walk order; remaining slots
/// are filled with the x, y, z axes subject to the same tests. A third path
/// direction in the plane of the first two is skipped.
#[must_use]
pub fn derive_basis_vectors(constant: f64, corners: &[Point3]) -> [Vec3; 3] {
    let constant = if constant.is_finite() && constant > 0.0 {
        constant
    } else {
        1.0
    };
    let mut accepted: Vec<Vec3> = Vec::with_capacity(3);

    let path_dirs = corners.windows(2).filter_map(|w| (w[1] - w[0]).normalized());
    for dir in path_dirs.chain(Vec3::AXES) {
        if accepted.len() == 3 {
            break;
        }
        if is_independent(dir, &accepted) {
            accepted.push(dir);
        }
    }

    let third = match accepted.as_slice() {
        &[a, b] => a.cross(b).normalized(),
        _ => None,
    };
    accepted.extend(third);

    let mut basis = Vec3::AXES.map(|axis| axis * constant);
    for (slot, dir) in basis.iter_mut().zip(accepted) {
        *slot = dir * constant;
    }
    basis
}

/// Fill a sphere with lattice sites spanned by the path-derived basis.
///
/// The detected lattice type is not needed: generation only depends on the
/// basis, which already encodes the path's geometry.
#[must_use]
pub fn generate_lattice_points(
    constant: f64,
    corners: &[Point3],
    center: Point3,
    radius: f64,
) -> Vec<Point3> {
    let origin = corners.first().copied().unwrap_or(center);
    let basis = derive_basis_vectors(constant, corners);
    lattice_points_from_basis(origin, basis, constant, center, radius)
}

/// Lattice steps per axis needed to cover `radius`, clamped to `MAX_HALF_EXTENT`.
fn half_extent(radius: f64, constant: f64) -> i64 {
    let steps = ((radius / constant).ceil() as i64).saturating_add(1);
    if steps > MAX_HALF_EXTENT {
        log::warn!("lattice half extent {steps} exceeds {MAX_HALF_EXTENT}; clamping generation range");
        return MAX_HALF_EXTENT;
    }
    steps
}

fn lattice_points_from_basis(
    origin: Point3,
    basis: [Vec3; 3],
    constant: f64,
    center: Point3,
    radius: f64,
) -> Vec<Point3> {
    if !(radius.is_finite() && radius > 0.0 && constant.is_finite() && constant > 0.0) {
        return Vec::new();
    }

    let half_extent = half_extent(radius, constant);
    let radius_sq = radius * radius;
    let [b1, b2, b3] = basis;
    let mut points = Vec::new();

    for i in -half_extent..=half_extent {
        for j in -half_extent..=half_extent {
            for k in -half_extent..=half_extent {
                let p = origin + b1 * i as f64 + b2 * j as f64 + b3 * k as f64;
                if p.distance_squared_to(center) <= radius_sq {
                    points.push(p);
                }
            }
        }
    }

    points
}
