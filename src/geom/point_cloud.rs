//! Pairing of random "cosmic" stars with lattice sites.
//!
//! Index `i` names the same logical star in both arrays: the rendered position
//! of a paired star is `lerp(cosmic[i], lattice[i], blend)`. Cosmic stars past
//! the paired prefix have no lattice partner.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BBox, Point3, SpatialHash};

/// Star count for a lattice of `lattice_len` sites on a path of
/// `corner_count` corners.
#[must_use]
pub fn cosmic_count(lattice_len: usize, corner_count: usize) -> usize {
    lattice_len.max(corner_count * 50)
}

/// `count` points uniformly distributed inside a sphere (rejection sampling).
pub fn random_points_in_sphere<R: Rng>(rng: &mut R, center: Point3, radius: f64, count: usize) -> Vec<Point3> {
    if !(radius.is_finite() && radius > 0.0) {
        return vec![center; count];
    }
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let x: f64 = rng.random_range(-1.0..1.0);
        let y: f64 = rng.random_range(-1.0..1.0);
        let z: f64 = rng.random_range(-1.0..1.0);
        if x * x + y * y + z * z <= 1.0 {
            points.push(Point3::new(center.x + x * radius, center.y + y * radius, center.z + z * radius));
        }
    }
    points
}

/// Reorder `cosmic` so that `cosmic[i]` is the nearest still-unclaimed point to
/// `lattice[i]` (ties go to the lower original index). Unclaimed points keep
/// their relative order after the paired prefix. Non-finite points are never
/// paired.
#[must_use]
pub fn pair_nearest_unclaimed(lattice: &[Point3], cosmic: &[Point3]) -> Vec<Point3> {
    let mut hash = SpatialHash::build(cosmic, pairing_cell_size(cosmic));
    let mut claimed = vec![false; cosmic.len()];
    let mut ordered = Vec::with_capacity(cosmic.len());

    for target in lattice {
        let Some(j) = nearest_unclaimed(&hash, cosmic, *target) else { break };
        hash.remove(cosmic[j], j);
        claimed[j] = true;
        ordered.push(cosmic[j]);
    }

    ordered.extend(
        cosmic
            .iter()
            .zip(&claimed)
            .filter(|(_, taken)| !**taken)
            .map(|(p, _)| *p),
    );
    ordered
}

/// Cell edge giving roughly one point per cell across the bounding box.
fn pairing_cell_size(points: &[Point3]) -> f64 {
    let finite: Vec<Point3> = points.iter().copied().filter(|p| p.is_finite()).collect();
    let Some(bbox) = BBox::from_points(&finite) else {
        return 1.0;
    };
    let extent = bbox.max - bbox.min;
    let longest = extent.x.max(extent.y).max(extent.z);
    let size = longest / (finite.len() as f64).cbrt();
    if size.is_finite() && size > 0.0 { size } else { 1.0 }
}

/// Nearest point still in `hash`, scanning rings outward until no closer
/// point can remain.
fn nearest_unclaimed(hash: &SpatialHash, points: &[Point3], target: Point3) -> Option<usize> {
    if hash.is_empty() {
        return None;
    }
    let max_ring = hash.max_ring(target)?;
    let mut best: Option<(f64, usize)> = None;
    for ring in 0..=max_ring {
        // anything in this ring or beyond is farther than (ring - 1) cells
        let reach = (ring - 1) as f64 * hash.cell_size();
        if let Some((d2, _)) = best {
            if reach > 0.0 && d2 < reach * reach {
                break;
            }
        }
        for j in hash.ring(target, ring) {
            let d2 = points[j].distance_squared_to(target);
            if best.is_none_or(|(bd, bj)| d2 < bd || (d2 == bd && j < bj)) {
                best = Some((d2, j));
            }
        }
    }
    best.map(|(_, j)| j)
}

/// Random star field paired with lattice sites.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudPair {
    cosmic: Vec<Point3>,
    lattice: Vec<Point3>,
}

impl PointCloudPair {
    /// Scatter `cosmic_count(lattice.len(), corner_count)` stars in a sphere of
    /// `radius` around `center` using `seed`, then pair them with `lattice`.
    #[must_use]
    pub fn build(lattice: &[Point3], corner_count: usize, center: Point3, radius: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let count = cosmic_count(lattice.len(), corner_count);
        let stars = random_points_in_sphere(&mut rng, center, radius, count);
        Self::from_parts(lattice, &stars)
    }

    #[must_use]
    pub fn from_parts(lattice: &[Point3], cosmic: &[Point3]) -> Self {
        let cosmic = pair_nearest_unclaimed(lattice, cosmic);
        let paired = lattice.len().min(cosmic.len());
        Self {
            cosmic,
            lattice: lattice[..paired].to_vec(),
        }
    }

    /// Total star count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cosmic.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cosmic.is_empty()
    }

    /// Stars with a lattice partner; they occupy indices `0..paired_count()`.
    #[must_use]
    pub fn paired_count(&self) -> usize {
        self.lattice.len()
    }

    #[must_use]
    pub fn cosmic(&self) -> &[Point3] {
        &self.cosmic
    }

    #[must_use]
    pub fn lattice(&self) -> &[Point3] {
        &self.lattice
    }

    /// Stars without a lattice partner.
    #[must_use]
    pub fn unpaired(&self) -> &[Point3] {
        &self.cosmic[self.paired_count()..]
    }

    /// Current position of star `i` at `blend` in `[0, 1]`; unpaired stars stay put.
    #[must_use]
    pub fn position(&self, i: usize, blend: f64) -> Option<Point3> {
        let cosmic = *self.cosmic.get(i)?;
        Some(match self.lattice.get(i) {
            Some(target) => cosmic.lerp(*target, blend.clamp(0.0, 1.0)),
            None => cosmic,
        })
    }
}
