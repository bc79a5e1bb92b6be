//! Uniform-grid spatial hash and nearest-neighbour bond search.
//!
//! Points are bucketed by `floor(coord / cell_size)`. A query scans the 3×3×3
//! block of cells around the query point, which finds every neighbour within
//! `cell_size`; callers must keep `max_distance <= cell_size`
//! (`BondSearchOptions::normalized` enforces it).

use std::collections::{BTreeSet, HashMap};

use super::Point3;

type CellKey = (i64, i64, i64);

/// Options for bond generation between lattice points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondSearchOptions {
    /// Grid cell edge length.
    pub cell_size: f64,
    /// Maximum bond length (inclusive).
    pub max_distance: f64,
    /// Maximum number of neighbours considered per point.
    pub k: usize,
}

impl Default for BondSearchOptions {
    fn default() -> Self {
        Self::for_lattice_constant(1.0)
    }
}

impl BondSearchOptions {
    pub const CELL_FACTOR: f64 = 1.5;
    pub const DISTANCE_FACTOR: f64 = 1.1;
    pub const DEFAULT_K: usize = 12;

    /// Recommended settings for a lattice with the given nearest-neighbour
    /// spacing: cells of 1.5×, bonds up to 1.1×, twelve neighbours.
    #[must_use]
    pub fn for_lattice_constant(constant: f64) -> Self {
        Self {
            cell_size: constant * Self::CELL_FACTOR,
            max_distance: constant * Self::DISTANCE_FACTOR,
            k: Self::DEFAULT_K,
        }
    }

    /// Raise `cell_size` to at least `max_distance` so the 27-cell scan stays exact.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            cell_size: self.cell_size.max(self.max_distance),
            ..self
        }
    }

    fn is_usable(&self) -> bool {
        self.cell_size.is_finite()
            && self.cell_size > 0.0
            && self.max_distance.is_finite()
            && self.max_distance >= 0.0
            && self.k > 0
    }
}

/// An unordered pair of point indices, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
}

impl Bond {
    #[must_use]
    pub fn new(i: usize, j: usize) -> Self {
        Self {
            a: i.min(j),
            b: i.max(j),
        }
    }
}

/// Point indices bucketed into a uniform grid.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    /// Lowest and highest cell coordinate per axis at build time.
    bounds: Option<(CellKey, CellKey)>,
}

impl SpatialHash {
    /// Bucket `points`. Non-finite points are left out of every cell.
    #[must_use]
    pub fn build(points: &[Point3], cell_size: f64) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut bounds: Option<(CellKey, CellKey)> = None;
        for (index, p) in points.iter().enumerate() {
            if let Some(key) = cell_key(*p, cell_size) {
                cells.entry(key).or_default().push(index);
                bounds = Some(match bounds {
                    None => (key, key),
                    Some((lo, hi)) => (
                        (lo.0.min(key.0), lo.1.min(key.1), lo.2.min(key.2)),
                        (hi.0.max(key.0), hi.1.max(key.1), hi.2.max(key.2)),
                    ),
                });
            }
        }
        Self {
            cell_size,
            cells,
            bounds,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Candidate indices from the cell containing `p` and its 26 neighbours.
    pub fn candidates(&self, p: Point3) -> impl Iterator<Item = usize> + '_ {
        (0..=1).flat_map(move |ring| self.ring(p, ring))
    }

    /// Indices in the cells exactly `ring` cells away (Chebyshev distance)
    /// from the cell containing `p`. Every point in ring `r + 1` or beyond is
    /// farther than `r * cell_size` from `p`.
    pub fn ring(&self, p: Point3, ring: i64) -> impl Iterator<Item = usize> + '_ {
        cell_key(p, self.cell_size)
            .into_iter()
            .flat_map(move |center| ring_keys(center, ring))
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .copied()
    }

    /// Outermost ring around `p` that can still reach an occupied cell.
    #[must_use]
    pub fn max_ring(&self, p: Point3) -> Option<i64> {
        let (cx, cy, cz) = cell_key(p, self.cell_size)?;
        let ((lx, ly, lz), (hx, hy, hz)) = self.bounds?;
        Some(
            [
                cx.saturating_sub(lx),
                hx.saturating_sub(cx),
                cy.saturating_sub(ly),
                hy.saturating_sub(cy),
                cz.saturating_sub(lz),
                hz.saturating_sub(cz),
            ]
            .into_iter()
            .fold(0, i64::max),
        )
    }

    /// Take `index` out of the cell of `p`. Returns whether it was present.
    pub fn remove(&mut self, p: Point3, index: usize) -> bool {
        let Some(key) = cell_key(p, self.cell_size) else {
            return false;
        };
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };
        let Some(slot) = bucket.iter().position(|i| *i == index) else {
            return false;
        };
        bucket.swap_remove(slot);
        if bucket.is_empty() {
            self.cells.remove(&key);
        }
        true
    }

    /// Up to `k` nearest neighbours of `points[index]` within `max_distance`,
    /// sorted by distance then index.
    #[must_use]
    pub fn nearest_neighbors(
        &self,
        points: &[Point3],
        index: usize,
        max_distance: f64,
        k: usize,
    ) -> Vec<(usize, f64)> {
        let Some(p) = points.get(index).copied() else {
            return Vec::new();
        };
        let candidates = self.candidates(p).filter(|j| *j != index).filter_map(|j| {
            let d = p.distance_to(points[j]);
            (d <= max_distance).then_some((j, d))
        });
        closest_k(candidates.collect(), k)
    }
}

fn cell_key(p: Point3, cell_size: f64) -> Option<CellKey> {
    if !p.is_finite() || !(cell_size > 0.0) {
        return None;
    }
    Some((
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    ))
}

/// Cell keys on the surface of the cube of half-width `ring` around `center`.
/// Keys past the `i64` range are skipped.
fn ring_keys((cx, cy, cz): CellKey, ring: i64) -> Vec<CellKey> {
    let ring = ring.max(0);
    if ring == 0 {
        return vec![(cx, cy, cz)];
    }
    let inner_step = usize::try_from(ring.saturating_mul(2)).unwrap_or(usize::MAX);
    let mut keys = Vec::new();
    for dx in -ring..=ring {
        for dy in -ring..=ring {
            let step = if dx.abs() == ring || dy.abs() == ring {
                1
            } else {
                inner_step
            };
            for dz in (-ring..=ring).step_by(step) {
                if let (Some(x), Some(y), Some(z)) =
                    (cx.checked_add(dx), cy.checked_add(dy), cz.checked_add(dz))
                {
                    keys.push((x, y, z));
                }
            }
        }
    }
    keys
}

fn closest_k(mut neighbors: Vec<(usize, f64)>, k: usize) -> Vec<(usize, f64)> {
    neighbors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    neighbors.truncate(k);
    neighbors
}

/// Bonds between each point and its `k` nearest neighbours within
/// `max_distance`, deduplicated and sorted.
///
/// Empty and single-point inputs produce no bonds.
#[must_use]
pub fn find_bonds(points: &[Point3], options: BondSearchOptions) -> Vec<Bond> {
    let options = options.normalized();
    if points.len() < 2 || !options.is_usable() {
        return Vec::new();
    }

    let hash = SpatialHash::build(points, options.cell_size);
    let per_point = neighbor_lists(&hash, points, options);

    let mut bonds = BTreeSet::new();
    for (i, neighbors) in per_point.into_iter().enumerate() {
        for (j, _) in neighbors {
            bonds.insert(Bond::new(i, j));
        }
    }
    bonds.into_iter().collect()
}

#[cfg(not(feature = "parallel"))]
fn neighbor_lists(
    hash: &SpatialHash,
    points: &[Point3],
    options: BondSearchOptions,
) -> Vec<Vec<(usize, f64)>> {
    (0..points.len())
        .map(|i| hash.nearest_neighbors(points, i, options.max_distance, options.k))
        .collect()
}

#[cfg(feature = "parallel")]
fn neighbor_lists(
    hash: &SpatialHash,
    points: &[Point3],
    options: BondSearchOptions,
) -> Vec<Vec<(usize, f64)>> {
    use rayon::prelude::*;

    (0..points.len())
        .into_par_iter()
        .map(|i| hash.nearest_neighbors(points, i, options.max_distance, options.k))
        .collect()
}

/// O(n²) reference for [`find_bonds`]; same ordering and tie-breaks.
#[must_use]
pub fn find_bonds_brute_force(points: &[Point3], max_distance: f64, k: usize) -> Vec<Bond> {
    if points.len() < 2 || k == 0 {
        return Vec::new();
    }
    let mut bonds = BTreeSet::new();
    for (i, p) in points.iter().enumerate() {
        if !p.is_finite() {
            continue;
        }
        let within: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .filter(|(j, q)| *j != i && q.is_finite())
            .filter_map(|(j, q)| {
                let d = p.distance_to(*q);
                (d <= max_distance).then_some((j, d))
            })
            .collect();
        for (j, _) in closest_k(within, k) {
            bonds.insert(Bond::new(i, j));
        }
    }
    bonds.into_iter().collect()
}
