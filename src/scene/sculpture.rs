use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::geom::{BBox, LatticeDescriptor, Point3, Polyline3};

/// Path corners closer than this per axis are the same corner.
pub const PATH_ROUND_EPS: f64 = 1e-4;

static NUMERIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*$").expect("numeric suffix pattern is valid"));

/// Parsed sculpture as delivered by the asset loader.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SculptureAsset {
    pub path: Vec<[f64; 3]>,
    #[serde(default)]
    pub curve: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub cross_sections: BTreeMap<String, Vec<[f64; 3]>>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SculptureError {
    #[error("{source_name} contains a non-finite coordinate at vertex {index}")]
    NonFinite { source_name: String, index: usize },
}

/// One named slice of the sculpture surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    pub name: String,
    pub points: Vec<Point3>,
    /// Arc-length fraction in `[0, 1)` of the centroid's projection on the closed path.
    pub intersection: f64,
}

/// Immutable, validated sculpture geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SculptureData {
    corners: Vec<Point3>,
    curve: Vec<Point3>,
    sections: Vec<CrossSection>,
    lattice: LatticeDescriptor,
    center: Point3,
    radius: f64,
}

impl SculptureData {
    /// Validate an asset. A path without vertices yields [`Self::empty`].
    pub fn from_asset(asset: SculptureAsset) -> Result<Self, SculptureError> {
        let raw_path = to_points("path", &asset.path)?;
        let corners = dedup_corners(&raw_path);
        if corners.is_empty() {
            log::warn!("sculpture path has no vertices; using the default lattice");
            return Ok(Self::empty());
        }

        let curve = match &asset.curve {
            Some(curve) => to_points("curve", curve)?,
            None => Vec::new(),
        };

        let spine = match Polyline3::new(corners.clone(), true) {
            Ok(spine) => spine,
            Err(err) => {
                log::warn!("sculpture path rejected ({err}); using the default lattice");
                return Ok(Self::empty());
            }
        };

        let mut named = Vec::with_capacity(asset.cross_sections.len());
        for (name, raw) in &asset.cross_sections {
            let points = to_points(name, raw)?;
            if points.is_empty() {
                log::warn!("cross-section `{name}` has no vertices; skipped");
                continue;
            }
            let (_, fraction) = spine.closest_point(Point3::centroid(&points));
            named.push(CrossSection {
                name: name.clone(),
                points,
                intersection: fraction.rem_euclid(1.0),
            });
        }
        named.sort_by(|a, b| compare_section_names(&a.name, &b.name));

        let bbox = BBox::from_points(&corners);
        let center = bbox.map_or(Point3::ORIGIN, BBox::center);
        let radius = corners
            .iter()
            .map(|p| p.distance_to(center))
            .fold(0.0, f64::max);

        log::debug!(
            "sculpture loaded: {} corners, {} sections, {} curve samples",
            corners.len(),
            named.len(),
            curve.len()
        );

        Ok(Self {
            lattice: LatticeDescriptor::derive(&corners),
            corners,
            curve,
            sections: named,
            center,
            radius,
        })
    }

    /// No corners or sections, centred on the origin with the default lattice.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            corners: Vec::new(),
            curve: Vec::new(),
            sections: Vec::new(),
            lattice: LatticeDescriptor::default(),
            center: Point3::ORIGIN,
            radius: 0.0,
        }
    }

    /// Deduplicated path corners; the path is implicitly closed.
    #[must_use]
    pub fn corners(&self) -> &[Point3] {
        &self.corners
    }

    /// Dense smooth spine, empty when the asset had none.
    #[must_use]
    pub fn curve(&self) -> &[Point3] {
        &self.curve
    }

    /// Sections in numeric-suffix order.
    #[must_use]
    pub fn sections(&self) -> &[CrossSection] {
        &self.sections
    }

    /// Sections ordered along the path by intersection parameter; equal
    /// parameters keep numeric order.
    #[must_use]
    pub fn sections_by_intersection(&self) -> Vec<&CrossSection> {
        let mut ordered: Vec<&CrossSection> = self.sections.iter().collect();
        ordered.sort_by(|a, b| a.intersection.total_cmp(&b.intersection));
        ordered
    }

    /// Section loops in path order, as fed to the progressive loft.
    #[must_use]
    pub fn section_loops_by_intersection(&self) -> Vec<Vec<Point3>> {
        self.sections_by_intersection()
            .into_iter()
            .map(|s| s.points.clone())
            .collect()
    }

    #[must_use]
    pub fn lattice(&self) -> &LatticeDescriptor {
        &self.lattice
    }

    /// Bounding-box center of the corners.
    #[must_use]
    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Largest corner distance from [`Self::center`].
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

fn to_points(source_name: &str, raw: &[[f64; 3]]) -> Result<Vec<Point3>, SculptureError> {
    raw.iter()
        .enumerate()
        .map(|(index, v)| {
            let p = Point3::from(*v);
            if p.is_finite() {
                Ok(p)
            } else {
                Err(SculptureError::NonFinite {
                    source_name: source_name.to_owned(),
                    index,
                })
            }
        })
        .collect()
}

/// Keep the first occurrence of every rounded corner. A closing vertex that
/// repeats the first corner disappears with it.
fn dedup_corners(points: &[Point3]) -> Vec<Point3> {
    let mut seen = HashSet::new();
    points
        .iter()
        .filter(|p| {
            let key = (
                (p.x / PATH_ROUND_EPS).round() as i64,
                (p.y / PATH_ROUND_EPS).round() as i64,
                (p.z / PATH_ROUND_EPS).round() as i64,
            );
            seen.insert(key)
        })
        .map(|p| p.rounded(PATH_ROUND_EPS))
        .collect()
}

fn numeric_suffix(name: &str) -> Option<u64> {
    NUMERIC_SUFFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Numbered names first, by number then name; unnumbered names after, by name.
fn compare_section_names(a: &str, b: &str) -> Ordering {
    match (numeric_suffix(a), numeric_suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_section(x: f64) -> Vec<[f64; 3]> {
        vec![
            [x, -0.1, -0.1],
            [x, 0.1, -0.1],
            [x, 0.1, 0.1],
            [x, -0.1, 0.1],
        ]
    }

    fn asset() -> SculptureAsset {
        let mut cross_sections = BTreeMap::new();
        cross_sections.insert("section 10".to_string(), square_section(0.2));
        cross_sections.insert("section 2".to_string(), square_section(0.8));
        cross_sections.insert("section 1".to_string(), square_section(0.5));
        cross_sections.insert("extra".to_string(), square_section(0.1));
        SculptureAsset {
            path: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.000_01, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
            ],
            curve: None,
            cross_sections,
        }
    }

    #[test]
    fn corners_are_deduplicated() {
        let data = SculptureData::from_asset(asset()).unwrap();
        assert_eq!(data.corners().len(), 4);
        assert_eq!(data.corners()[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn sections_sort_by_numeric_suffix() {
        let data = SculptureData::from_asset(asset()).unwrap();
        let names: Vec<&str> = data.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["section 1", "section 2", "section 10", "extra"]);
    }

    #[test]
    fn intersection_follows_the_path() {
        let data = SculptureData::from_asset(asset()).unwrap();
        let loops = data.section_loops_by_intersection();
        assert_eq!(loops.len(), 4);
        assert_eq!(loops[0], data.sections_by_intersection()[0].points);
        let by_path: Vec<&str> = data
            .sections_by_intersection()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(by_path, ["extra", "section 10", "section 1", "section 2"]);
        let first = data.sections_by_intersection()[0].intersection;
        assert!((first - 0.1 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_path_falls_back_to_default_lattice() {
        let mut empty = asset();
        empty.path.clear();
        let data = SculptureData::from_asset(empty).unwrap();
        assert_eq!(data, SculptureData::empty());
        assert!(data.corners().is_empty());
        assert!(data.sections().is_empty());
        assert_eq!(data.center(), Point3::ORIGIN);
        assert_eq!(data.radius(), 0.0);
        assert_eq!(data.lattice(), &LatticeDescriptor::default());
        assert_eq!(data.lattice().constant, 1.0);

        let single = SculptureAsset {
            path: vec![[1.0, 2.0, 3.0]],
            ..SculptureAsset::default()
        };
        let data = SculptureData::from_asset(single).unwrap();
        assert_eq!(data.corners().len(), 1);
        assert_eq!(data.lattice().constant, 1.0);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut bad = asset();
        bad.path[2] = [f64::NAN, 0.0, 0.0];
        assert_eq!(
            SculptureData::from_asset(bad).unwrap_err(),
            SculptureError::NonFinite {
                source_name: "path".to_string(),
                index: 2
            }
        );
    }

    #[test]
    fn center_and_radius_cover_the_corners() {
        let data = SculptureData::from_asset(asset()).unwrap();
        assert!((data.center().x - 0.5).abs() < 1e-9);
        assert!((data.radius() - 0.5_f64.hypot(0.5)).abs() < 1e-9);
    }
}
