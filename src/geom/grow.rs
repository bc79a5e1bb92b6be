//! Progressive loft growth along the sculpture.
//!
//! A travel fraction `f` selects the prefix of sections to include. Each
//! included section is scaled by a smoothstep taper of its distance behind a
//! tip that runs ahead of the travel position, so new sections grow in from
//! zero instead of popping in at full size.

use super::core::smoothstep;
use super::loft::{LoftError, LoftMeshBuilder, LoftOptions, LoftResult};
use super::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowOptions {
    /// Tip lead over the travel position, as a fraction of the section count.
    pub tip_ahead: f64,
    /// Taper length behind the tip, as a fraction of the section count.
    pub taper: f64,
    /// Base loft settings; growth always builds an open strip.
    pub loft: LoftOptions,
}

impl Default for GrowOptions {
    fn default() -> Self {
        Self {
            tip_ahead: 0.12,
            taper: 0.30,
            loft: LoftOptions::open(),
        }
    }
}

/// Number of sections included at travel fraction `f`: `ceil(f * n)`.
#[must_use]
pub fn included_section_count(section_count: usize, fraction: f64) -> usize {
    if !fraction.is_finite() {
        return 0;
    }
    let n = section_count as f64;
    ((fraction.clamp(0.0, 1.0) * n).ceil() as usize).min(section_count)
}

/// Scale of section `index` for travel fraction `fraction` over
/// `section_count` sections.
///
/// `distance = f*n + tip_ahead*n - index`; the scale is
/// `smoothstep(clamp(distance / (taper*n)))`, so sections at least a full
/// taper behind the tip are fully grown.
#[must_use]
pub fn section_scale(index: usize, section_count: usize, fraction: f64, options: &GrowOptions) -> f64 {
    let n = section_count as f64;
    let tip = fraction.clamp(0.0, 1.0) * n + options.tip_ahead * n;
    let distance_from_tip = tip - index as f64;
    let taper_sections = options.taper * n;
    if taper_sections <= 0.0 {
        return if distance_from_tip > 0.0 { 1.0 } else { 0.0 };
    }
    smoothstep((distance_from_tip / taper_sections).clamp(0.0, 1.0))
}

/// Scales for every included section, in order.
#[must_use]
pub fn section_scales(section_count: usize, fraction: f64, options: &GrowOptions) -> Vec<f64> {
    (0..included_section_count(section_count, fraction))
        .map(|i| section_scale(i, section_count, fraction, options))
        .collect()
}

/// Loft the grown prefix of `sections` (already sorted along the path).
///
/// Triangles only join consecutive included sections; the strip never wraps.
pub fn grow_loft(sections: &[Vec<Point3>], fraction: f64, options: &GrowOptions) -> Result<LoftResult, LoftError> {
    grow_loft_along(sections, &[], fraction, options)
}

/// [`grow_loft`] with a closed spine `path` for `options.loft.straighten`.
pub fn grow_loft_along(
    sections: &[Vec<Point3>],
    path: &[Point3],
    fraction: f64,
    options: &GrowOptions,
) -> Result<LoftResult, LoftError> {
    let scales = section_scales(sections.len(), fraction, options);
    let included = &sections[..scales.len()];
    let loft = LoftOptions {
        closed: false,
        ..options.loft
    };
    LoftMeshBuilder::new(included, loft)
        .with_path(path)
        .with_section_scales(&scales)
        .build()
}
