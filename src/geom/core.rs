use std::ops::{Add, Div, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Axis-aligned unit vectors in x, y, z order. Used as fallback basis
    /// directions whenever a path does not provide enough independent ones.
    pub const AXES: [Self; 3] = [Self::X, Self::Y, Self::Z];

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Unit vector in the same direction, or `None` for zero-length and
    /// non-finite input. Callers pick their own fallback direction.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > Tolerance::ZERO_LENGTH.eps {
            Some(self / len)
        } else {
            None
        }
    }

    /// `normalized()` with an explicit fallback.
    #[must_use]
    pub fn normalized_or(self, fallback: Self) -> Self {
        self.normalized().unwrap_or(fallback)
    }

    /// Rescale to the given length. Zero vectors stay zero.
    #[must_use]
    pub fn with_length(self, length: f64) -> Self {
        self.normalized().map_or(Self::ZERO, |unit| unit * length)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    /// Angle between two directions in degrees, via the clamped dot product of
    /// their normalizations. Degenerate input yields `None`.
    #[must_use]
    pub fn angle_deg(self, rhs: Self) -> Option<f64> {
        let a = self.normalized()?;
        let b = rhs.normalized()?;
        Some(a.dot(b).clamp(-1.0, 1.0).acos().to_degrees())
    }

    /// Any unit vector perpendicular to `self`, preferring world up.
    #[must_use]
    pub fn any_perpendicular(self) -> Self {
        let reference = if self.normalized().is_some_and(|t| t.dot(Self::Y).abs() > 0.9) {
            Self::X
        } else {
            Self::Y
        };
        self.cross(reference).normalized_or(Self::Z)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.to_vec3().is_finite()
    }

    /// Round every coordinate to a multiple of `step`. Used to deduplicate
    /// path corners that only differ by export noise.
    #[must_use]
    pub fn rounded(self, step: f64) -> Self {
        if step <= 0.0 {
            return self;
        }
        let snap = |v: f64| (v / step).round() * step;
        Self::new(snap(self.x), snap(self.y), snap(self.z))
    }

    /// Arithmetic mean of a point set; the origin for an empty set.
    #[must_use]
    pub fn centroid(points: &[Self]) -> Self {
        if points.is_empty() {
            return Self::ORIGIN;
        }
        let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        Self::from(sum / points.len() as f64)
    }

    /// Closest point on the segment `a..b`, returned with its clamped segment
    /// parameter. A zero-length segment projects onto `a`.
    #[must_use]
    pub fn project_onto_segment(self, a: Self, b: Self) -> (Self, f64) {
        let ab = b - a;
        let len_sq = ab.length_squared();
        if len_sq <= Tolerance::ZERO_LENGTH.eps_squared() {
            return (a, 0.0);
        }
        let t = ((self - a).dot(ab) / len_sq).clamp(0.0, 1.0);
        (a + ab * t, t)
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Self;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |bbox, p| bbox.expand_point(*p)))
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        self.min.lerp(self.max, 0.5)
    }

    #[must_use]
    pub fn diagonal(self) -> f64 {
        (self.max - self.min).length()
    }

    #[must_use]
    pub fn expand_point(self, p: Point3) -> Self {
        Self::new(
            Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Tolerance configuration for geometric comparisons.
///
/// - `Tolerance::DEFAULT` - general geometry comparisons (1e-9)
/// - `Tolerance::ZERO_LENGTH` - detecting degenerate vectors (1e-12)
/// - `Tolerance::LOOSE` - test assertions and resampling drift (1e-6)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub const fn default_geom() -> Self {
        Self::DEFAULT
    }

    #[must_use]
    pub const fn eps_squared(self) -> f64 {
        self.eps * self.eps
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        a.distance_squared_to(b) <= self.eps_squared()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scalar helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Cubic Hermite easing `x²(3 - 2x)` on a clamped input.
#[must_use]
pub fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Map `value` from `[start, end]` onto `[0, 1]`, clamped. An empty range is a
/// step at `start`.
#[must_use]
pub fn remap_unit(value: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span.abs() <= Tolerance::ZERO_LENGTH.eps {
        return if value >= start { 1.0 } else { 0.0 };
    }
    ((value - start) / span).clamp(0.0, 1.0)
}

#[must_use]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
