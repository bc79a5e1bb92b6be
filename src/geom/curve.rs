use super::core::{Point3, Tolerance};

/// Polyline parameterized by arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3 {
    points: Vec<Point3>,
    cumulative_lengths: Vec<f64>,
    total_length: f64,
}

impl Polyline3 {
    /// Build a polyline. A closed polyline drops a repeated closing point.
    pub fn new(mut points: Vec<Point3>, closed: bool) -> Result<Self, String> {
        if points.is_empty() {
            return Err("polyline requires at least 1 point".to_string());
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err("polyline points must be finite".to_string());
        }
        if closed && points.len() > 2 && points.first() == points.last() {
            points.pop();
        }

        let mut cumulative_lengths = Vec::with_capacity(points.len() + 1);
        cumulative_lengths.push(0.0);
        let mut total = 0.0;
        for pair in points.windows(2) {
            total += pair[0].distance_to(pair[1]);
            cumulative_lengths.push(total);
        }
        if closed && points.len() > 1 {
            total += points[points.len() - 1].distance_to(points[0]);
            cumulative_lengths.push(total);
        }

        Ok(Self {
            points,
            cumulative_lengths,
            total_length: total,
        })
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.cumulative_lengths.len() - 1
    }

    fn segment(&self, i: usize) -> (Point3, Point3) {
        let a = self.points[i];
        let b = self.points[(i + 1) % self.points.len()];
        (a, b)
    }

    /// Closest point over all segments (clamped per-segment projection) and its
    /// arc-length fraction in `[0, 1]`. Ties keep the earliest segment.
    #[must_use]
    pub fn closest_point(&self, p: Point3) -> (Point3, f64) {
        if self.segment_count() == 0 {
            return (self.points[0], 0.0);
        }

        let mut best = (self.points[0], 0.0, f64::INFINITY);
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let (q, u) = p.project_onto_segment(a, b);
            let d = q.distance_squared_to(p);
            if d < best.2 {
                let arc = self.cumulative_lengths[i] + u * a.distance_to(b);
                best = (q, arc, d);
            }
        }

        let fraction = if self.total_length > Tolerance::ZERO_LENGTH.eps {
            (best.1 / self.total_length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (best.0, fraction)
    }
}

/// Closed cardinal (Catmull-Rom family) spline through control points.
///
/// The parameter is uniform per span. `tension` scales the tangents
/// `m_i = tension * (p[i+1] - p[i-1])`: 0.5 is the standard Catmull-Rom curve,
/// 0 leaves every span on its straight polyline edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedCardinalSpline {
    points: Vec<Point3>,
    tension: f64,
}

impl ClosedCardinalSpline {
    pub const CATMULL_ROM: f64 = 0.5;

    #[must_use]
    pub fn new(points: Vec<Point3>, tension: f64) -> Self {
        let tension = if tension.is_finite() { tension } else { Self::CATMULL_ROM };
        Self { points, tension }
    }

    fn span_point(&self, span: usize, u: f64) -> Point3 {
        let n = self.points.len();
        let p0 = self.points[(span + n - 1) % n];
        let p1 = self.points[span % n];
        let p2 = self.points[(span + 1) % n];
        let p3 = self.points[(span + 2) % n];

        let m1 = (p2 - p0) * self.tension;
        let m2 = (p3 - p1) * self.tension;

        let u2 = u * u;
        let u3 = u2 * u;
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;

        let base = p1.to_vec3() * h00 + p2.to_vec3() * h01 + m1 * h10 + m2 * h11;
        Point3::from(base)
    }
}

/// Sample a closed cardinal spline through `points` with `samples_per_span`
/// points per span. Sample `i * samples_per_span` is exactly `points[i]`.
#[must_use]
pub fn closed_catmull_rom(points: &[Point3], samples_per_span: usize, tension: f64) -> Vec<Point3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let samples_per_span = samples_per_span.max(1);
    let spline = ClosedCardinalSpline::new(points.to_vec(), tension);
    let mut out = Vec::with_capacity(points.len() * samples_per_span);
    for span in 0..points.len() {
        for k in 0..samples_per_span {
            out.push(spline.span_point(span, k as f64 / samples_per_span as f64));
        }
    }
    out
}

/// Walk a closed polyline proportionally to vertex index (not arc length):
/// `s = k / n` lands exactly on `points[k]`.
#[must_use]
pub fn sample_closed_by_index(points: &[Point3], s: f64) -> Point3 {
    match points.len() {
        0 => Point3::ORIGIN,
        1 => points[0],
        n => {
            let pos = s.rem_euclid(1.0) * n as f64;
            let i = (pos.floor() as usize).min(n - 1);
            points[i].lerp(points[(i + 1) % n], pos - i as f64)
        }
    }
}
