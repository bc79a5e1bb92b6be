//! Slider breakpoints, easing and time-driven play ramps.

use crate::geom::remap_unit;

/// Upper bound of every chapter and story slider.
pub const SLIDER_MAX: f64 = 100.0;

/// Clamp a slider value into `[0, 100]`.
#[must_use]
pub fn clamp_slider(value: f64) -> f64 {
    value.clamp(0.0, SLIDER_MAX)
}

/// Ordered breakpoints splitting a slider range into sub-phases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints<const N: usize> {
    bounds: [f64; N],
}

impl<const N: usize> Breakpoints<N> {
    /// `bounds` must be ascending; `N - 1` sub-phases result.
    #[must_use]
    pub const fn new(bounds: [f64; N]) -> Self {
        Self { bounds }
    }

    #[must_use]
    pub fn phase_count(&self) -> usize {
        N.saturating_sub(1)
    }

    /// Sub-phase containing `value` and the local progress within it. Values
    /// at or past the last bound report the last phase at progress 1.
    #[must_use]
    pub fn locate(&self, value: f64) -> (usize, f64) {
        let last = self.phase_count().saturating_sub(1);
        for phase in 0..=last {
            let (start, end) = (self.bounds[phase], self.bounds[phase + 1]);
            if value < end || phase == last {
                return (phase, remap_unit(value, start, end));
            }
        }
        (0, 0.0)
    }

    /// Progress through sub-phase `phase`, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self, phase: usize, value: f64) -> f64 {
        match (self.bounds.get(phase), self.bounds.get(phase + 1)) {
            (Some(start), Some(end)) => remap_unit(value, *start, *end),
            _ => 0.0,
        }
    }
}

/// Quadratic ease-in.
#[must_use]
pub fn ease_in_quad(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x
}

/// Number of segments shown by a cyclic reveal of `segment_count` segments
/// repeated `cycles` times over `progress` in `[0, 1]`. The final cycle always
/// shows everything.
#[must_use]
pub fn cyclic_reveal(progress: f64, cycles: u32, segment_count: usize) -> usize {
    if segment_count == 0 {
        return 0;
    }
    let cycles = cycles.max(1);
    let phase = progress.clamp(0.0, 1.0) * f64::from(cycles);
    let cycle = phase.floor() as u32;
    if cycle + 1 >= cycles {
        return segment_count;
    }
    let within = phase - f64::from(cycle);
    ((within * segment_count as f64).ceil() as usize).clamp(1, segment_count)
}

/// Linear ramp of a slider value toward 100 over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayRamp {
    from: f64,
    duration: f64,
    elapsed: f64,
}

impl PlayRamp {
    /// Ramp from `from` to 100. A non-positive duration completes on the next tick.
    #[must_use]
    pub fn new(from: f64, duration: f64) -> Self {
        Self {
            from: clamp_slider(from),
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the new slider value.
    pub fn advance(&mut self, dt: f64) -> f64 {
        self.elapsed += dt.max(0.0);
        self.value()
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        if self.duration <= 0.0 {
            return SLIDER_MAX;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.from + (SLIDER_MAX - self.from) * t
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.value() >= SLIDER_MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURE: Breakpoints<5> = Breakpoints::new([0.0, 25.0, 50.0, 90.0, 100.0]);

    #[test]
    fn locate_finds_sub_phase() {
        assert_eq!(STRUCTURE.locate(0.0), (0, 0.0));
        assert_eq!(STRUCTURE.locate(12.5), (0, 0.5));
        assert_eq!(STRUCTURE.locate(25.0), (1, 0.0));
        assert_eq!(STRUCTURE.locate(70.0), (2, 0.5));
        assert_eq!(STRUCTURE.locate(100.0), (3, 1.0));
        assert_eq!(STRUCTURE.locate(140.0), (3, 1.0));
    }

    #[test]
    fn cyclic_reveal_ends_complete() {
        assert_eq!(cyclic_reveal(0.0, 3, 10), 1);
        assert_eq!(cyclic_reveal(0.15, 3, 10), 5);
        assert_eq!(cyclic_reveal(0.34, 3, 10), 1);
        assert_eq!(cyclic_reveal(0.7, 3, 10), 10);
        assert_eq!(cyclic_reveal(1.0, 3, 10), 10);
        assert_eq!(cyclic_reveal(0.5, 3, 0), 0);
    }

    #[test]
    fn ramp_reaches_hundred() {
        let mut ramp = PlayRamp::new(40.0, 2.0);
        assert_eq!(ramp.advance(1.0), 70.0);
        assert!(!ramp.is_finished());
        assert_eq!(ramp.advance(5.0), 100.0);
        assert!(ramp.is_finished());
        assert_eq!(PlayRamp::new(10.0, 0.0).value(), 100.0);
    }

    #[test]
    fn ease_in_is_squared() {
        assert_eq!(ease_in_quad(0.5), 0.25);
        assert_eq!(ease_in_quad(2.0), 1.0);
    }
}
