//! Mapping of the single story slider onto the five chapter sliders.
//!
//! The story range is split into five equal phases. Chapters before the
//! current phase read 100, the current one reads its local progress and later
//! ones read 0 and stay hidden.

use serde::Serialize;

use super::ChapterKind;
use super::phase::{SLIDER_MAX, clamp_slider};

/// Story slider width of one chapter.
pub const PHASE_WIDTH: f64 = SLIDER_MAX / ChapterKind::ALL.len() as f64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoryState {
    pub values: [f64; 5],
    pub visible: [bool; 5],
}

impl StoryState {
    #[must_use]
    pub fn value(&self, kind: ChapterKind) -> f64 {
        self.values[kind.index()]
    }

    #[must_use]
    pub fn is_visible(&self, kind: ChapterKind) -> bool {
        self.visible[kind.index()]
    }

    /// Last visible chapter in story order.
    #[must_use]
    pub fn leading(&self) -> Option<ChapterKind> {
        ChapterKind::ALL.into_iter().rev().find(|kind| self.is_visible(*kind))
    }
}

#[must_use]
pub fn story_state(story_value: f64) -> StoryState {
    let v = if story_value.is_finite() { clamp_slider(story_value) } else { 0.0 };
    let last = ChapterKind::ALL.len() - 1;
    let current = ((v / PHASE_WIDTH).floor() as usize).min(last);

    let mut state = StoryState {
        values: [0.0; 5],
        visible: [false; 5],
    };
    for i in 0..=current {
        state.visible[i] = true;
        state.values[i] = if i < current {
            SLIDER_MAX
        } else {
            clamp_slider((v - PHASE_WIDTH * i as f64) * (SLIDER_MAX / PHASE_WIDTH))
        };
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_unlock_in_order() {
        let s = story_state(50.0);
        assert_eq!(s.values, [100.0, 100.0, 50.0, 0.0, 0.0]);
        assert_eq!(s.visible, [true, true, true, false, false]);
        assert_eq!(s.leading(), Some(ChapterKind::Structure));
    }

    #[test]
    fn boundary_completes_previous_chapter() {
        let s = story_state(20.0);
        assert_eq!(s.value(ChapterKind::Points), 100.0);
        assert_eq!(s.value(ChapterKind::Paths), 0.0);
        assert!(s.is_visible(ChapterKind::Paths));
        assert_eq!(story_state(100.0).values, [100.0; 5]);
    }

    #[test]
    fn values_never_decrease_as_story_advances() {
        let mut previous = story_state(0.0);
        for step in 1..=1000 {
            let next = story_state(f64::from(step) * 0.1);
            for i in 0..5 {
                assert!(next.values[i] >= previous.values[i]);
                if previous.values[i] == 100.0 {
                    assert_eq!(next.values[i], 100.0);
                }
            }
            previous = next;
        }
    }

    #[test]
    fn later_chapters_wait_for_predecessors() {
        for step in 0..=200 {
            let s = story_state(f64::from(step) * 0.5);
            for i in 1..5 {
                if s.values[i] > 0.0 {
                    assert_eq!(s.values[i - 1], 100.0);
                }
            }
        }
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(story_state(-5.0).values, [0.0; 5]);
        assert_eq!(story_state(f64::NAN).values, [0.0; 5]);
        assert_eq!(story_state(250.0).values, [100.0; 5]);
    }
}
