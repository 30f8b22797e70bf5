//! Scroll position derived from wheel motion
//!
//! The viewer never reads the wheel itself. The application turns wheel lines
//! into a scroll progress value and hands it to the viewer, the same way a
//! page would supply its scroll offset.

#[derive(Debug, Clone, Copy)]
pub struct ScrollTracker {
    value: Option<f32>,
    step: f32,
    min: f32,
    max: f32,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(0.05, 0.0, 1.0)
    }
}

impl ScrollTracker {
    pub fn new(step: f32, min: f32, max: f32) -> Self {
        Self {
            value: None,
            step,
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Scrolling "down" (negative wheel lines) advances the progress.
    pub fn apply_wheel(&mut self, lines: f32) -> f32 {
        let current = self.value.unwrap_or(self.min);
        let next = (current - lines * self.step).clamp(self.min, self.max);
        self.value = Some(next);
        next
    }

    /// `None` until the first wheel event.
    pub fn value(&self) -> Option<f32> {
        self.value
    }
}
